use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use crate::{
    attributes::{AttributeContext, AttributeParser, Attributes},
    class_file::{FieldInfo, MethodInfo, Version},
    constant_pool::{
        ClassInfo, CpInfo, DynamicInfo, MethodHandleInfo, MethodTypeInfo, NameAndTypeInfo, RefInfo,
    },
    observer::ParseObserver,
    AccessFlags, ClassFile, ClassFileError, ConstantPool, Result,
};

type Endian = BigEndian;

/// Highest major version this reader knows the attributes of (Java 21).
const MAX_MAJOR_VERSION: u16 = 65;
const MIN_MAJOR_VERSION: u16 = 45;

/// Reads a whole class file out of a byte buffer.
pub struct Parser<'a, 'o> {
    r: Cursor<&'a [u8]>,
    observer: Option<&'o mut dyn ParseObserver>,
}

impl<'a, 'o> Parser<'a, 'o> {
    pub fn new(buf: &'a [u8], observer: Option<&'o mut dyn ParseObserver>) -> Self {
        Self {
            r: Cursor::new(buf),
            observer,
        }
    }

    pub fn parse(mut self) -> Result<ClassFile> {
        self.parse_magic_identifier()?;
        let version = self.parse_version()?;
        let constant_pool = self.parse_constant_pool()?;

        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        self.parsed(2, || format!("access_flags: {:?}", access_flags));
        let this_class = self.read_u16()?;
        self.parsed(2, || format!("this_class: {:04x}", this_class));
        let super_class = self.read_u16()?;
        self.parsed(2, || format!("super_class: {:04x}", super_class));

        let interfaces_count = self.read_u16()?;
        self.parsed(2, || format!("interfaces_count: {:04x}", interfaces_count));
        let mut interfaces = vec![0u16; interfaces_count as usize];
        self.r.read_u16_into::<Endian>(&mut interfaces)?;

        let fields_count = self.read_u16()?;
        self.parsed(2, || format!("fields_count: {:04x}", fields_count));
        let fields = (0..fields_count)
            .map(|i| self.parse_field_info(&constant_pool, i))
            .collect::<Result<Vec<_>>>()?;

        let methods_count = self.read_u16()?;
        self.parsed(2, || format!("methods_count: {:04x}", methods_count));
        let methods = (0..methods_count)
            .map(|i| self.parse_method_info(&constant_pool, i))
            .collect::<Result<Vec<_>>>()?;

        let attributes = self.parse_attributes(&constant_pool, AttributeContext::Class)?;

        let trailing = self.r.get_ref().len() - self.position();
        if trailing != 0 {
            return Err(ClassFileError::TrailingBytes(trailing));
        }

        log::debug!(
            "Parsed class file version {} with {} constant(s), {} field(s) and {} method(s)",
            version,
            constant_pool.len(),
            fields.len(),
            methods.len()
        );

        Ok(ClassFile {
            constant_pool,
            version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn parse_field_info(&mut self, pool: &ConstantPool, i: u16) -> Result<FieldInfo> {
        self.parsed(0, || format!("fields[{}]:", i));
        self.change_indent(1);

        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        self.parsed(2, || format!("access_flags: {:?}", access_flags));
        let name_index = self.read_u16()?;
        self.parsed(2, || format!("name: {:04x}", name_index));
        let descriptor_index = self.read_u16()?;
        self.parsed(2, || format!("descriptor: {:04x}", descriptor_index));
        let attributes = self.parse_attributes(pool, AttributeContext::Field)?;

        self.change_indent(-1);
        self.parsed(0, || format!("end fields[{}]", i));

        Ok(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn parse_method_info(&mut self, pool: &ConstantPool, i: u16) -> Result<MethodInfo> {
        self.parsed(0, || format!("methods[{}]:", i));
        self.change_indent(1);

        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        self.parsed(2, || format!("access_flags: {:?}", access_flags));
        let name_index = self.read_u16()?;
        self.parsed(2, || format!("name: {:04x}", name_index));
        let descriptor_index = self.read_u16()?;
        self.parsed(2, || format!("descriptor: {:04x}", descriptor_index));
        let attributes = self.parse_attributes(pool, AttributeContext::Method)?;

        self.change_indent(-1);
        self.parsed(0, || format!("end methods[{}]", i));

        Ok(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    /// Hands the attribute list at the current position to [`AttributeParser`]
    /// and moves past it.
    fn parse_attributes(
        &mut self,
        pool: &ConstantPool,
        context: AttributeContext,
    ) -> Result<Attributes> {
        let buf = *self.r.get_ref();
        let offset = self.position();
        let observer = self
            .observer
            .as_mut()
            .map(|observer| &mut **observer as &mut dyn ParseObserver);

        let (attributes, end) = AttributeParser::new(buf, pool, observer).parse_list(context, offset)?;
        self.r.set_position(end as u64);

        Ok(attributes)
    }

    fn parse_magic_identifier(&mut self) -> Result<()> {
        match self.read_u32()? {
            0xCAFEBABE => {
                self.parsed(4, || "magic: cafebabe".to_owned());
                Ok(())
            }
            magic_identifier => Err(ClassFileError::InvalidMagicIdentifier(magic_identifier)),
        }
    }

    fn parse_version(&mut self) -> Result<Version> {
        let minor = self.read_u16()?;
        let major = self.read_u16()?;
        if !(MIN_MAJOR_VERSION..=MAX_MAJOR_VERSION).contains(&major) {
            return Err(ClassFileError::UnsupportedVersion(major, minor));
        }

        let version = Version { major, minor };
        self.parsed(4, || format!("version: {}", version));
        Ok(version)
    }

    fn parse_constant_pool(&mut self) -> Result<ConstantPool> {
        let constant_pool_count = self.read_u16()?;
        self.parsed(2, || {
            format!("constant_pool_count: {:04x}", constant_pool_count)
        });

        let count = (constant_pool_count as usize).saturating_sub(1);
        let mut res = Vec::with_capacity(count);
        while res.len() < count {
            let start = self.position();
            let cp_info = self.parse_cp_info()?;
            let wide = matches!(cp_info, CpInfo::Long(_) | CpInfo::Double(_));

            let index = res.len() + 1;
            let len = self.position() - start;
            self.parsed_at(start, len, || format!("#{:04x}: {:?}", index, cp_info));

            res.push(cp_info);
            if wide {
                // The second slot must still be inside the pool.
                if res.len() == count {
                    return Err(ClassFileError::InvalidConstantPoolIndex(constant_pool_count));
                }
                res.push(CpInfo::Unusable);
            }
        }

        Ok(ConstantPool::new(res))
    }

    fn parse_cp_info(&mut self) -> Result<CpInfo> {
        let tag = self.read_u8()?;
        Ok(match tag {
            1 => self.parse_utf8()?,
            3 => CpInfo::Integer(self.r.read_i32::<Endian>()?),
            4 => CpInfo::Float(f32::from_bits(self.read_u32()?)),
            5 => CpInfo::Long(self.r.read_i64::<Endian>()?),
            6 => CpInfo::Double(self.r.read_f64::<Endian>()?),
            7 => CpInfo::Class(ClassInfo {
                name_index: self.read_u16()?,
            }),
            8 => CpInfo::String {
                string_index: self.read_u16()?,
            },
            9 => CpInfo::FieldRef(self.parse_ref_info()?),
            10 => CpInfo::MethodRef(self.parse_ref_info()?),
            11 => CpInfo::InterfaceMethodRef(self.parse_ref_info()?),
            12 => CpInfo::NameAndType(NameAndTypeInfo {
                name_index: self.read_u16()?,
                descriptor_index: self.read_u16()?,
            }),
            15 => CpInfo::MethodHandle(MethodHandleInfo {
                reference_kind: self.read_u8()?,
                reference_index: self.read_u16()?,
            }),
            16 => CpInfo::MethodType(MethodTypeInfo {
                descriptor_index: self.read_u16()?,
            }),
            17 => CpInfo::Dynamic(self.parse_dynamic_info()?),
            18 => CpInfo::InvokeDynamic(self.parse_dynamic_info()?),
            19 => CpInfo::Module {
                name_index: self.read_u16()?,
            },
            20 => CpInfo::Package {
                name_index: self.read_u16()?,
            },
            _ => return Err(ClassFileError::InvalidCpInfoTag(tag)),
        })
    }

    fn parse_utf8(&mut self) -> Result<CpInfo> {
        let length = self.read_u16()?;
        let mut bytes = vec![0u8; length as usize];
        self.r.read_exact(&mut bytes)?;

        Ok(CpInfo::Utf8(decode_modified_utf8(&bytes)))
    }

    fn parse_ref_info(&mut self) -> Result<RefInfo> {
        let class_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(RefInfo {
            class_index,
            name_and_type_index,
        })
    }

    fn parse_dynamic_info(&mut self) -> Result<DynamicInfo> {
        let bootstrap_method_attr_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(DynamicInfo {
            bootstrap_method_attr_index,
            name_and_type_index,
        })
    }

    fn position(&self) -> usize {
        self.r.position() as usize
    }

    /// Reports the `len` bytes just read.
    fn parsed(&mut self, len: usize, human: impl FnOnce() -> String) {
        let offset = self.position().saturating_sub(len);
        self.parsed_at(offset, len, human);
    }

    fn parsed_at(&mut self, offset: usize, len: usize, human: impl FnOnce() -> String) {
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.parsed(self.r.get_ref(), offset, len, &human());
        }
    }

    fn change_indent(&mut self, delta: i32) {
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.change_indent(delta);
        }
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(self.r.read_u32::<Endian>()?)
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(self.r.read_u16::<Endian>()?)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.r.read_u8()?)
    }
}

/// Decodes the modified UTF-8 of `CONSTANT_Utf8` entries: NUL is `C0 80` and
/// supplementary characters are surrogate pairs. Unpaired surrogates cannot be
/// represented in a `String` and decode lossily.
fn decode_modified_utf8(bytes: &[u8]) -> String {
    match cesu8::from_java_cesu8(bytes) {
        Ok(s) => s.into_owned(),
        Err(_) => {
            log::warn!("Malformed modified UTF-8 constant, decoding lossily");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}


#[cfg(test)]
mod parse_version_tests {
    use super::*;

    #[test]
    fn it_should_be_able_to_parse_a_version() {
        assert_eq!(
            Parser::new(&[0x00, 0x03, 0x00, 0x34], None)
                .parse_version()
                .unwrap(),
            Version {
                major: 52,
                minor: 3
            }
        );
    }

    #[test]
    fn it_should_reject_versions_it_does_not_know() {
        assert!(matches!(
            Parser::new(&[0x00, 0x00, 0x00, 0x2c], None).parse_version(),
            Err(ClassFileError::UnsupportedVersion(44, 0))
        ));
        assert!(matches!(
            Parser::new(&[0x00, 0x00, 0x00, 0x42], None).parse_version(),
            Err(ClassFileError::UnsupportedVersion(66, 0))
        ));
    }
}

#[cfg(test)]
mod parse_constant_pool_tests {
    use super::*;

    #[test]
    fn it_should_follow_wide_constants_with_an_unusable_slot() {
        #[rustfmt::skip]
        let pool = Parser::new(
            &[
                0x00, 0x05,
                0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07,
                0x06, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            ],
            None,
        )
        .parse_constant_pool()
        .unwrap();

        assert_eq!(pool.len(), 4);
        assert_eq!(pool.get(1).unwrap(), &CpInfo::Long(7));
        assert!(matches!(
            pool.get(2),
            Err(ClassFileError::InvalidConstantPoolIndex(2))
        ));
        assert_eq!(pool.get(3).unwrap(), &CpInfo::Double(1.0));
    }

    #[test]
    fn it_should_decode_floats_from_their_bits() {
        let pool = Parser::new(&[0x00, 0x03, 0x04, 0xbf, 0xc0, 0x00, 0x00, 0x04, 0x7f, 0x80, 0x00, 0x00], None)
            .parse_constant_pool()
            .unwrap();

        assert_eq!(pool.get(1).unwrap(), &CpInfo::Float(-1.5));
        assert_eq!(pool.get(2).unwrap(), &CpInfo::Float(f32::INFINITY));
    }

    #[test]
    fn it_should_parse_dynamic_and_module_constants() {
        #[rustfmt::skip]
        let pool = Parser::new(
            &[
                0x00, 0x04,
                0x11, 0x00, 0x00, 0x00, 0x03,
                0x13, 0x00, 0x01,
                0x14, 0x00, 0x02,
            ],
            None,
        )
        .parse_constant_pool()
        .unwrap();

        assert_eq!(
            pool.get(1).unwrap(),
            &CpInfo::Dynamic(DynamicInfo {
                bootstrap_method_attr_index: 0,
                name_and_type_index: 3
            })
        );
        assert_eq!(pool.get(2).unwrap(), &CpInfo::Module { name_index: 1 });
        assert_eq!(pool.get(3).unwrap(), &CpInfo::Package { name_index: 2 });
    }

    #[test]
    fn it_should_reject_a_wide_constant_in_the_last_slot() {
        assert!(matches!(
            Parser::new(
                &[0x00, 0x02, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07],
                None
            )
            .parse_constant_pool(),
            Err(ClassFileError::InvalidConstantPoolIndex(2))
        ));
    }

    #[test]
    fn it_should_decode_modified_utf8() {
        // "a\0b" then U+1F600 as a surrogate pair.
        #[rustfmt::skip]
        let pool = Parser::new(
            &[
                0x00, 0x03,
                0x01, 0x00, 0x04, b'a', 0xc0, 0x80, b'b',
                0x01, 0x00, 0x06, 0xed, 0xa0, 0xbd, 0xed, 0xb8, 0x80,
            ],
            None,
        )
        .parse_constant_pool()
        .unwrap();

        assert_eq!(pool.utf8(1).unwrap(), "a\0b");
        assert_eq!(pool.utf8(2).unwrap(), "\u{1f600}");
    }

    #[test]
    fn it_should_keep_distinct_names_distinct() {
        // A NUL and a real U+FFFD must not collapse into the same string.
        #[rustfmt::skip]
        let pool = Parser::new(
            &[
                0x00, 0x03,
                0x01, 0x00, 0x02, 0xc0, 0x80,
                0x01, 0x00, 0x03, 0xef, 0xbf, 0xbd,
            ],
            None,
        )
        .parse_constant_pool()
        .unwrap();

        assert_ne!(pool.utf8(1).unwrap(), pool.utf8(2).unwrap());
    }

    #[test]
    fn it_should_accept_an_empty_pool() {
        assert!(Parser::new(&[0x00, 0x00], None)
            .parse_constant_pool()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn it_should_fail_on_an_unknown_tag() {
        assert!(matches!(
            Parser::new(&[0x00, 0x02, 0x02, 0x00], None).parse_constant_pool(),
            Err(ClassFileError::InvalidCpInfoTag(2))
        ));
    }
}
