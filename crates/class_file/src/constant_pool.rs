use std::fmt;

use crate::{ClassFileError, Result};

#[macro_export]
macro_rules! matches_cp_info {
    ($cp:expr, $index:expr, $i:ident) => {
        match $cp.get($index)? {
            $crate::constant_pool::CpInfo::$i(ref n) => Ok(n),
            c => Err($crate::ClassFileError::UnexpectedConstantPoolEntry(
                stringify!($i),
                c.clone(),
            )),
        }
    };
}

/// The constant pool of a class file, addressed by 1-based index.
#[derive(Debug, Default)]
pub struct ConstantPool {
    cp_infos: Vec<CpInfo>,
}
impl ConstantPool {
    pub fn new(cp_infos: Vec<CpInfo>) -> Self {
        Self { cp_infos }
    }

    /// Number of slots, the second slot of 8-byte constants included.
    pub fn len(&self) -> usize {
        self.cp_infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cp_infos.is_empty()
    }

    /// Resolves `index`. Index 0, indices past the end and the unusable slot
    /// following a `Long` or `Double` are all rejected.
    pub fn get(&self, index: u16) -> Result<&CpInfo> {
        match (index as usize)
            .checked_sub(1)
            .and_then(|i| self.cp_infos.get(i))
        {
            Some(CpInfo::Unusable) | None => Err(ClassFileError::InvalidConstantPoolIndex(index)),
            Some(cp_info) => Ok(cp_info),
        }
    }

    /// Like [`ConstantPool::get`], but index 0 means "absent".
    pub fn get0_ok(&self, index: u16) -> Result<Option<&CpInfo>> {
        if index == 0 {
            return Ok(None);
        }

        self.get(index).map(Some)
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        Ok(matches_cp_info!(self, index, Utf8)?.as_str())
    }

    pub fn utf8_0_ok(&self, index: u16) -> Result<Option<&str>> {
        optional(index, |index| self.utf8(index))
    }

    pub fn class_name(&self, index: u16) -> Result<&str> {
        let ClassInfo { name_index } = matches_cp_info!(self, index, Class)?;
        self.utf8(*name_index)
    }

    pub fn class_name_0_ok(&self, index: u16) -> Result<Option<&str>> {
        optional(index, |index| self.class_name(index))
    }

    pub fn name_and_type(&self, index: u16) -> Result<NameAndType> {
        let NameAndTypeInfo {
            name_index,
            descriptor_index,
        } = matches_cp_info!(self, index, NameAndType)?;

        Ok(NameAndType {
            name: self.utf8(*name_index)?.to_owned(),
            descriptor: self.utf8(*descriptor_index)?.to_owned(),
        })
    }

    pub fn name_and_type_0_ok(&self, index: u16) -> Result<Option<NameAndType>> {
        optional(index, |index| self.name_and_type(index))
    }

    /// Resolves a field, method or interface method reference.
    pub fn member_ref(&self, index: u16) -> Result<MemberRef> {
        let RefInfo {
            class_index,
            name_and_type_index,
        } = match self.get(index)? {
            CpInfo::FieldRef(r) | CpInfo::MethodRef(r) | CpInfo::InterfaceMethodRef(r) => r,
            c => {
                return Err(ClassFileError::UnexpectedConstantPoolEntry(
                    "MemberRef",
                    c.clone(),
                ))
            }
        };

        Ok(MemberRef {
            class: self.class_name(*class_index)?.to_owned(),
            name_and_type: self.name_and_type(*name_and_type_index)?,
        })
    }

    pub fn method_handle(&self, index: u16) -> Result<MethodHandle> {
        let MethodHandleInfo {
            reference_kind,
            reference_index,
        } = matches_cp_info!(self, index, MethodHandle)?;

        Ok(MethodHandle {
            reference_kind: *reference_kind,
            member: self.member_ref(*reference_index)?,
        })
    }

    /// Resolves the value of a `ConstantValue` attribute: a numeric or string
    /// constant.
    pub fn field_value(&self, index: u16) -> Result<Constant> {
        match self.get(index)? {
            CpInfo::Integer(_)
            | CpInfo::Float(_)
            | CpInfo::Long(_)
            | CpInfo::Double(_)
            | CpInfo::String { .. } => self.loadable(index),
            c => Err(ClassFileError::UnexpectedConstantPoolEntry(
                "Integer, Float, Long, Double or String",
                c.clone(),
            )),
        }
    }

    /// Resolves any constant that `ldc` or a bootstrap argument may refer to.
    pub fn loadable(&self, index: u16) -> Result<Constant> {
        Ok(match self.get(index)? {
            CpInfo::Integer(v) => Constant::Integer(*v),
            CpInfo::Float(v) => Constant::Float(*v),
            CpInfo::Long(v) => Constant::Long(*v),
            CpInfo::Double(v) => Constant::Double(*v),
            CpInfo::String { string_index } => {
                Constant::String(self.utf8(*string_index)?.to_owned())
            }
            CpInfo::Class(ClassInfo { name_index }) => {
                Constant::Class(self.utf8(*name_index)?.to_owned())
            }
            CpInfo::MethodType(MethodTypeInfo { descriptor_index }) => {
                Constant::MethodType(self.utf8(*descriptor_index)?.to_owned())
            }
            CpInfo::MethodHandle(_) => Constant::MethodHandle(self.method_handle(index)?),
            CpInfo::Dynamic(DynamicInfo {
                bootstrap_method_attr_index,
                name_and_type_index,
            }) => Constant::Dynamic {
                bootstrap_method_attr_index: *bootstrap_method_attr_index,
                name_and_type: self.name_and_type(*name_and_type_index)?,
            },
            c => {
                return Err(ClassFileError::UnexpectedConstantPoolEntry(
                    "loadable constant",
                    c.clone(),
                ))
            }
        })
    }
}
impl<'a> IntoIterator for &'a ConstantPool {
    type Item = &'a CpInfo;
    type IntoIter = std::slice::Iter<'a, CpInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.cp_infos.iter()
    }
}

fn optional<T>(index: u16, resolve: impl FnOnce(u16) -> Result<T>) -> Result<Option<T>> {
    if index == 0 {
        return Ok(None);
    }

    resolve(index).map(Some)
}

#[derive(Debug, PartialEq, Clone)]
pub enum CpInfo {
    MethodRef(RefInfo),
    FieldRef(RefInfo),
    Float(f32),
    Double(f64),
    InterfaceMethodRef(RefInfo),
    Class(ClassInfo),
    NameAndType(NameAndTypeInfo),
    Utf8(String),
    String { string_index: u16 },
    Dynamic(DynamicInfo),
    InvokeDynamic(DynamicInfo),
    Integer(i32),
    MethodHandle(MethodHandleInfo),
    MethodType(MethodTypeInfo),
    Long(i64),
    Module { name_index: u16 },
    Package { name_index: u16 },
    Unusable,
}

#[derive(Debug, PartialEq, Clone)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassInfo {
    // The value of the name_index item must be a valid index into the constant_pool table.
    // The constant_pool entry at that index must be a CONSTANT_Utf8_info structure (§4.4.7)
    // representing a valid binary class or interface name encoded in internal form (§4.2.1).
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodTypeInfo {
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameAndType {
    pub name: String,
    pub descriptor: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MemberRef {
    pub class: String,
    pub name_and_type: NameAndType,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodHandle {
    /// `REF_getField` (1) through `REF_invokeInterface` (9).
    pub reference_kind: u8,
    pub member: MemberRef,
}

/// A constant resolved out of the pool, detached from it.
#[derive(Debug, PartialEq, Clone)]
pub enum Constant {
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
    Class(String),
    MethodType(String),
    MethodHandle(MethodHandle),
    Dynamic {
        bootstrap_method_attr_index: u16,
        name_and_type: NameAndType,
    },
}

impl fmt::Display for NameAndType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.descriptor)
    }
}

impl fmt::Display for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MethodHandle[{}] {}.{}",
            self.reference_kind, self.member.class, self.member.name_and_type
        )
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Integer(v) => write!(f, "int {}", v),
            Constant::Float(v) => write!(f, "float {}", v),
            Constant::Long(v) => write!(f, "long {}", v),
            Constant::Double(v) => write!(f, "double {}", v),
            Constant::String(s) => write!(f, "string {:?}", s),
            Constant::Class(name) => write!(f, "type {}", name),
            Constant::MethodType(descriptor) => write!(f, "proto {}", descriptor),
            Constant::MethodHandle(handle) => handle.fmt(f),
            Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type,
            } => write!(f, "dynamic #{} {}", bootstrap_method_attr_index, name_and_type),
        }
    }
}
