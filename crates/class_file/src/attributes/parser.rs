use crate::{
    annotations::{AnnotationParser, AnnotationVisibility},
    attributes::{
        Attribute, AttributeContext, AttributeKind, Attributes, CodeAttribute, LocalVariable,
    },
    bytecode,
    bytes::ByteArray,
    observer::ParseObserver,
    ClassFileError, ConstantPool, Result,
};

use super::tables::LocalVariableFlavor;

/// Decodes attributes out of the bytes of one class file.
///
/// Every decoder consumes exactly the declared length of its attribute, or
/// fails. Nothing is retained from a failed decode.
pub struct AttributeParser<'a, 'o> {
    pub(super) bytes: ByteArray<'a>,
    pub(super) pool: &'a ConstantPool,
    pub(super) observer: Option<&'o mut dyn ParseObserver>,
}

impl<'a, 'o> AttributeParser<'a, 'o> {
    pub fn new(
        bytes: &'a [u8],
        pool: &'a ConstantPool,
        observer: Option<&'o mut dyn ParseObserver>,
    ) -> Self {
        Self {
            bytes: ByteArray::new(bytes),
            pool,
            observer,
        }
    }

    /// Parses an attribute list starting with its `u2 attributes_count` at
    /// `offset`. Returns the list and the offset just past it.
    pub fn parse_list(
        &mut self,
        context: AttributeContext,
        offset: usize,
    ) -> Result<(Attributes, usize)> {
        let start = offset;
        let count = self.bytes.u2(offset)?;
        self.parsed(offset, 2, || format!("attributes_count: {:04x}", count));

        let pool = self.pool;
        let mut offset = offset + 2;
        let mut attributes = Vec::with_capacity(count as usize);
        for i in 0..count {
            self.parsed(offset, 0, || format!("attributes[{}]:", i));
            self.change_indent(1);

            let name_index = self.bytes.u2(offset)?;
            let length = self.bytes.u4(offset + 2)? as usize;
            let name = pool.utf8(name_index)?;
            self.parsed(offset, 2, || format!("name: {}", name));
            self.parsed(offset + 2, 4, || format!("length: {:08x}", length));

            let body = offset + 6;
            if self.bytes.len() - body < length {
                return Err(ClassFileError::Truncated);
            }

            attributes.push(self.parse(context, name, body, length)?);
            offset = body + length;

            self.change_indent(-1);
            self.parsed(offset, 0, || format!("end attributes[{}]", i));
        }

        Ok((Attributes::new(attributes, offset - start), offset))
    }

    /// Decodes the attribute `name` whose body is `[offset, offset + length)`.
    pub fn parse(
        &mut self,
        context: AttributeContext,
        name: &str,
        offset: usize,
        length: usize,
    ) -> Result<Attribute> {
        self.bytes.slice(offset, offset.saturating_add(length))?;

        match AttributeKind::lookup(context, name) {
            AttributeKind::AnnotationDefault => self.annotation_default(offset, length),
            AttributeKind::BootstrapMethods => self.bootstrap_methods(offset, length),
            AttributeKind::Code => self.code(offset, length),
            AttributeKind::ConstantValue => self.constant_value(offset, length),
            AttributeKind::Deprecated => marker(length).map(|_| Attribute::Deprecated),
            AttributeKind::EnclosingMethod => self.enclosing_method(offset, length),
            AttributeKind::Exceptions => self.exceptions(offset, length),
            AttributeKind::InnerClasses => self.inner_classes(offset, length),
            AttributeKind::LineNumberTable => self.line_number_table(offset, length),
            AttributeKind::LocalVariableTable => self
                .local_variable_table(offset, length, LocalVariableFlavor::Descriptor)
                .map(Attribute::LocalVariableTable),
            AttributeKind::LocalVariableTypeTable => self
                .local_variable_table(offset, length, LocalVariableFlavor::Signature)
                .map(Attribute::LocalVariableTypeTable),
            AttributeKind::RuntimeInvisibleAnnotations => self
                .annotation_parser(offset, length)?
                .parse_annotation_attribute(AnnotationVisibility::Build)
                .map(Attribute::RuntimeInvisibleAnnotations),
            AttributeKind::RuntimeVisibleAnnotations => self
                .annotation_parser(offset, length)?
                .parse_annotation_attribute(AnnotationVisibility::Runtime)
                .map(Attribute::RuntimeVisibleAnnotations),
            AttributeKind::RuntimeInvisibleParameterAnnotations => self
                .annotation_parser(offset, length)?
                .parse_parameter_attribute(AnnotationVisibility::Build)
                .map(Attribute::RuntimeInvisibleParameterAnnotations),
            AttributeKind::RuntimeVisibleParameterAnnotations => self
                .annotation_parser(offset, length)?
                .parse_parameter_attribute(AnnotationVisibility::Runtime)
                .map(Attribute::RuntimeVisibleParameterAnnotations),
            AttributeKind::Signature => {
                let signature = self.single_index(offset, length, |pool, i| pool.utf8(i))?;
                self.parsed(offset, 2, || format!("signature: {}", signature));
                Ok(Attribute::Signature(signature.to_owned()))
            }
            AttributeKind::SourceDebugExtension => self.source_debug_extension(offset, length),
            AttributeKind::SourceFile => {
                let source_file = self.single_index(offset, length, |pool, i| pool.utf8(i))?;
                self.parsed(offset, 2, || format!("source: {}", source_file));
                Ok(Attribute::SourceFile(source_file.to_owned()))
            }
            AttributeKind::Synthetic => marker(length).map(|_| Attribute::Synthetic),
            AttributeKind::Unrecognized => self.unrecognized(context, name, offset, length),
        }
    }

    fn annotation_default(&mut self, offset: usize, length: usize) -> Result<Attribute> {
        self.annotation_parser(offset, length)?
            .parse_value_attribute()
            .map(Attribute::AnnotationDefault)
    }

    fn annotation_parser(
        &mut self,
        offset: usize,
        length: usize,
    ) -> Result<AnnotationParser<'a, '_>> {
        if length < 2 {
            return Err(ClassFileError::SeverelyTruncated);
        }

        Ok(AnnotationParser::new(
            self.bytes,
            self.pool,
            offset,
            length,
            self.observer(),
        ))
    }

    fn bootstrap_methods(&mut self, offset: usize, length: usize) -> Result<Attribute> {
        if length < 2 {
            return Err(ClassFileError::SeverelyTruncated);
        }

        let count = self.bytes.u2(offset)?;
        self.parsed(offset, 2, || format!("num_bootstrap_methods: {:04x}", count));

        self.parse_bootstrap_methods(count, offset + 2, length - 2)
            .map(Attribute::BootstrapMethods)
    }

    fn code(&mut self, offset: usize, length: usize) -> Result<Attribute> {
        if length < 12 {
            return Err(ClassFileError::SeverelyTruncated);
        }

        let start = offset;
        let max_stack = self.bytes.u2(offset)?;
        let max_locals = self.bytes.u2(offset + 2)?;
        let code_length = self.bytes.u4(offset + 4)? as usize;
        self.parsed(offset, 2, || format!("max_stack: {:04x}", max_stack));
        self.parsed(offset + 2, 2, || format!("max_locals: {:04x}", max_locals));
        self.parsed(offset + 4, 4, || format!("code_length: {:08x}", code_length));

        let offset = offset + 8;
        let length = length - 8;
        // At least exception_table_length and attributes_count must follow.
        if length < code_length.saturating_add(4) {
            return Err(ClassFileError::Truncated);
        }

        let code = self.bytes.bytes(offset..offset + code_length)?;
        if self.observer.is_some() {
            self.observe_bytecode(offset, code);
        }

        let offset = offset + code_length;
        let length = length - code_length;
        let (exception_table, table_length) = self.parse_exception_table(offset, length)?;

        let offset = offset + table_length;
        let length = length - table_length;
        let (attributes, end) = self.parse_list(AttributeContext::Code, offset)?;

        let attributes_length = end - offset;
        if attributes_length != length {
            return Err(ClassFileError::bad_length(
                attributes_length + (offset - start),
            ));
        }

        Ok(Attribute::Code(CodeAttribute {
            max_stack,
            max_locals,
            code: code.into(),
            exception_table,
            attributes,
        }))
    }

    fn observe_bytecode(&mut self, offset: usize, code: &[u8]) {
        let Some(observer) = self.observer.as_deref_mut() else {
            return;
        };

        let bytes = self.bytes.as_slice();
        observer.change_indent(1);
        let walked = bytecode::for_each_instruction(code, |pc, len, opcode| {
            let mnemonic = bytecode::opcode_name(opcode).unwrap_or("<invalid>");
            observer.parsed(bytes, offset + pc, len, &format!("{:04x}: {}", pc, mnemonic));
        });
        if let Err(e) = walked {
            observer.parsed(
                bytes,
                offset + e.offset,
                code.len() - e.offset,
                &format!("{:04x}: <malformed instruction>", e.offset),
            );
        }
        observer.change_indent(-1);
    }

    fn constant_value(&mut self, offset: usize, length: usize) -> Result<Attribute> {
        let value = self.single_index(offset, length, |pool, i| pool.field_value(i))?;
        self.parsed(offset, 2, || format!("value: {}", value));

        Ok(Attribute::ConstantValue(value))
    }

    fn enclosing_method(&mut self, offset: usize, length: usize) -> Result<Attribute> {
        if length != 4 {
            return Err(ClassFileError::BadLength(4));
        }

        let class = self.pool.class_name(self.bytes.u2(offset)?)?.to_owned();
        let method = self.pool.name_and_type_0_ok(self.bytes.u2(offset + 2)?)?;
        self.parsed(offset, 2, || format!("class: {}", class));
        self.parsed(offset + 2, 2, || match &method {
            Some(method) => format!("method: {}", method),
            None => "method: none".to_owned(),
        });

        Ok(Attribute::EnclosingMethod { class, method })
    }

    fn exceptions(&mut self, offset: usize, length: usize) -> Result<Attribute> {
        if length < 2 {
            return Err(ClassFileError::SeverelyTruncated);
        }

        let count = self.bytes.u2(offset)? as usize;
        self.parsed(offset, 2, || format!("number_of_exceptions: {:04x}", count));

        if length - 2 != count * 2 {
            return Err(ClassFileError::bad_length(count * 2 + 2));
        }

        let pool = self.pool;
        let exceptions = (0..count)
            .map(|i| {
                let entry = offset + 2 + i * 2;
                let exception = pool.class_name(self.bytes.u2(entry)?)?;
                self.parsed(entry, 2, || format!("  {}", exception));
                Ok(exception.to_owned())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Attribute::Exceptions(exceptions.into_boxed_slice()))
    }

    fn inner_classes(&mut self, offset: usize, length: usize) -> Result<Attribute> {
        if length < 2 {
            return Err(ClassFileError::SeverelyTruncated);
        }

        let count = self.bytes.u2(offset)?;
        self.parsed(offset, 2, || format!("number_of_classes: {:04x}", count));

        self.parse_inner_classes(count, offset + 2, length - 2)
            .map(Attribute::InnerClasses)
    }

    fn line_number_table(&mut self, offset: usize, length: usize) -> Result<Attribute> {
        if length < 2 {
            return Err(ClassFileError::SeverelyTruncated);
        }

        let count = self.bytes.u2(offset)?;
        self.parsed(offset, 2, || format!("line_number_table_length: {:04x}", count));

        self.parse_line_numbers(count, offset + 2, length - 2)
            .map(Attribute::LineNumberTable)
    }

    fn local_variable_table(
        &mut self,
        offset: usize,
        length: usize,
        flavor: LocalVariableFlavor,
    ) -> Result<Box<[LocalVariable]>> {
        if length < 2 {
            return Err(ClassFileError::SeverelyTruncated);
        }

        let count = self.bytes.u2(offset)?;
        self.parsed(offset, 2, || {
            format!("{}_table_length: {:04x}", flavor.table_prefix(), count)
        });

        self.parse_local_variables(count, offset + 2, length - 2, flavor)
    }

    fn source_debug_extension(&mut self, offset: usize, length: usize) -> Result<Attribute> {
        let debug_extension = self.bytes.bytes(offset..offset + length)?;
        self.parsed(offset, length, || {
            format!(
                "sourceDebugExtension: {}",
                String::from_utf8_lossy(debug_extension)
            )
        });

        Ok(Attribute::SourceDebugExtension(debug_extension.into()))
    }

    fn unrecognized(
        &mut self,
        context: AttributeContext,
        name: &str,
        offset: usize,
        length: usize,
    ) -> Result<Attribute> {
        log::debug!("Keeping unrecognized {:?} attribute {} as raw bytes", context, name);
        let info = self.bytes.bytes(offset..offset + length)?;
        self.parsed(offset, length, || format!("(unrecognized attribute {})", name));

        Ok(Attribute::Unrecognized {
            name: name.to_owned(),
            info: info.into(),
        })
    }

    /// Reads the `u2` constant pool index that makes up the whole body of
    /// `ConstantValue`, `Signature` and `SourceFile`.
    fn single_index<T>(
        &self,
        offset: usize,
        length: usize,
        resolve: impl FnOnce(&'a ConstantPool, u16) -> Result<T>,
    ) -> Result<T> {
        if length != 2 {
            return Err(ClassFileError::BadLength(2));
        }

        resolve(self.pool, self.bytes.u2(offset)?)
    }

    pub(super) fn observer(&mut self) -> Option<&mut dyn ParseObserver> {
        self.observer
            .as_mut()
            .map(|observer| &mut **observer as &mut dyn ParseObserver)
    }

    pub(super) fn parsed(&mut self, offset: usize, len: usize, human: impl FnOnce() -> String) {
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.parsed(self.bytes.as_slice(), offset, len, &human());
        }
    }

    pub(super) fn change_indent(&mut self, delta: i32) {
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.change_indent(delta);
        }
    }
}

/// `Deprecated` and `Synthetic` carry no payload.
fn marker(length: usize) -> Result<()> {
    if length != 0 {
        return Err(ClassFileError::BadLength(0));
    }

    Ok(())
}

#[cfg(test)]
mod parse_tests {
    use super::*;
    use crate::{
        annotations::ElementValue,
        attributes::{ExceptionTableEntry, LineNumber},
        constant_pool::{test_support::pool, Constant, CpInfo},
        observer::test_support::RecordingObserver,
        InnerClassAccessFlags,
    };

    fn parse(context: AttributeContext, name: &str, bytes: &[u8]) -> Result<Attribute> {
        parse_with_length(context, name, bytes, bytes.len())
    }

    fn parse_with_length(
        context: AttributeContext,
        name: &str,
        bytes: &[u8],
        length: usize,
    ) -> Result<Attribute> {
        let pool = pool();
        AttributeParser::new(bytes, &pool, None).parse(context, name, 0, length)
    }

    /// `return` guarded by a catch-all handler, with a one-line
    /// `LineNumberTable`. 33 bytes.
    const CODE: [u8; 33] = [
        0x00, 0x01, 0x00, 0x01, // max_stack, max_locals
        0x00, 0x00, 0x00, 0x01, 0xb1, // code_length, code
        0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, // exception table
        0x00, 0x01, // attributes_count
        0x00, 0x11, 0x00, 0x00, 0x00, 0x06, // LineNumberTable, length 6
        0x00, 0x01, 0x00, 0x00, 0x00, 0x07,
    ];

    #[test]
    fn it_should_parse_a_line_number_table() {
        let bytes = [0x00, 0x02, 0x00, 0x05, 0x00, 0x0a, 0x00, 0x07, 0x00, 0x0b];

        assert_eq!(
            parse(AttributeContext::Code, "LineNumberTable", &bytes).unwrap(),
            Attribute::LineNumberTable(
                vec![
                    LineNumber {
                        start_pc: 5,
                        line_number: 10
                    },
                    LineNumber {
                        start_pc: 7,
                        line_number: 11
                    },
                ]
                .into_boxed_slice()
            )
        );
    }

    #[test]
    fn it_should_reject_a_line_number_table_with_a_trailing_byte() {
        let bytes = [0x00, 0x02, 0x00, 0x05, 0x00, 0x0a, 0x00, 0x07, 0x00, 0x0b, 0x00];

        assert!(matches!(
            parse(AttributeContext::Code, "LineNumberTable", &bytes),
            Err(ClassFileError::BadLength(10))
        ));
    }

    #[test]
    fn it_should_parse_a_code_attribute() {
        let Attribute::Code(code) = parse(AttributeContext::Method, "Code", &CODE).unwrap() else {
            panic!("expected a Code attribute");
        };

        assert_eq!(code.max_stack, 1);
        assert_eq!(code.max_locals, 1);
        assert_eq!(&code.code[..], &[0xb1]);
        assert_eq!(
            &code.exception_table[..],
            &[ExceptionTableEntry {
                start_pc: 0,
                end_pc: 1,
                handler_pc: 1,
                catch_type: None,
            }]
        );
        assert_eq!(code.attributes.len(), 1);
        assert_eq!(code.attributes.byte_length(), 14);
        assert_eq!(
            code.line_numbers().collect::<Vec<_>>(),
            vec![&LineNumber {
                start_pc: 0,
                line_number: 7
            }]
        );
    }

    #[test]
    fn it_should_cite_the_full_length_when_a_code_attribute_is_one_byte_short() {
        assert!(matches!(
            parse_with_length(AttributeContext::Method, "Code", &CODE, CODE.len() - 1),
            Err(ClassFileError::BadLength(33))
        ));
    }

    #[test]
    fn it_should_accept_an_empty_exception_table() {
        let bytes = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0xb1, 0x00, 0x00, 0x00, 0x00,
        ];
        let Attribute::Code(code) = parse(AttributeContext::Method, "Code", &bytes).unwrap() else {
            panic!("expected a Code attribute");
        };

        assert!(code.exception_table.is_empty());
        assert!(code.attributes.is_empty());
    }

    #[test]
    fn it_should_fail_when_the_bytecode_does_not_leave_room_for_the_tables() {
        let bytes = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0xb1, 0xb1, 0x00, 0x00, 0x00,
        ];

        assert!(matches!(
            parse(AttributeContext::Method, "Code", &bytes),
            Err(ClassFileError::Truncated)
        ));
    }

    #[test]
    fn it_should_fail_on_a_severely_truncated_code_attribute() {
        assert!(matches!(
            parse(AttributeContext::Method, "Code", &[0x00; 11]),
            Err(ClassFileError::SeverelyTruncated)
        ));
    }

    #[test]
    fn it_should_fail_when_the_exception_table_claims_more_rows_than_remain() {
        // Two rows claimed, one present; its catch_type (#1) is not a Class.
        let bytes = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0xb1, //
            0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, //
            0x00, 0x00,
        ];

        assert!(matches!(
            parse(AttributeContext::Method, "Code", &bytes),
            Err(ClassFileError::Truncated)
        ));
    }

    #[test]
    fn it_should_require_catch_types_to_be_classes() {
        let bytes = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0xb1, //
            0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x08, //
            0x00, 0x00,
        ];

        assert!(matches!(
            parse(AttributeContext::Method, "Code", &bytes),
            Err(ClassFileError::UnexpectedConstantPoolEntry(
                "Class",
                CpInfo::Integer(42)
            ))
        ));
    }

    #[test]
    fn it_should_not_let_the_observer_change_the_result() {
        let pool = pool();
        let mut observer = RecordingObserver::default();
        let observed = AttributeParser::new(&CODE, &pool, Some(&mut observer))
            .parse(AttributeContext::Method, "Code", 0, CODE.len())
            .unwrap();

        assert_eq!(
            observed,
            parse(AttributeContext::Method, "Code", &CODE).unwrap()
        );
        assert!(observer
            .events
            .contains(&(8, 1, "0000: return".to_owned())));
        assert_eq!(observer.indent, 0);
    }

    #[test]
    fn it_should_reject_inner_classes_with_a_short_row_before_reading_it() {
        // The row would name constant #1, a Utf8, if it were read.
        let bytes = [0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00];

        assert!(matches!(
            parse(AttributeContext::Class, "InnerClasses", &bytes),
            Err(ClassFileError::BadLength(10))
        ));
    }

    #[test]
    fn it_should_parse_inner_classes() {
        let bytes = [0x00, 0x01, 0x00, 0x0e, 0x00, 0x02, 0x00, 0x00, 0x00, 0x09];
        let Attribute::InnerClasses(classes) =
            parse(AttributeContext::Class, "InnerClasses", &bytes).unwrap()
        else {
            panic!("expected an InnerClasses attribute");
        };

        assert_eq!(classes[0].inner_class, "java/io/IOException");
        assert_eq!(classes[0].outer_class.as_deref(), Some("java/lang/Object"));
        assert_eq!(classes[0].inner_name, None);
        assert_eq!(
            classes[0].access_flags,
            InnerClassAccessFlags::PUBLIC | InnerClassAccessFlags::STATIC
        );
    }

    #[test]
    fn it_should_reject_bootstrap_methods_that_do_not_reference_a_method_handle() {
        assert!(matches!(
            parse(
                AttributeContext::Class,
                "BootstrapMethods",
                &[0x00, 0x01, 0x00, 0x08, 0x00, 0x00]
            ),
            Err(ClassFileError::UnexpectedConstantPoolEntry(
                "MethodHandle",
                CpInfo::Integer(42)
            ))
        ));
    }

    #[test]
    fn it_should_parse_a_constant_value() {
        assert_eq!(
            parse(AttributeContext::Field, "ConstantValue", &[0x00, 0x08]).unwrap(),
            Attribute::ConstantValue(Constant::Integer(42))
        );
        assert!(matches!(
            parse(AttributeContext::Field, "ConstantValue", &[0x00, 0x08, 0x00]),
            Err(ClassFileError::BadLength(2))
        ));
    }

    #[test]
    fn it_should_parse_exceptions() {
        assert_eq!(
            parse(AttributeContext::Method, "Exceptions", &[0x00, 0x01, 0x00, 0x0e]).unwrap(),
            Attribute::Exceptions(vec!["java/io/IOException".to_owned()].into_boxed_slice())
        );
        assert!(matches!(
            parse(AttributeContext::Method, "Exceptions", &[0x00, 0x02, 0x00, 0x0e]),
            Err(ClassFileError::BadLength(6))
        ));
        assert!(matches!(
            parse(AttributeContext::Method, "Exceptions", &[0x00]),
            Err(ClassFileError::SeverelyTruncated)
        ));
    }

    #[test]
    fn it_should_accept_an_enclosing_method_without_a_method() {
        assert_eq!(
            parse(AttributeContext::Class, "EnclosingMethod", &[0x00, 0x02, 0x00, 0x00]).unwrap(),
            Attribute::EnclosingMethod {
                class: "java/lang/Object".into(),
                method: None,
            }
        );
    }

    #[test]
    fn it_should_reject_an_enclosing_method_of_the_wrong_length() {
        assert!(matches!(
            parse(
                AttributeContext::Class,
                "EnclosingMethod",
                &[0x00, 0x02, 0x00, 0x05, 0x00]
            ),
            Err(ClassFileError::BadLength(4))
        ));
    }

    #[test]
    fn it_should_reject_marker_attributes_with_a_payload() {
        assert_eq!(
            parse(AttributeContext::Field, "Synthetic", &[]).unwrap(),
            Attribute::Synthetic
        );
        assert!(matches!(
            parse(AttributeContext::Method, "Deprecated", &[0x00]),
            Err(ClassFileError::BadLength(0))
        ));
    }

    #[test]
    fn it_should_parse_signatures_and_source_files() {
        assert_eq!(
            parse(AttributeContext::Field, "Signature", &[0x00, 0x10]).unwrap(),
            Attribute::Signature("Ljava/util/List<TT;>;".into())
        );
        assert_eq!(
            parse(AttributeContext::Class, "SourceFile", &[0x00, 0x09]).unwrap(),
            Attribute::SourceFile("Hello.java".into())
        );
    }

    #[test]
    fn it_should_reject_single_index_attributes_of_the_wrong_length() {
        assert!(matches!(
            parse(AttributeContext::Method, "Signature", &[0x00, 0x10, 0x00]),
            Err(ClassFileError::BadLength(2))
        ));
        assert!(matches!(
            parse(AttributeContext::Class, "SourceFile", &[0x00]),
            Err(ClassFileError::BadLength(2))
        ));
    }

    #[test]
    fn it_should_parse_a_local_variable_type_table() {
        let bytes = [
            0x00, 0x01, //
            0x00, 0x00, 0x00, 0x05, 0x00, 0x03, 0x00, 0x10, 0x00, 0x01,
        ];

        assert_eq!(
            parse(AttributeContext::Code, "LocalVariableTypeTable", &bytes).unwrap(),
            Attribute::LocalVariableTypeTable(
                vec![LocalVariable {
                    start_pc: 0,
                    length: 5,
                    name: "run".into(),
                    descriptor: None,
                    signature: Some("Ljava/util/List<TT;>;".into()),
                    index: 1,
                }]
                .into_boxed_slice()
            )
        );
    }

    #[test]
    fn it_should_parse_an_annotation_default() {
        assert_eq!(
            parse(AttributeContext::Method, "AnnotationDefault", &[b'I', 0x00, 0x08]).unwrap(),
            Attribute::AnnotationDefault(ElementValue::Int(42))
        );
        assert!(matches!(
            parse(AttributeContext::Method, "AnnotationDefault", &[b'I', 0x00, 0x08, 0x00]),
            Err(ClassFileError::BadLength(3))
        ));
    }

    #[test]
    fn it_should_parse_parameter_annotations() {
        let bytes = [0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x0f, 0x00, 0x00];
        let Attribute::RuntimeInvisibleParameterAnnotations(parameters) = parse(
            AttributeContext::Method,
            "RuntimeInvisibleParameterAnnotations",
            &bytes,
        )
        .unwrap() else {
            panic!("expected RuntimeInvisibleParameterAnnotations");
        };

        assert_eq!(parameters.len(), 2);
        assert!(parameters[0].is_empty());
        assert_eq!(
            parameters[1].get("I").unwrap().visibility,
            AnnotationVisibility::Build
        );

        let Attribute::RuntimeVisibleParameterAnnotations(parameters) = parse(
            AttributeContext::Method,
            "RuntimeVisibleParameterAnnotations",
            &[0x01, 0x00, 0x00],
        )
        .unwrap() else {
            panic!("expected RuntimeVisibleParameterAnnotations");
        };
        assert_eq!(parameters.len(), 1);
        assert!(parameters[0].is_empty());
    }

    #[test]
    fn it_should_keep_source_debug_extensions_verbatim() {
        let bytes = [b'S', b'M', b'A', b'P', 0xc0, 0x80];

        assert_eq!(
            parse(AttributeContext::Class, "SourceDebugExtension", &bytes).unwrap(),
            Attribute::SourceDebugExtension(bytes.to_vec().into_boxed_slice())
        );
    }

    #[test]
    fn it_should_keep_attributes_outside_their_context_as_raw_bytes() {
        let bytes = [0x00, 0x00];
        let attribute = parse(AttributeContext::Class, "LineNumberTable", &bytes).unwrap();

        assert_eq!(attribute.kind(), AttributeKind::Unrecognized);
        assert_eq!(attribute.name(), "LineNumberTable");
        assert_eq!(
            attribute,
            Attribute::Unrecognized {
                name: "LineNumberTable".into(),
                info: bytes.to_vec().into_boxed_slice(),
            }
        );
    }

    #[test]
    fn it_should_require_a_count_in_annotation_attributes() {
        assert!(matches!(
            parse(AttributeContext::Field, "RuntimeVisibleAnnotations", &[0x00]),
            Err(ClassFileError::SeverelyTruncated)
        ));
        assert_eq!(
            parse(AttributeContext::Field, "RuntimeVisibleAnnotations", &[0x00, 0x00]).unwrap(),
            Attribute::RuntimeVisibleAnnotations(Default::default())
        );
    }

    #[test]
    fn it_should_reject_attribute_ranges_outside_the_buffer() {
        assert!(matches!(
            parse_with_length(AttributeContext::Class, "SourceFile", &[0x00, 0x09], 4),
            Err(ClassFileError::OutOfBounds { .. })
        ));
    }
}
