use std::fmt;

use crate::{
    attributes::{Attribute, Attributes, CodeAttribute},
    constant_pool::Constant,
    observer::ParseObserver,
    parser::Parser,
    AccessFlags, ConstantPool, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
}
impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug)]
pub struct ClassFile {
    pub constant_pool: ConstantPool,
    pub version: Version,
    pub access_flags: AccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Attributes,
}
impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<ClassFile> {
        Parser::new(bytes, None).parse()
    }

    /// Parses `bytes`, reporting every decoded byte range to `observer`.
    pub fn parse_with_observer(
        bytes: &[u8],
        observer: &mut dyn ParseObserver,
    ) -> Result<ClassFile> {
        Parser::new(bytes, Some(observer)).parse()
    }

    /// `None` only for `java/lang/Object`.
    pub fn super_class(&self) -> Result<Option<&str>> {
        self.constant_pool.class_name_0_ok(self.super_class)
    }

    pub fn class_name(&self) -> Result<&str> {
        self.constant_pool.class_name(self.this_class)
    }

    pub fn interfaces(&self) -> Result<Vec<&str>> {
        self.interfaces
            .iter()
            .map(|&index| self.constant_pool.class_name(index))
            .collect()
    }

    pub fn field_name(&self, field: &FieldInfo) -> Result<&str> {
        self.constant_pool.utf8(field.name_index)
    }

    pub fn field_descriptor(&self, field: &FieldInfo) -> Result<&str> {
        self.constant_pool.utf8(field.descriptor_index)
    }

    pub fn method_name(&self, method: &MethodInfo) -> Result<&str> {
        self.constant_pool.utf8(method.name_index)
    }

    pub fn method_descriptor(&self, method: &MethodInfo) -> Result<&str> {
        self.constant_pool.utf8(method.descriptor_index)
    }

    pub fn source_file(&self) -> Option<&str> {
        self.attributes.source_file()
    }

    pub fn method_by_name(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|method| {
            self.method_name(method).map_or(false, |n| n == name)
                && self
                    .method_descriptor(method)
                    .map_or(false, |d| d == descriptor)
        })
    }
}

#[derive(Debug)]
pub struct FieldInfo {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}
impl FieldInfo {
    pub fn constant_value(&self) -> Option<&Constant> {
        self.attributes.iter().find_map(|attribute| match attribute {
            Attribute::ConstantValue(value) => Some(value),
            _ => None,
        })
    }
}

#[derive(Debug)]
pub struct MethodInfo {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}
impl MethodInfo {
    /// `None` for abstract and native methods.
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.code_attribute()
    }
}
