// https://docs.oracle.com/javase/specs/jvms/se19/html/jvms-4.html#jvms-4.7

mod parser;
mod tables;

use std::fmt;

use crate::{
    annotations::{Annotations, ElementValue},
    constant_pool::{Constant, MethodHandle, NameAndType},
    InnerClassAccessFlags,
};

pub use self::parser::AttributeParser;

/// Where an attribute list appears. The same name can decode differently, or
/// not at all, depending on the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeContext {
    Class,
    Field,
    Method,
    Code,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    AnnotationDefault,
    BootstrapMethods,
    Code,
    ConstantValue,
    Deprecated,
    EnclosingMethod,
    Exceptions,
    InnerClasses,
    LineNumberTable,
    LocalVariableTable,
    LocalVariableTypeTable,
    RuntimeInvisibleAnnotations,
    RuntimeInvisibleParameterAnnotations,
    RuntimeVisibleAnnotations,
    RuntimeVisibleParameterAnnotations,
    Signature,
    SourceDebugExtension,
    SourceFile,
    Synthetic,
    Unrecognized,
}
impl AttributeKind {
    /// Resolves an attribute name in `context` to the decoder that handles it.
    /// Names that are unknown, or not legal in `context`, are `Unrecognized`.
    pub fn lookup(context: AttributeContext, name: &str) -> AttributeKind {
        match Self::from_name(name) {
            Some(kind) if kind.is_legal_in(context) => kind,
            _ => AttributeKind::Unrecognized,
        }
    }

    fn from_name(name: &str) -> Option<AttributeKind> {
        use AttributeKind::*;

        Some(match name {
            "AnnotationDefault" => AnnotationDefault,
            "BootstrapMethods" => BootstrapMethods,
            "Code" => Code,
            "ConstantValue" => ConstantValue,
            "Deprecated" => Deprecated,
            "EnclosingMethod" => EnclosingMethod,
            "Exceptions" => Exceptions,
            "InnerClasses" => InnerClasses,
            "LineNumberTable" => LineNumberTable,
            "LocalVariableTable" => LocalVariableTable,
            "LocalVariableTypeTable" => LocalVariableTypeTable,
            "RuntimeInvisibleAnnotations" => RuntimeInvisibleAnnotations,
            "RuntimeInvisibleParameterAnnotations" => RuntimeInvisibleParameterAnnotations,
            "RuntimeVisibleAnnotations" => RuntimeVisibleAnnotations,
            "RuntimeVisibleParameterAnnotations" => RuntimeVisibleParameterAnnotations,
            "Signature" => Signature,
            "SourceDebugExtension" => SourceDebugExtension,
            "SourceFile" => SourceFile,
            "Synthetic" => Synthetic,
            _ => return None,
        })
    }

    pub fn is_legal_in(self, context: AttributeContext) -> bool {
        use AttributeContext as Ctx;
        use AttributeKind::*;

        match self {
            Deprecated
            | RuntimeInvisibleAnnotations
            | RuntimeVisibleAnnotations
            | Signature
            | Synthetic => matches!(context, Ctx::Class | Ctx::Field | Ctx::Method),
            BootstrapMethods | EnclosingMethod | InnerClasses | SourceDebugExtension
            | SourceFile => context == Ctx::Class,
            ConstantValue => context == Ctx::Field,
            AnnotationDefault
            | Code
            | Exceptions
            | RuntimeInvisibleParameterAnnotations
            | RuntimeVisibleParameterAnnotations => context == Ctx::Method,
            LineNumberTable | LocalVariableTable | LocalVariableTypeTable => context == Ctx::Code,
            Unrecognized => true,
        }
    }

    /// The attribute name as it appears in the constant pool.
    pub fn name(self) -> Option<&'static str> {
        use AttributeKind::*;

        Some(match self {
            AnnotationDefault => "AnnotationDefault",
            BootstrapMethods => "BootstrapMethods",
            Code => "Code",
            ConstantValue => "ConstantValue",
            Deprecated => "Deprecated",
            EnclosingMethod => "EnclosingMethod",
            Exceptions => "Exceptions",
            InnerClasses => "InnerClasses",
            LineNumberTable => "LineNumberTable",
            LocalVariableTable => "LocalVariableTable",
            LocalVariableTypeTable => "LocalVariableTypeTable",
            RuntimeInvisibleAnnotations => "RuntimeInvisibleAnnotations",
            RuntimeInvisibleParameterAnnotations => "RuntimeInvisibleParameterAnnotations",
            RuntimeVisibleAnnotations => "RuntimeVisibleAnnotations",
            RuntimeVisibleParameterAnnotations => "RuntimeVisibleParameterAnnotations",
            Signature => "Signature",
            SourceDebugExtension => "SourceDebugExtension",
            SourceFile => "SourceFile",
            Synthetic => "Synthetic",
            Unrecognized => return None,
        })
    }
}

/// A decoded attribute. Attributes are built once by [`AttributeParser`] and
/// never change afterwards.
#[derive(Debug, PartialEq, Clone)]
pub enum Attribute {
    AnnotationDefault(ElementValue),
    BootstrapMethods(Box<[BootstrapMethod]>),
    Code(CodeAttribute),
    ConstantValue(Constant),
    Deprecated,
    EnclosingMethod {
        class: String,
        /// `None` when the class is not enclosed by a method, e.g. an
        /// anonymous class in a field initializer.
        method: Option<NameAndType>,
    },
    Exceptions(Box<[String]>),
    InnerClasses(Box<[InnerClass]>),
    LineNumberTable(Box<[LineNumber]>),
    LocalVariableTable(Box<[LocalVariable]>),
    LocalVariableTypeTable(Box<[LocalVariable]>),
    RuntimeInvisibleAnnotations(Annotations),
    RuntimeInvisibleParameterAnnotations(Box<[Annotations]>),
    RuntimeVisibleAnnotations(Annotations),
    RuntimeVisibleParameterAnnotations(Box<[Annotations]>),
    Signature(String),
    /// Free-form debug data, not necessarily valid (modified) UTF-8.
    SourceDebugExtension(Box<[u8]>),
    SourceFile(String),
    Synthetic,
    Unrecognized {
        name: String,
        info: Box<[u8]>,
    },
}
impl Attribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Attribute::AnnotationDefault(_) => AttributeKind::AnnotationDefault,
            Attribute::BootstrapMethods(_) => AttributeKind::BootstrapMethods,
            Attribute::Code(_) => AttributeKind::Code,
            Attribute::ConstantValue(_) => AttributeKind::ConstantValue,
            Attribute::Deprecated => AttributeKind::Deprecated,
            Attribute::EnclosingMethod { .. } => AttributeKind::EnclosingMethod,
            Attribute::Exceptions(_) => AttributeKind::Exceptions,
            Attribute::InnerClasses(_) => AttributeKind::InnerClasses,
            Attribute::LineNumberTable(_) => AttributeKind::LineNumberTable,
            Attribute::LocalVariableTable(_) => AttributeKind::LocalVariableTable,
            Attribute::LocalVariableTypeTable(_) => AttributeKind::LocalVariableTypeTable,
            Attribute::RuntimeInvisibleAnnotations(_) => AttributeKind::RuntimeInvisibleAnnotations,
            Attribute::RuntimeInvisibleParameterAnnotations(_) => {
                AttributeKind::RuntimeInvisibleParameterAnnotations
            }
            Attribute::RuntimeVisibleAnnotations(_) => AttributeKind::RuntimeVisibleAnnotations,
            Attribute::RuntimeVisibleParameterAnnotations(_) => {
                AttributeKind::RuntimeVisibleParameterAnnotations
            }
            Attribute::Signature(_) => AttributeKind::Signature,
            Attribute::SourceDebugExtension(_) => AttributeKind::SourceDebugExtension,
            Attribute::SourceFile(_) => AttributeKind::SourceFile,
            Attribute::Synthetic => AttributeKind::Synthetic,
            Attribute::Unrecognized { .. } => AttributeKind::Unrecognized,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Attribute::Unrecognized { name, .. } => name,
            _ => self.kind().name().unwrap_or_default(),
        }
    }
}

/// An attribute list, sealed once parsed.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Attributes {
    attributes: Box<[Attribute]>,
    byte_length: usize,
}
impl Attributes {
    pub(crate) fn new(attributes: Vec<Attribute>, byte_length: usize) -> Self {
        Self {
            attributes: attributes.into_boxed_slice(),
            byte_length,
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Bytes the list occupied in the class file, counts and headers included.
    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attributes.iter()
    }

    pub fn find(&self, kind: AttributeKind) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.kind() == kind)
    }

    pub fn find_all(&self, kind: AttributeKind) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(move |a| a.kind() == kind)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    pub fn code_attribute(&self) -> Option<&CodeAttribute> {
        match self.find(AttributeKind::Code)? {
            Attribute::Code(code) => Some(code),
            _ => None,
        }
    }

    pub fn source_file(&self) -> Option<&str> {
        match self.find(AttributeKind::SourceFile)? {
            Attribute::SourceFile(source_file) => Some(source_file),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&str> {
        match self.find(AttributeKind::Signature)? {
            Attribute::Signature(signature) => Some(signature),
            _ => None,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        self.find(AttributeKind::Deprecated).is_some()
    }

    pub fn is_synthetic(&self) -> bool {
        self.find(AttributeKind::Synthetic).is_some()
    }
}
impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// `None` catches everything; this is how `finally` is compiled.
    pub catch_type: Option<String>,
}

#[derive(PartialEq, Clone)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Box<[u8]>,
    pub exception_table: Box<[ExceptionTableEntry]>,
    pub attributes: Attributes,
}
impl CodeAttribute {
    pub fn line_numbers(&self) -> impl Iterator<Item = &LineNumber> {
        self.attributes
            .find_all(AttributeKind::LineNumberTable)
            .flat_map(|a| match a {
                Attribute::LineNumberTable(lines) => &lines[..],
                _ => &[][..],
            })
    }

    pub fn local_variables(&self) -> impl Iterator<Item = &LocalVariable> {
        self.attributes
            .find_all(AttributeKind::LocalVariableTable)
            .flat_map(|a| match a {
                Attribute::LocalVariableTable(locals) => &locals[..],
                _ => &[][..],
            })
    }
}
impl fmt::Debug for CodeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeAttribute")
            .field("max_stack", &self.max_stack)
            .field("max_locals", &self.max_locals)
            .field("code", &format!("({} bytes)", self.code.len()))
            .field("exception_table", &self.exception_table)
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// One entry of the `BootstrapMethods` table, referenced by `invokedynamic`
/// call sites and dynamic constants.
#[derive(Debug, PartialEq, Clone)]
pub struct BootstrapMethod {
    pub method_handle: MethodHandle,
    pub arguments: Box<[Constant]>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct InnerClass {
    pub inner_class: String,
    pub outer_class: Option<String>,
    /// `None` for anonymous classes.
    pub inner_name: Option<String>,
    pub access_flags: InnerClassAccessFlags,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

/// A row of either `LocalVariableTable` (which fills in `descriptor`) or
/// `LocalVariableTypeTable` (which fills in `signature`).
#[derive(Debug, PartialEq, Clone)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: Option<String>,
    pub signature: Option<String>,
    pub index: u16,
}
