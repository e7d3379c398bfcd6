// https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html

mod access_flags;
pub mod annotations;
pub mod attributes;
pub mod bytecode;
pub mod bytes;
mod class_file;
#[macro_use]
pub mod constant_pool;
mod error;
pub mod observer;
mod parser;

pub use self::class_file::{ClassFile, FieldInfo, MethodInfo, Version};
pub use access_flags::{AccessFlags, InnerClassAccessFlags};
pub use attributes::{Attribute, AttributeContext, AttributeKind, AttributeParser, Attributes};
pub use constant_pool::ConstantPool;
pub use error::ClassFileError;
pub use observer::{LogObserver, ParseObserver};
pub use parser::Parser;

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;
