use thiserror::Error;

use crate::constant_pool;

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("severely truncated attribute")]
    SeverelyTruncated,
    #[error("truncated attribute")]
    Truncated,
    #[error("bad attribute length; expected length {0:08x}")]
    BadLength(u32),
    #[error("Expected {0}, found {1:?}")]
    UnexpectedConstantPoolEntry(&'static str, constant_pool::CpInfo),
    #[error("Invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("Read of {len} byte(s) at offset 0x{offset:X} is out of bounds")]
    OutOfBounds { offset: usize, len: usize },
    #[error("Invalid magic identifier: 0x{0:X}")]
    InvalidMagicIdentifier(u32),
    #[error("Invalid cp info tag: {0}")]
    InvalidCpInfoTag(u8),
    #[error("Unsupported class file version {0}.{1}")]
    UnsupportedVersion(u16, u16),
    #[error("Invalid element value tag: {0:?}")]
    InvalidElementValueTag(char),
    #[error("Element values nested too deeply at offset 0x{offset:X}")]
    NestingTooDeep { offset: usize },
    #[error("Duplicate annotation: {0}")]
    DuplicateAnnotation(String),
    #[error("{0} extra byte(s) at end of class file")]
    TrailingBytes(usize),
}

impl ClassFileError {
    /// Builds [`ClassFileError::BadLength`] from a byte count computed in `usize`.
    pub(crate) fn bad_length(expected: usize) -> Self {
        ClassFileError::BadLength(expected as u32)
    }
}
