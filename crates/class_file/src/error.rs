use std::path::PathBuf;

use thiserror::Error;

use crate::constant_pool::CpKind;

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("Unexpected end of stream at offset {offset}: {needed} more bytes required")]
    TruncatedStream { offset: u64, needed: u64 },
    #[error("Invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("Expected {expected} at constant pool index {index}, found {found}")]
    ConstantPoolTypeMismatch {
        index: u16,
        expected: CpKind,
        found: CpKind,
    },
    #[error("Malformed attribute header at offset {offset}: name index {index} is not a Utf8 entry")]
    MalformedAttributeHeader { offset: u64, index: u16 },
    #[error("Attribute {name} declares {declared} bytes but its body is {consumed} bytes")]
    AttributeLengthMismatch {
        name: String,
        declared: u32,
        consumed: u64,
    },
    #[error("Code attribute at offset {offset} is nested inside another Code attribute")]
    NestedCodeAttribute { offset: u64 },
    #[error("Constant pool entry {index} is not valid modified UTF-8")]
    InvalidModifiedUtf8 { index: u16 },
    #[error("ConstantValue at constant pool index {index} must be a literal, found {found}")]
    InvalidConstantValue { index: u16, found: CpKind },
    #[error("Could not open {}: {source}", .path.display())]
    UnopenableInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid magic identifier: 0x{0:X}")]
    InvalidMagicIdentifier(u32),
    #[error("Invalid cp info tag {tag} at constant pool index {index}")]
    InvalidCpInfoTag { index: u16, tag: u8 },
    #[error("Invalid descriptor: {0:?}")]
    InvalidDescriptor(String),
}
