use super::class_file::{Constant, ConstantHolder, ConstantIndex, ConstantTag};
use super::code::{Category, InsnHolder, InsnId, Instruction, Opcode};
use crate::util::{HolderId, Offset};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Input bytes are not a well-formed encoding
    Format(FormatError),

    /// Access through an index that does not designate a live entry
    Index(IndexError),

    /// Opcode outside of the dispatch table (including reserved opcodes)
    UnknownOpcode { opcode: u8, offset: Offset },

    /// Constant could not be removed because something still refers to it
    ///
    /// The pool is left exactly as it was before the removal was attempted.
    ConstantStillReferenced {
        index: ConstantIndex,
        holders: Vec<ConstantHolder>,
    },

    /// Instruction was removed, but something still referred to it
    ///
    /// The instruction _is_ unlinked from the sequence. The holders listed here now dangle and
    /// need to be retargeted before the sequence can be encoded again.
    InstructionStillReferenced {
        removed: Instruction<InsnId>,
        holders: Vec<InsnHolder>,
    },

    /// Adding this constant would push the pool past the largest addressable index
    ConstantPoolOverflow { constant: Constant, offset: u16 },

    /// Modified UTF-8 payload too long for the two byte length of a `Utf8` constant
    Utf8TooLong { len: usize },

    /// Instruction payload does not match the addressing mode of its opcode
    InvalidInstruction { opcode: Opcode, expected: Category },

    /// Short branch whose relative offset does not fit in 16 bits anymore
    BranchOverflow { at: Offset, target: Offset },

    /// Branch to an instruction that is no longer in the sequence
    DanglingTarget { at: Offset, target: InsnId },

    IoError(std::io::Error),
}

#[derive(Debug, PartialEq, Eq)]
pub enum FormatError {
    /// Stream ended in the middle of a construct
    Truncated,

    /// Constant pool count that can't be satisfied (zero, or a wide constant in the last slot)
    InvalidConstantCount(u16),
    UnknownConstantTag { index: ConstantIndex, tag: u8 },
    MalformedUtf8 { index: ConstantIndex },
    InvalidHandleKind { index: ConstantIndex, kind: u8 },

    /// Constant refers to an index which is not a valid entry of the same pool
    DanglingConstantReference {
        index: ConstantIndex,
        target: ConstantIndex,
    },

    /// Padding or reserved operand bytes which should have been zero
    NonZeroPadding { opcode: Opcode, offset: Offset },
    InvalidSwitchRange { offset: Offset, low: i32, high: i32 },
    NegativePairCount { offset: Offset, npairs: i32 },

    /// `wide` prefix in front of an opcode that can't be widened
    InvalidWideOpcode { offset: Offset, opcode: u8 },

    /// Jump whose target is outside the code or in the middle of an instruction
    InvalidBranchTarget { offset: Offset, target: isize },

    /// Code length of a `Code` attribute outside of `1..=65535`
    InvalidCodeLength(u32),

    /// Exception table pc which is not the start of an instruction
    InvalidExceptionPc(u16),
}

#[derive(Debug, PartialEq, Eq)]
pub enum IndexError {
    /// Constant pool indices start at 1
    ZeroConstantIndex,
    ConstantOutOfRange { index: ConstantIndex, len: usize },

    /// Second slot of a `Long` or `Double`
    Tombstone(ConstantIndex),
    TagMismatch {
        index: ConstantIndex,
        expected: ConstantTag,
        found: ConstantTag,
    },

    /// Holder is not registered on that constant
    UnregisteredConstantHolder {
        index: ConstantIndex,
        holder: ConstantHolder,
    },

    InstructionOutOfRange { position: usize, len: usize },

    /// Handle of an instruction that is not (or no longer) in the sequence
    UnknownInstruction(InsnId),

    /// Holder is not registered on that instruction
    UnregisteredInstructionHolder { target: InsnId, holder: InsnHolder },

    /// Exception table has no entry with that holder identity
    UnknownExceptionHandler(HolderId),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Error::Format(FormatError::Truncated)
        } else {
            Error::IoError(err)
        }
    }
}

impl From<FormatError> for Error {
    fn from(err: FormatError) -> Error {
        Error::Format(err)
    }
}

impl From<IndexError> for Error {
    fn from(err: IndexError) -> Error {
        Error::Index(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Format(err) => write!(f, "malformed input: {:?}", err),
            Error::Index(err) => write!(f, "invalid index: {:?}", err),
            Error::UnknownOpcode { opcode, offset } => {
                write!(f, "unknown opcode 0x{:02x} at offset {}", opcode, offset.0)
            }
            Error::ConstantStillReferenced { index, holders } => write!(
                f,
                "constant #{} is still referenced by {:?}",
                index.0, holders
            ),
            Error::InstructionStillReferenced { removed, holders } => write!(
                f,
                "removed instruction `{}` was still referenced by {:?}",
                removed, holders
            ),
            Error::ConstantPoolOverflow { constant, offset } => write!(
                f,
                "constant pool overflow adding {:?} at index {}",
                constant, offset
            ),
            Error::Utf8TooLong { len } => write!(
                f,
                "utf8 constant of {} bytes does not fit in 65535 bytes",
                len
            ),
            Error::InvalidInstruction { opcode, expected } => write!(
                f,
                "`{}` cannot be encoded as a {:?} instruction",
                opcode, expected
            ),
            Error::BranchOverflow { at, target } => write!(
                f,
                "branch at offset {} cannot reach offset {} with a 16-bit jump",
                at.0, target.0
            ),
            Error::DanglingTarget { at, target } => write!(
                f,
                "branch at offset {} targets removed instruction {:?}",
                at.0, target
            ),
            Error::IoError(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}
