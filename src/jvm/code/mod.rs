//! Method bytecode
//!
//! ### Structure
//!
//! The bytecode of a method lives in [just another method
//! attribute](crate::jvm::class_file::MethodCode), but it is the part that needs the most care to
//! edit. Instructions have different widths, and some of them (`tableswitch` and `lookupswitch`)
//! even change width depending on where they are. Jumps are encoded as relative byte offsets.
//! Inserting a single instruction in the middle of a method therefore moves everything after it,
//! and potentially changes the encoding of jumps that cross the insertion point.
//!
//! To keep that manageable, the code is split in three layers:
//!
//!   - [`Opcode`] is the static table of the [instruction set][0] (mnemonic, operand layout,
//!     properties)
//!   - [`Instruction`] is one decoded instruction, with [`decode_one`] and
//!     [`Instruction::encode`] going to and from bytes
//!   - [`InstructionSequence`] is an editable method body where jumps point at other
//!     instructions through stable [`InsnId`] handles, and offsets are recomputed on every edit
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se18/html/jvms-6.html#jvms-6.5

mod instructions;
mod label;
mod opcode;
mod sequence;

pub use instructions::*;
pub use label::*;
pub use opcode::*;
pub use sequence::*;
