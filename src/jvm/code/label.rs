use crate::util::HolderId;
use std::fmt;

/// Opaque handle on an instruction in an [`InstructionSequence`](super::InstructionSequence)
///
/// Unlike positions and offsets, handles never change while the instruction stays in the
/// sequence: they are what jumps, switches and exception ranges point at.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct InsnId(u32);

impl fmt::Debug for InsnId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_fmt(format_args!("i{}", self.0))
    }
}

impl fmt::Display for InsnId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, formatter)
    }
}

/// Generates fresh instruction handles
///
/// A clone hands out the same handles as the generator it was cloned from, so handles are only
/// unique within one sequence.
#[derive(Clone, Debug, Default)]
pub struct InsnIdGenerator(u32);

impl InsnIdGenerator {
    pub fn new() -> InsnIdGenerator {
        InsnIdGenerator(0)
    }

    pub fn fresh(&mut self) -> InsnId {
        let to_return = InsnId(self.0);
        self.0 += 1;
        to_return
    }
}

/// Something holding a reference to an instruction
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum InsnHolder {
    /// Jump or switch in the same sequence
    Instruction(InsnId),

    /// Something outside the sequence (eg. an exception handler range)
    External(HolderId),
}
