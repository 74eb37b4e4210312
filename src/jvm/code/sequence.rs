use super::{decode_one, InsnHolder, InsnId, InsnIdGenerator, Instruction};
use crate::jvm::{Error, FormatError, IndexError};
use crate::util::{HolderId, InboundRefs, Offset, OffsetResult, OffsetVec, Width};
use std::collections::HashMap;
use std::fmt;

/// Instruction along with its stable handle
#[derive(Clone)]
struct Node {
    id: InsnId,
    insn: Instruction<InsnId>,
}

impl Width for Node {
    fn width(&self, offset: Offset) -> usize {
        self.insn.width(offset)
    }
}

/// Editable method body
///
/// Instructions are kept in order along with their byte offsets, which are recomputed on every
/// edit. Jumps and switches point at other instructions through [`InsnId`] handles rather than
/// offsets, so edits never invalidate them. Each instruction also tracks who points at it (other
/// instructions, plus any external holders such as exception ranges), so that removing an
/// instruction can report exactly which references it broke.
///
/// Positions are 0-based ordinals in the sequence. For all `i`,
/// `offset(i + 1) == offset(i) + width(i)`.
pub struct InstructionSequence {
    nodes: OffsetVec<Node>,

    /// Position of every instruction in `nodes`
    positions: HashMap<InsnId, usize>,

    /// Holders of every instruction in `nodes`
    inbound: HashMap<InsnId, InboundRefs<InsnHolder>>,

    /// Holders still registered on removed instructions, until they are retargeted or released
    dangling: HashMap<InsnId, InboundRefs<InsnHolder>>,

    ids: InsnIdGenerator,
}

impl InstructionSequence {
    pub fn new() -> InstructionSequence {
        InstructionSequence {
            nodes: OffsetVec::new(),
            positions: HashMap::new(),
            inbound: HashMap::new(),
            dangling: HashMap::new(),
            ids: InsnIdGenerator::new(),
        }
    }

    /// Decode a full method body
    ///
    /// Every jump target must be the start of an instruction in `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<InstructionSequence, Error> {
        let mut decoded: Vec<(Offset, Instruction<Offset>)> = vec![];
        let mut cursor = 0;
        while cursor < bytes.len() {
            let (insn, consumed) = decode_one(bytes, cursor, Offset(cursor))?;
            decoded.push((Offset(cursor), insn));
            cursor += consumed;
        }

        let mut sequence = InstructionSequence::new();
        let ids: HashMap<Offset, InsnId> = decoded
            .iter()
            .map(|(offset, _)| (*offset, sequence.ids.fresh()))
            .collect();

        for (offset, insn) in &decoded {
            let insn = insn.try_map_labels(|target| match ids.get(target) {
                Some(id) => Ok(*id),
                None => Err(FormatError::InvalidBranchTarget {
                    offset: *offset,
                    target: target.0 as isize,
                }),
            })?;
            let id = ids[offset];
            sequence.positions.insert(id, sequence.nodes.len());
            sequence.inbound.insert(id, InboundRefs::new());
            sequence.nodes.push(Node { id, insn });
        }
        for (_, _, node) in &sequence.nodes {
            for target in node.insn.labels() {
                if let Some(holders) = sequence.inbound.get_mut(target) {
                    holders.register(InsnHolder::Instruction(node.id));
                }
            }
        }

        log::debug!(
            "decoded {} instructions from {} bytes of code",
            sequence.len(),
            bytes.len()
        );
        Ok(sequence)
    }

    /// Encode the method body
    ///
    /// Jump targets are resolved from the current offsets, and switch padding is recomputed.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = Vec::with_capacity(self.code_length());
        for (offset, _, node) in &self.nodes {
            let insn = node.insn.try_map_labels(|target| {
                self.offset_of(*target).map_err(|_| Error::DanglingTarget {
                    at: offset,
                    target: *target,
                })
            })?;
            insn.encode(offset, &mut bytes)?;
        }
        log::debug!(
            "encoded {} instructions into {} bytes of code",
            self.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Number of instructions
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Size of the encoded method body, in bytes
    pub fn code_length(&self) -> usize {
        self.nodes.offset_len().0
    }

    /// Iterate through instructions in order, along with their offsets and handles
    pub fn iter(&self) -> impl Iterator<Item = (Offset, InsnId, &Instruction<InsnId>)> {
        self.nodes
            .iter()
            .map(|(offset, _, node)| (offset, node.id, &node.insn))
    }

    fn out_of_range(&self, position: usize) -> Error {
        Error::Index(IndexError::InstructionOutOfRange {
            position,
            len: self.len(),
        })
    }

    /// Get the instruction at a position
    pub fn get(&self, position: usize) -> Result<&Instruction<InsnId>, Error> {
        match self.nodes.get_index(position) {
            Some((_, node)) => Ok(&node.insn),
            None => Err(self.out_of_range(position)),
        }
    }

    /// Get the handle of the instruction at a position
    pub fn id_at(&self, position: usize) -> Result<InsnId, Error> {
        match self.nodes.get_index(position) {
            Some((_, node)) => Ok(node.id),
            None => Err(self.out_of_range(position)),
        }
    }

    /// Current position of an instruction
    pub fn position_of(&self, id: InsnId) -> Result<usize, Error> {
        match self.positions.get(&id) {
            Some(position) => Ok(*position),
            None => Err(Error::Index(IndexError::UnknownInstruction(id))),
        }
    }

    /// Current byte offset of an instruction
    pub fn offset_of(&self, id: InsnId) -> Result<Offset, Error> {
        let position = self.position_of(id)?;
        match self.nodes.get_index(position) {
            Some((offset, _)) => Ok(offset),
            None => Err(Error::Index(IndexError::UnknownInstruction(id))),
        }
    }

    /// Position of the instruction starting at `offset`, if there is one
    pub fn position_at_offset(&self, offset: Offset) -> Option<usize> {
        match self.nodes.get_offset(offset) {
            OffsetResult::Ok(position, _) => Some(position),
            _ => None,
        }
    }

    /// Everything currently pointing at an instruction
    pub fn holders(&self, id: InsnId) -> Result<Vec<InsnHolder>, Error> {
        match self.inbound.get(&id) {
            Some(holders) => Ok(holders.holders()),
            None => Err(Error::Index(IndexError::UnknownInstruction(id))),
        }
    }

    fn holders_mut(&mut self, id: InsnId) -> Result<&mut InboundRefs<InsnHolder>, Error> {
        self.inbound
            .get_mut(&id)
            .ok_or(Error::Index(IndexError::UnknownInstruction(id)))
    }

    /// Make sure a new instruction is well formed and only jumps to instructions in the sequence
    fn validate(&self, insn: &Instruction<InsnId>) -> Result<(), Error> {
        insn.check()?;
        for target in insn.labels() {
            self.position_of(*target)?;
        }
        Ok(())
    }

    fn register_labels(&mut self, id: InsnId, insn: &Instruction<InsnId>) {
        for target in insn.labels() {
            if let Some(holders) = self.inbound.get_mut(target) {
                holders.register(InsnHolder::Instruction(id));
            }
        }
    }

    fn unregister_labels(&mut self, id: InsnId, insn: &Instruction<InsnId>) {
        for target in insn.labels() {
            self.release(*target, InsnHolder::Instruction(id));
        }
    }

    /// Holders registered on an instruction, whether it is still in the sequence or not
    fn registrations(&self, id: InsnId) -> Option<&InboundRefs<InsnHolder>> {
        match self.inbound.get(&id) {
            Some(holders) => Some(holders),
            None => self.dangling.get(&id),
        }
    }

    /// Undo one registration of `holder` on `target`, returning whether there was one
    fn release(&mut self, target: InsnId, holder: InsnHolder) -> bool {
        if let Some(holders) = self.inbound.get_mut(&target) {
            return holders.unregister(holder);
        }
        match self.dangling.get_mut(&target) {
            Some(holders) => {
                let released = holders.unregister(holder);
                if holders.is_empty() {
                    self.dangling.remove(&target);
                }
                released
            }
            None => false,
        }
    }

    /// Refresh the recorded positions of instructions from `position` onwards
    fn reindex_from(&mut self, position: usize) {
        for (_, moved, node) in self.nodes.iter().skip(position) {
            self.positions.insert(node.id, moved);
        }
    }

    /// Insert an instruction before the one currently at `position` (or at the end, if
    /// `position` is the length)
    ///
    /// Every instruction after it moves forward by its width. References to the instruction
    /// previously at `position` keep pointing at that instruction, not the new one.
    pub fn insert(&mut self, position: usize, insn: Instruction<InsnId>) -> Result<InsnId, Error> {
        if position > self.len() {
            return Err(self.out_of_range(position));
        }
        self.validate(&insn)?;

        let id = self.ids.fresh();
        self.register_labels(id, &insn);
        self.inbound.insert(id, InboundRefs::new());
        let offset = self.nodes.insert(position, Node { id, insn });
        self.reindex_from(position);

        log::trace!("inserted {:?} at position {} ({})", id, position, offset);
        Ok(id)
    }

    /// Add an instruction to the end
    pub fn push(&mut self, insn: Instruction<InsnId>) -> Result<InsnId, Error> {
        self.insert(self.len(), insn)
    }

    /// Swap out the instruction at `position`, returning the old one
    ///
    /// The new instruction takes over the handle of the old one, so everything that pointed at
    /// the old instruction now points at the new one. Offsets after it shift by the difference
    /// in widths.
    pub fn replace(
        &mut self,
        position: usize,
        insn: Instruction<InsnId>,
    ) -> Result<Instruction<InsnId>, Error> {
        let id = self.id_at(position)?;
        self.validate(&insn)?;

        self.register_labels(id, &insn);
        let old = self.nodes.replace(position, Node { id, insn });
        self.unregister_labels(id, &old.insn);

        log::trace!("replaced {:?} at position {}: {}", id, position, old.insn);
        Ok(old.insn)
    }

    /// Unlink the instruction at `position`
    ///
    /// The instruction is removed and every instruction after it moves back by its width, even
    /// if something still pointed at it. In that case, the removed instruction comes back in
    /// [`Error::InstructionStillReferenced`] along with the holders that now dangle: these must be
    /// [retargeted](InstructionSequence::retarget) before the sequence can be encoded.
    pub fn remove(&mut self, position: usize) -> Result<Instruction<InsnId>, Error> {
        if position >= self.len() {
            return Err(self.out_of_range(position));
        }

        let (offset, removed) = self.nodes.remove(position);
        self.positions.remove(&removed.id);
        self.reindex_from(position);

        // Jumps from the instruction to itself don't count
        self.unregister_labels(removed.id, &removed.insn);
        let holders = match self.inbound.remove(&removed.id) {
            Some(refs) if !refs.is_empty() => {
                let holders = refs.holders();
                self.dangling.insert(removed.id, refs);
                holders
            }
            _ => vec![],
        };

        if holders.is_empty() {
            log::trace!("removed {:?} from {}", removed.id, offset);
            Ok(removed.insn)
        } else {
            log::warn!(
                "removed {:?} ({}) from {}, but it is still referenced by {:?}",
                removed.id,
                removed.insn,
                offset,
                holders
            );
            Err(Error::InstructionStillReferenced {
                removed: removed.insn,
                holders,
            })
        }
    }

    /// Record that something outside the sequence points at an instruction
    pub fn register_external(&mut self, holder: HolderId, target: InsnId) -> Result<(), Error> {
        self.holders_mut(target)?
            .register(InsnHolder::External(holder));
        Ok(())
    }

    /// Undo one [`InstructionSequence::register_external`]
    ///
    /// `target` may already have been removed, as long as the registration was not retargeted.
    pub fn unregister_external(&mut self, holder: HolderId, target: InsnId) -> Result<(), Error> {
        if self.registrations(target).is_none() {
            return Err(Error::Index(IndexError::UnknownInstruction(target)));
        }
        let holder = InsnHolder::External(holder);
        if self.release(target, holder) {
            Ok(())
        } else {
            Err(Error::Index(IndexError::UnregisteredInstructionHolder {
                target,
                holder,
            }))
        }
    }

    /// Make a holder point at `to` instead of `from`
    ///
    /// `holder` must be registered on `from`. For a jump or switch in the sequence, every one of
    /// its targets equal to `from` is rewritten. `from` may be an instruction that was already
    /// removed (that is how dangling references reported by [`InstructionSequence::remove`] get
    /// fixed). Nothing changes if the call fails.
    pub fn retarget(&mut self, holder: InsnHolder, from: InsnId, to: InsnId) -> Result<(), Error> {
        self.position_of(to)?;
        let registered = match self.registrations(from) {
            Some(holders) => holders.contains(holder),
            None => false,
        };
        if !registered {
            return Err(Error::Index(IndexError::UnregisteredInstructionHolder {
                target: from,
                holder,
            }));
        }

        let count = match holder {
            InsnHolder::Instruction(id) => {
                let position = self.position_of(id)?;
                let node = match self.nodes.get_index_mut(position) {
                    Some((_, node)) => node,
                    None => return Err(Error::Index(IndexError::UnknownInstruction(id))),
                };
                let mut count = 0;
                for label in node.insn.labels_mut() {
                    if *label == from {
                        *label = to;
                        count += 1;
                    }
                }
                count
            }
            InsnHolder::External(_) => 1,
        };

        for _ in 0..count {
            self.release(from, holder);
            self.holders_mut(to)?.register(holder);
        }
        log::trace!("retargeted {:?} from {:?} to {:?}", holder, from, to);
        Ok(())
    }
}

impl Default for InstructionSequence {
    fn default() -> Self {
        InstructionSequence::new()
    }
}

impl fmt::Debug for InstructionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for (offset, id, insn) in self.iter() {
            list.entry(&format_args!("{} {:?}: {}", offset, id, insn));
        }
        list.finish()
    }
}
