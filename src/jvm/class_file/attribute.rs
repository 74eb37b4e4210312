use super::ConstantIndex;
use crate::jvm::binary_format::{read_bytes, Deserialize, Serialize};
use crate::jvm::code::{InsnHolder, InsnId, InstructionSequence};
use crate::jvm::{Error, FormatError, IndexError};
use crate::util::{HolderId, HolderIdGenerator, Offset};
use byteorder::{ReadBytesExt, WriteBytesExt};

/// Attributes (used in classes, fields, methods, and even on some attributes)
///
/// Nested attributes of a `Code` body are carried through as opaque bytes.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name_index: ConstantIndex,
    pub info: Vec<u8>,
}

impl Serialize for Attribute {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name_index.serialize(writer)?;

        // Attribute info length is 4 bytes
        (self.info.len() as u32).serialize(writer)?;
        writer.write_all(&self.info)?;

        Ok(())
    }
}

impl Deserialize for Attribute {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        let name_index = ConstantIndex::deserialize(reader)?;
        let len = u32::deserialize(reader)?;
        let info = read_bytes(reader, len as usize)?;
        Ok(Attribute { name_index, info })
    }
}

/// Entry in the exception table of a method body
///
/// The range and handler point at instructions rather than offsets, so they follow the
/// instructions through edits. Each entry is registered as an external holder on the
/// instructions it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Start of exception handler range (inclusive)
    pub start: InsnId,

    /// End of exception handler range (exclusive), or `None` for the end of the code
    pub end: Option<InsnId>,

    /// Start of the exception handler
    pub handler: InsnId,

    /// Class of exception caught (`ConstantIndex::NONE` catches everything)
    pub catch_type: ConstantIndex,

    holder: HolderId,
}

impl ExceptionHandler {
    /// Identity under which the entry is registered on its instructions
    pub fn holder(&self) -> HolderId {
        self.holder
    }

    fn targets(&self) -> impl Iterator<Item = InsnId> {
        std::iter::once(self.start)
            .chain(self.end)
            .chain(std::iter::once(self.handler))
    }
}

/// Body of a `Code` attribute
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
#[derive(Debug)]
pub struct MethodCode {
    pub max_stack: u16,
    pub max_locals: u16,
    pub instructions: InstructionSequence,
    exception_table: Vec<ExceptionHandler>,
    pub attributes: Vec<Attribute>,
    holder_ids: HolderIdGenerator,
}

impl MethodCode {
    pub fn new(max_stack: u16, max_locals: u16, instructions: InstructionSequence) -> MethodCode {
        MethodCode {
            max_stack,
            max_locals,
            instructions,
            exception_table: vec![],
            attributes: vec![],
            holder_ids: HolderIdGenerator::new(),
        }
    }

    pub fn exception_table(&self) -> &[ExceptionHandler] {
        &self.exception_table
    }

    /// Add an entry at the end of the exception table (lower entries have lower priority)
    pub fn add_exception_handler(
        &mut self,
        start: InsnId,
        end: Option<InsnId>,
        handler: InsnId,
        catch_type: ConstantIndex,
    ) -> Result<HolderId, Error> {
        let entry = ExceptionHandler {
            start,
            end,
            handler,
            catch_type,
            holder: self.holder_ids.fresh(),
        };
        for target in entry.targets() {
            self.instructions.position_of(target)?;
        }
        for target in entry.targets() {
            self.instructions.register_external(entry.holder, target)?;
        }
        let holder = entry.holder;
        self.exception_table.push(entry);
        Ok(holder)
    }

    /// Take an entry out of the exception table, releasing its instructions
    pub fn remove_exception_handler(&mut self, holder: HolderId) -> Result<ExceptionHandler, Error> {
        let position = self
            .exception_table
            .iter()
            .position(|entry| entry.holder == holder)
            .ok_or(Error::Index(IndexError::UnknownExceptionHandler(holder)))?;
        let entry = self.exception_table.remove(position);
        for target in entry.targets() {
            self.instructions.unregister_external(holder, target)?;
        }
        Ok(entry)
    }

    /// Make a holder point at `to` instead of `from`
    ///
    /// Exception table entries are updated along with their registrations, so this is the way to
    /// fix up entries reported by a failed instruction removal. The entry is left untouched if
    /// the call fails.
    pub fn retarget(&mut self, holder: InsnHolder, from: InsnId, to: InsnId) -> Result<(), Error> {
        let holder_id = match holder {
            InsnHolder::Instruction(_) => return self.instructions.retarget(holder, from, to),
            InsnHolder::External(holder_id) => holder_id,
        };
        let position = self
            .exception_table
            .iter()
            .position(|entry| entry.holder == holder_id)
            .ok_or(Error::Index(IndexError::UnknownExceptionHandler(holder_id)))?;

        let count = self.exception_table[position]
            .targets()
            .filter(|target| *target == from)
            .count();
        if count == 0 {
            return Err(Error::Index(IndexError::UnregisteredInstructionHolder {
                target: from,
                holder,
            }));
        }
        self.instructions.position_of(to)?;
        for _ in 0..count {
            self.instructions.retarget(holder, from, to)?;
        }

        let entry = &mut self.exception_table[position];
        for target in [&mut entry.start, &mut entry.handler] {
            if *target == from {
                *target = to;
            }
        }
        if entry.end == Some(from) {
            entry.end = Some(to);
        }
        Ok(())
    }

    /// Constant pool indices used by the body (instruction operands, catch types, attribute names)
    pub fn constant_references(&self) -> Vec<ConstantIndex> {
        let mut references: Vec<ConstantIndex> = self
            .instructions
            .iter()
            .flat_map(|(_, _, insn)| insn.constant_references())
            .collect();
        references.extend(
            self.exception_table
                .iter()
                .map(|entry| entry.catch_type)
                .filter(|catch_type| *catch_type != ConstantIndex::NONE),
        );
        references.extend(self.attributes.iter().map(|attribute| attribute.name_index));
        references
    }

    /// Read the body of a `Code` attribute (everything after the attribute length)
    pub fn read<R: ReadBytesExt>(reader: &mut R) -> Result<MethodCode, Error> {
        let max_stack = u16::deserialize(reader)?;
        let max_locals = u16::deserialize(reader)?;

        let code_length = u32::deserialize(reader)?;
        if code_length == 0 || code_length > u16::MAX as u32 {
            return Err(Error::Format(FormatError::InvalidCodeLength(code_length)));
        }
        let code = read_bytes(reader, code_length as usize)?;
        let instructions = InstructionSequence::decode(&code)?;
        let mut method_code = MethodCode::new(max_stack, max_locals, instructions);

        let exception_count = u16::deserialize(reader)?;
        for _ in 0..exception_count {
            let start_pc = u16::deserialize(reader)?;
            let end_pc = u16::deserialize(reader)?;
            let handler_pc = u16::deserialize(reader)?;
            let catch_type = ConstantIndex::deserialize(reader)?;

            let start = method_code.instruction_at_pc(start_pc)?;
            let end = if end_pc as u32 == code_length {
                None
            } else {
                Some(method_code.instruction_at_pc(end_pc)?)
            };
            let handler = method_code.instruction_at_pc(handler_pc)?;
            method_code.add_exception_handler(start, end, handler, catch_type)?;
        }

        method_code.attributes = Vec::<Attribute>::deserialize(reader)?;

        log::debug!(
            "read code body: {} bytes of code, {} exception handlers, {} attributes",
            code_length,
            exception_count,
            method_code.attributes.len()
        );
        Ok(method_code)
    }

    fn instruction_at_pc(&self, pc: u16) -> Result<InsnId, Error> {
        match self.instructions.position_at_offset(Offset(pc as usize)) {
            Some(position) => self.instructions.id_at(position),
            None => Err(Error::Format(FormatError::InvalidExceptionPc(pc))),
        }
    }

    /// Write the body of a `Code` attribute
    ///
    /// Exception table pcs are recomputed from the current instruction offsets.
    pub fn write<W: WriteBytesExt>(&self, writer: &mut W) -> Result<(), Error> {
        let code = self.instructions.encode()?;
        if code.is_empty() || code.len() > u16::MAX as usize {
            return Err(Error::Format(FormatError::InvalidCodeLength(code.len() as u32)));
        }

        self.max_stack.serialize(writer)?;
        self.max_locals.serialize(writer)?;
        (code.len() as u32).serialize(writer)?;
        writer.write_all(&code)?;

        (self.exception_table.len() as u16).serialize(writer)?;
        for entry in &self.exception_table {
            let start_pc = self.pc_of(entry.start)?;
            let end_pc = match entry.end {
                Some(end) => self.pc_of(end)?,
                None => code.len() as u16,
            };
            let handler_pc = self.pc_of(entry.handler)?;
            start_pc.serialize(writer)?;
            end_pc.serialize(writer)?;
            handler_pc.serialize(writer)?;
            entry.catch_type.serialize(writer)?;
        }

        self.attributes.serialize(writer)?;
        Ok(())
    }

    fn pc_of(&self, id: InsnId) -> Result<u16, Error> {
        Ok(self.instructions.offset_of(id)?.0 as u16)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::code::{Instruction, Opcode};

    /// `try { iconst_1; istore_0 } catch (any) { astore_1 }`, with the `try` jumping over to the `astore_1`
    fn body_with_handler() -> Vec<u8> {
        let mut bytes = vec![];
        bytes.extend_from_slice(&[0x00, 0x02, 0x00, 0x02]);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x06]);
        bytes.extend_from_slice(&[0x04, 0x3b, 0xa7, 0x00, 0x03, 0x4c]);
        bytes.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x05, 0x00, 0x00]);
        bytes.extend_from_slice(&[0x00, 0x01, 0x00, 0x09, 0x00, 0x00, 0x00, 0x02, 0xca, 0xfe]);
        bytes
    }

    #[test]
    fn read_and_write_body() {
        let bytes = body_with_handler();
        let code = MethodCode::read(&mut bytes.as_slice()).unwrap();
        assert_eq!(code.max_stack, 2);
        assert_eq!(code.max_locals, 2);
        assert_eq!(code.instructions.len(), 4);
        assert_eq!(code.exception_table().len(), 1);
        assert_eq!(
            code.attributes,
            vec![Attribute {
                name_index: ConstantIndex(9),
                info: vec![0xca, 0xfe]
            }]
        );

        let entry = &code.exception_table()[0];
        assert_eq!(entry.start, code.instructions.id_at(0).unwrap());
        assert_eq!(entry.end, Some(code.instructions.id_at(2).unwrap()));
        assert_eq!(entry.handler, code.instructions.id_at(3).unwrap());
        assert_eq!(
            code.instructions.holders(entry.start).unwrap(),
            vec![InsnHolder::External(entry.holder())]
        );

        let mut written = vec![];
        code.write(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn edits_move_exception_pcs() {
        let bytes = body_with_handler();
        let mut code = MethodCode::read(&mut bytes.as_slice()).unwrap();
        code.instructions
            .insert(0, Instruction::NoOperand(Opcode::NOP))
            .unwrap();

        let mut written = vec![];
        code.write(&mut written).unwrap();
        assert_eq!(&written[4..8], &[0x00, 0x00, 0x00, 0x07]);
        assert_eq!(&written[8..15], &[0x00, 0x04, 0x3b, 0xa7, 0x00, 0x03, 0x4c]);
        assert_eq!(
            &written[15..25],
            &[0x00, 0x01, 0x00, 0x01, 0x00, 0x03, 0x00, 0x06, 0x00, 0x00]
        );
    }

    #[test]
    fn range_up_to_end_of_code() {
        let bytes = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0xb1, 0x00, 0x01, 0x00, 0x00,
            0x00, 0x02, 0x00, 0x01, 0x00, 0x03, 0x00, 0x00,
        ];
        let code = MethodCode::read(&mut &bytes[..]).unwrap();
        assert_eq!(code.exception_table()[0].end, None);
        assert_eq!(code.exception_table()[0].catch_type, ConstantIndex(3));
        assert_eq!(code.constant_references(), vec![ConstantIndex(3)]);

        let mut written = vec![];
        code.write(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn exception_pc_inside_instruction() {
        let mut bytes = body_with_handler();
        // end_pc = 4, in the middle of the goto
        bytes[19] = 0x04;
        assert!(matches!(
            MethodCode::read(&mut bytes.as_slice()),
            Err(Error::Format(FormatError::InvalidExceptionPc(4)))
        ));
    }

    #[test]
    fn code_length_out_of_range() {
        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            MethodCode::read(&mut &bytes[..]),
            Err(Error::Format(FormatError::InvalidCodeLength(0)))
        ));

        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00];
        assert!(matches!(
            MethodCode::read(&mut &bytes[..]),
            Err(Error::Format(FormatError::InvalidCodeLength(65536)))
        ));

        let bytes = [0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0xb1];
        assert!(matches!(
            MethodCode::read(&mut &bytes[..]),
            Err(Error::Format(FormatError::Truncated))
        ));
    }

    #[test]
    fn attribute_length_past_end_of_input() {
        let bytes = [0x00, 0x09, 0xff, 0xff, 0xff, 0xff, 0xca, 0xfe];
        assert!(matches!(
            Attribute::deserialize(&mut &bytes[..]),
            Err(Error::Format(FormatError::Truncated))
        ));
    }

    #[test]
    fn failed_retarget_leaves_entry_alone() {
        let bytes = body_with_handler();
        let mut code = MethodCode::read(&mut bytes.as_slice()).unwrap();
        let entry = code.exception_table()[0].clone();
        let holder = InsnHolder::External(entry.holder());

        let stale = code
            .instructions
            .push(Instruction::NoOperand(Opcode::NOP))
            .unwrap();
        code.instructions.remove(4).unwrap();

        assert!(matches!(
            code.retarget(holder, entry.start, stale),
            Err(Error::Index(IndexError::UnknownInstruction(id))) if id == stale
        ));
        assert_eq!(code.exception_table()[0], entry);
        assert_eq!(code.instructions.holders(entry.start).unwrap(), vec![holder]);

        // Not a target of the entry
        let store = code.instructions.id_at(1).unwrap();
        assert!(matches!(
            code.retarget(holder, store, entry.start),
            Err(Error::Index(IndexError::UnregisteredInstructionHolder { .. }))
        ));
        assert_eq!(code.exception_table()[0], entry);

        let mut written = vec![];
        code.write(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn retarget_exception_handler_after_removal() {
        let bytes = body_with_handler();
        let mut code = MethodCode::read(&mut bytes.as_slice()).unwrap();
        let holder = code.exception_table()[0].holder();
        let handler = code.exception_table()[0].handler;
        let goto = code.instructions.id_at(2).unwrap();

        // The handler `astore_1` is also the goto target
        let holders = match code.instructions.remove(3) {
            Err(Error::InstructionStillReferenced { holders, .. }) => holders,
            other => panic!("expected dangling references, got {:?}", other),
        };
        assert_eq!(
            holders,
            vec![InsnHolder::Instruction(goto), InsnHolder::External(holder)]
        );

        let ret = code
            .instructions
            .push(Instruction::NoOperand(Opcode::RETURN))
            .unwrap();
        for holder in holders {
            code.retarget(holder, handler, ret).unwrap();
        }
        assert_eq!(code.exception_table()[0].handler, ret);

        let mut written = vec![];
        code.write(&mut written).unwrap();
        assert_eq!(&written[8..14], &[0x04, 0x3b, 0xa7, 0x00, 0x03, 0xb1]);
        assert_eq!(
            &written[14..24],
            &[0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x05, 0x00, 0x00]
        );
    }

    #[test]
    fn add_and_remove_handlers() {
        let mut code = MethodCode::new(
            0,
            0,
            InstructionSequence::decode(&[0x00, 0x00, 0xb1]).unwrap(),
        );
        let first = code.instructions.id_at(0).unwrap();
        let last = code.instructions.id_at(2).unwrap();

        let holder = code
            .add_exception_handler(first, Some(last), last, ConstantIndex::NONE)
            .unwrap();
        assert_eq!(
            code.instructions.holders(last).unwrap(),
            vec![InsnHolder::External(holder)]
        );
        assert!(code.instructions.remove(2).is_err());

        let removed = code.remove_exception_handler(holder).unwrap();
        assert_eq!(removed.start, first);
        assert!(code.instructions.holders(first).unwrap().is_empty());
        assert!(matches!(
            code.remove_exception_handler(holder),
            Err(Error::Index(IndexError::UnknownExceptionHandler(_)))
        ));
    }
}
