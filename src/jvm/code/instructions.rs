use super::{Category, Opcode};
use crate::jvm::binary_format::{Deserialize, Serialize};
use crate::jvm::class_file::ConstantIndex;
use crate::jvm::{Error, FormatError};
use crate::util::{Offset, Width};
use byteorder::WriteBytesExt;
use std::convert::Infallible;
use std::fmt;

/// JVM bytecode instruction
///
/// Instructions are grouped by addressing mode: the variant fixes how operands are encoded, and
/// the [`Opcode`] inside the variant (when there is more than one opcode with that addressing
/// mode) says which instruction it is.
///
/// Jump targets are left abstract in `L`. Inside an
/// [`InstructionSequence`](super::InstructionSequence), targets are [`InsnId`](super::InsnId)s
/// so that they survive edits. On the wire (and from [`decode_one`]) targets are absolute
/// [`Offset`]s.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Instruction<L> {
    NoOperand(Opcode),

    /// Unsigned byte operand: local variable index, `ldc` constant index, `newarray` type
    ByteOperand(Opcode, u8),

    /// `bipush`
    BytePush(i8),

    /// `sipush`
    ShortPush(i16),

    /// Field, method, class and `ldc_w`/`ldc2_w` constant instructions
    ConstantRef(Opcode, ConstantIndex),
    IInc {
        index: u8,
        delta: i8,
    },
    MultiANewArray {
        class: ConstantIndex,
        dimensions: u8,
    },
    InvokeInterface {
        method: ConstantIndex,
        count: u8,
    },
    InvokeDynamic(ConstantIndex),

    /// Jump with a 16-bit relative offset
    Branch(Opcode, L),

    /// `goto_w` or `jsr_w`
    WideBranch(Opcode, L),
    TableSwitch {
        default: L,
        low: i32,
        targets: Vec<L>,
    },
    LookupSwitch {
        default: L,
        pairs: Vec<(i32, L)>,
    },

    /// `wide` prefixed load, store or `ret`
    WideLocal(Opcode, u16),

    /// `wide` prefixed `iinc`
    WideIInc {
        index: u16,
        delta: i16,
    },
}

/// Number of padding bytes after a switch opcode at `offset`
///
/// The operands of `tableswitch` and `lookupswitch` start at the next multiple of 4.
pub fn switch_padding(offset: Offset) -> usize {
    (4 - (offset.0 + 1) % 4) % 4
}

impl<L> Instruction<L> {
    /// Opcode of the instruction (for `wide` instructions, the opcode being widened)
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::NoOperand(opcode)
            | Instruction::ByteOperand(opcode, _)
            | Instruction::ConstantRef(opcode, _)
            | Instruction::Branch(opcode, _)
            | Instruction::WideBranch(opcode, _)
            | Instruction::WideLocal(opcode, _) => *opcode,
            Instruction::BytePush(_) => Opcode::BIPUSH,
            Instruction::ShortPush(_) => Opcode::SIPUSH,
            Instruction::IInc { .. } | Instruction::WideIInc { .. } => Opcode::IINC,
            Instruction::MultiANewArray { .. } => Opcode::MULTIANEWARRAY,
            Instruction::InvokeInterface { .. } => Opcode::INVOKEINTERFACE,
            Instruction::InvokeDynamic(_) => Opcode::INVOKEDYNAMIC,
            Instruction::TableSwitch { .. } => Opcode::TABLESWITCH,
            Instruction::LookupSwitch { .. } => Opcode::LOOKUPSWITCH,
        }
    }

    /// Check that the opcode belongs to the addressing mode of the variant
    pub fn check(&self) -> Result<(), Error> {
        let (opcode, expected) = match self {
            Instruction::NoOperand(opcode) => (*opcode, Category::NoOperand),
            Instruction::ByteOperand(opcode, _) => (*opcode, Category::ByteOperand),
            Instruction::ConstantRef(opcode, _) => (*opcode, Category::ConstantRef),
            Instruction::Branch(opcode, _) => (*opcode, Category::Branch),
            Instruction::WideBranch(opcode, _) => (*opcode, Category::WideBranch),
            Instruction::WideLocal(opcode, _) => {
                if opcode.is_widenable() && *opcode != Opcode::IINC {
                    return Ok(());
                }
                return Err(Error::InvalidInstruction {
                    opcode: *opcode,
                    expected: Category::Wide,
                });
            }
            Instruction::TableSwitch { low, targets, .. } => {
                let high = *low as i64 + targets.len() as i64 - 1;
                if targets.is_empty() || high > i32::MAX as i64 {
                    return Err(Error::InvalidInstruction {
                        opcode: Opcode::TABLESWITCH,
                        expected: Category::TableSwitch,
                    });
                }
                return Ok(());
            }
            _ => return Ok(()),
        };
        if opcode.category() == Some(expected) {
            Ok(())
        } else {
            Err(Error::InvalidInstruction { opcode, expected })
        }
    }

    /// Jump targets, in encoding order (default first for switches)
    pub fn labels(&self) -> Vec<&L> {
        match self {
            Instruction::Branch(_, label) | Instruction::WideBranch(_, label) => vec![label],
            Instruction::TableSwitch {
                default, targets, ..
            } => std::iter::once(default).chain(targets.iter()).collect(),
            Instruction::LookupSwitch { default, pairs } => std::iter::once(default)
                .chain(pairs.iter().map(|(_, label)| label))
                .collect(),
            _ => vec![],
        }
    }

    /// Mutable jump targets, in the same order as [`Instruction::labels`]
    pub fn labels_mut(&mut self) -> Vec<&mut L> {
        match self {
            Instruction::Branch(_, label) | Instruction::WideBranch(_, label) => vec![label],
            Instruction::TableSwitch {
                default, targets, ..
            } => std::iter::once(default).chain(targets.iter_mut()).collect(),
            Instruction::LookupSwitch { default, pairs } => std::iter::once(default)
                .chain(pairs.iter_mut().map(|(_, label)| label))
                .collect(),
            _ => vec![],
        }
    }

    /// Constant pool indices used as operands
    pub fn constant_references(&self) -> Vec<ConstantIndex> {
        match self {
            Instruction::ByteOperand(Opcode::LDC, index) => vec![ConstantIndex(*index as u16)],
            Instruction::ConstantRef(_, index)
            | Instruction::MultiANewArray { class: index, .. }
            | Instruction::InvokeInterface { method: index, .. }
            | Instruction::InvokeDynamic(index) => vec![*index],
            _ => vec![],
        }
    }

    /// Rewrite the jump targets, stopping at the first failure
    pub fn try_map_labels<M, E>(
        &self,
        mut map: impl FnMut(&L) -> Result<M, E>,
    ) -> Result<Instruction<M>, E> {
        Ok(match self {
            Instruction::NoOperand(opcode) => Instruction::NoOperand(*opcode),
            Instruction::ByteOperand(opcode, operand) => Instruction::ByteOperand(*opcode, *operand),
            Instruction::BytePush(value) => Instruction::BytePush(*value),
            Instruction::ShortPush(value) => Instruction::ShortPush(*value),
            Instruction::ConstantRef(opcode, index) => Instruction::ConstantRef(*opcode, *index),
            Instruction::IInc { index, delta } => Instruction::IInc {
                index: *index,
                delta: *delta,
            },
            Instruction::MultiANewArray { class, dimensions } => Instruction::MultiANewArray {
                class: *class,
                dimensions: *dimensions,
            },
            Instruction::InvokeInterface { method, count } => Instruction::InvokeInterface {
                method: *method,
                count: *count,
            },
            Instruction::InvokeDynamic(index) => Instruction::InvokeDynamic(*index),
            Instruction::Branch(opcode, label) => Instruction::Branch(*opcode, map(label)?),
            Instruction::WideBranch(opcode, label) => Instruction::WideBranch(*opcode, map(label)?),
            Instruction::TableSwitch {
                default,
                low,
                targets,
            } => Instruction::TableSwitch {
                default: map(default)?,
                low: *low,
                targets: targets.iter().map(&mut map).collect::<Result<_, E>>()?,
            },
            Instruction::LookupSwitch { default, pairs } => Instruction::LookupSwitch {
                default: map(default)?,
                pairs: pairs
                    .iter()
                    .map(|(key, label)| Ok((*key, map(label)?)))
                    .collect::<Result<_, E>>()?,
            },
            Instruction::WideLocal(opcode, index) => Instruction::WideLocal(*opcode, *index),
            Instruction::WideIInc { index, delta } => Instruction::WideIInc {
                index: *index,
                delta: *delta,
            },
        })
    }

    /// Rewrite the jump targets
    pub fn map_labels<M>(&self, mut map: impl FnMut(&L) -> M) -> Instruction<M> {
        match self.try_map_labels(|label| Ok::<M, Infallible>(map(label))) {
            Ok(mapped) => mapped,
            Err(never) => match never {},
        }
    }
}

/// Encoded length of the instruction, which depends on the offset only for switches
impl<L> Width for Instruction<L> {
    fn width(&self, offset: Offset) -> usize {
        match self {
            Instruction::NoOperand(_) => 1,
            Instruction::ByteOperand(_, _) | Instruction::BytePush(_) => 2,
            Instruction::ShortPush(_)
            | Instruction::ConstantRef(_, _)
            | Instruction::IInc { .. }
            | Instruction::Branch(_, _) => 3,
            Instruction::MultiANewArray { .. } | Instruction::WideLocal(_, _) => 4,
            Instruction::InvokeInterface { .. }
            | Instruction::InvokeDynamic(_)
            | Instruction::WideBranch(_, _) => 5,
            Instruction::WideIInc { .. } => 6,
            Instruction::TableSwitch { targets, .. } => {
                1 + switch_padding(offset) + 12 + 4 * targets.len()
            }
            Instruction::LookupSwitch { pairs, .. } => {
                1 + switch_padding(offset) + 8 + 8 * pairs.len()
            }
        }
    }
}

/// Decode one instruction starting at `bytes[cursor]`, which is at `offset` in the method code
///
/// Jump targets are resolved to absolute offsets, but not checked against instruction
/// boundaries (only the whole sequence can do that). Returns the instruction and how many bytes
/// it took up.
pub fn decode_one(
    bytes: &[u8],
    cursor: usize,
    offset: Offset,
) -> Result<(Instruction<Offset>, usize), Error> {
    let input = bytes.get(cursor..).ok_or(FormatError::Truncated)?;
    let reader = &mut &input[..];

    let opcode_byte = u8::deserialize(reader)?;
    let opcode = Opcode(opcode_byte);
    let category = match opcode.category() {
        Some(category) => category,
        None => {
            return Err(Error::UnknownOpcode {
                opcode: opcode_byte,
                offset,
            })
        }
    };

    let target = |relative: i32| -> Result<Offset, Error> {
        let target = offset.0 as isize + relative as isize;
        if target < 0 {
            Err(Error::Format(FormatError::InvalidBranchTarget { offset, target }))
        } else {
            Ok(Offset(target as usize))
        }
    };

    let insn = match category {
        Category::NoOperand => Instruction::NoOperand(opcode),
        Category::ByteOperand => Instruction::ByteOperand(opcode, u8::deserialize(reader)?),
        Category::BytePush => Instruction::BytePush(i8::deserialize(reader)?),
        Category::ShortPush => Instruction::ShortPush(i16::deserialize(reader)?),
        Category::ConstantRef => {
            Instruction::ConstantRef(opcode, ConstantIndex::deserialize(reader)?)
        }
        Category::IInc => Instruction::IInc {
            index: u8::deserialize(reader)?,
            delta: i8::deserialize(reader)?,
        },
        Category::MultiANewArray => Instruction::MultiANewArray {
            class: ConstantIndex::deserialize(reader)?,
            dimensions: u8::deserialize(reader)?,
        },
        Category::InvokeInterface => {
            let method = ConstantIndex::deserialize(reader)?;
            let count = u8::deserialize(reader)?;
            if u8::deserialize(reader)? != 0 {
                return Err(Error::Format(FormatError::NonZeroPadding { opcode, offset }));
            }
            Instruction::InvokeInterface { method, count }
        }
        Category::InvokeDynamic => {
            let index = ConstantIndex::deserialize(reader)?;
            if u16::deserialize(reader)? != 0 {
                return Err(Error::Format(FormatError::NonZeroPadding { opcode, offset }));
            }
            Instruction::InvokeDynamic(index)
        }
        Category::Branch => {
            Instruction::Branch(opcode, target(i16::deserialize(reader)? as i32)?)
        }
        Category::WideBranch => Instruction::WideBranch(opcode, target(i32::deserialize(reader)?)?),
        Category::TableSwitch => {
            skip_padding(reader, opcode, offset)?;
            let default = target(i32::deserialize(reader)?)?;
            let low = i32::deserialize(reader)?;
            let high = i32::deserialize(reader)?;
            if high < low {
                return Err(Error::Format(FormatError::InvalidSwitchRange {
                    offset,
                    low,
                    high,
                }));
            }
            let count = high as i64 - low as i64 + 1;
            let mut targets = vec![];
            for _ in 0..count {
                targets.push(target(i32::deserialize(reader)?)?);
            }
            Instruction::TableSwitch {
                default,
                low,
                targets,
            }
        }
        Category::LookupSwitch => {
            skip_padding(reader, opcode, offset)?;
            let default = target(i32::deserialize(reader)?)?;
            let npairs = i32::deserialize(reader)?;
            if npairs < 0 {
                return Err(Error::Format(FormatError::NegativePairCount { offset, npairs }));
            }
            let mut pairs = vec![];
            for _ in 0..npairs {
                let key = i32::deserialize(reader)?;
                pairs.push((key, target(i32::deserialize(reader)?)?));
            }
            Instruction::LookupSwitch { default, pairs }
        }
        Category::Wide => {
            let widened_byte = u8::deserialize(reader)?;
            let widened = Opcode(widened_byte);
            if !widened.is_widenable() {
                return Err(Error::Format(FormatError::InvalidWideOpcode {
                    offset,
                    opcode: widened_byte,
                }));
            }
            if widened == Opcode::IINC {
                Instruction::WideIInc {
                    index: u16::deserialize(reader)?,
                    delta: i16::deserialize(reader)?,
                }
            } else {
                Instruction::WideLocal(widened, u16::deserialize(reader)?)
            }
        }
    };

    let consumed = input.len() - reader.len();
    log::trace!("decoded {} at offset {} ({} bytes)", insn, offset.0, consumed);
    Ok((insn, consumed))
}

fn skip_padding(reader: &mut &[u8], opcode: Opcode, offset: Offset) -> Result<(), Error> {
    for _ in 0..switch_padding(offset) {
        if u8::deserialize(reader)? != 0 {
            return Err(Error::Format(FormatError::NonZeroPadding { opcode, offset }));
        }
    }
    Ok(())
}

/// Encode one instruction located at `offset` in the method code
pub fn encode_one(insn: &Instruction<Offset>, offset: Offset) -> Result<Vec<u8>, Error> {
    let mut bytes = Vec::with_capacity(insn.width(offset));
    insn.encode(offset, &mut bytes)?;
    Ok(bytes)
}

impl Instruction<Offset> {
    /// Write the instruction, assuming it is at `offset` in the method code
    ///
    /// Switch padding is always recomputed from `offset` and written as zeroes.
    pub fn encode<W: WriteBytesExt>(&self, offset: Offset, writer: &mut W) -> Result<(), Error> {
        self.check()?;

        let relative = |target: &Offset| -> Result<i32, Error> {
            i32::try_from(*target - offset).map_err(|_| Error::BranchOverflow {
                at: offset,
                target: *target,
            })
        };

        match self {
            Instruction::WideLocal(_, _) | Instruction::WideIInc { .. } => {
                Opcode::WIDE.0.serialize(writer)?
            }
            _ => (),
        }
        self.opcode().0.serialize(writer)?;

        match self {
            Instruction::NoOperand(_) => (),
            Instruction::ByteOperand(_, operand) => operand.serialize(writer)?,
            Instruction::BytePush(value) => value.serialize(writer)?,
            Instruction::ShortPush(value) => value.serialize(writer)?,
            Instruction::ConstantRef(_, index) => index.serialize(writer)?,
            Instruction::IInc { index, delta } => {
                index.serialize(writer)?;
                delta.serialize(writer)?;
            }
            Instruction::MultiANewArray { class, dimensions } => {
                class.serialize(writer)?;
                dimensions.serialize(writer)?;
            }
            Instruction::InvokeInterface { method, count } => {
                method.serialize(writer)?;
                count.serialize(writer)?;
                0u8.serialize(writer)?;
            }
            Instruction::InvokeDynamic(index) => {
                index.serialize(writer)?;
                0u16.serialize(writer)?;
            }
            Instruction::Branch(_, target) => {
                let short = i16::try_from(relative(target)?).map_err(|_| Error::BranchOverflow {
                    at: offset,
                    target: *target,
                })?;
                short.serialize(writer)?;
            }
            Instruction::WideBranch(_, target) => relative(target)?.serialize(writer)?,
            Instruction::TableSwitch {
                default,
                low,
                targets,
            } => {
                write_padding(writer, offset)?;
                relative(default)?.serialize(writer)?;
                low.serialize(writer)?;
                let high = *low as i64 + targets.len() as i64 - 1;
                (high as i32).serialize(writer)?;
                for target in targets {
                    relative(target)?.serialize(writer)?;
                }
            }
            Instruction::LookupSwitch { default, pairs } => {
                write_padding(writer, offset)?;
                relative(default)?.serialize(writer)?;
                (pairs.len() as i32).serialize(writer)?;
                for (key, target) in pairs {
                    key.serialize(writer)?;
                    relative(target)?.serialize(writer)?;
                }
            }
            Instruction::WideLocal(_, index) => index.serialize(writer)?,
            Instruction::WideIInc { index, delta } => {
                index.serialize(writer)?;
                delta.serialize(writer)?;
            }
        }
        Ok(())
    }
}

fn write_padding<W: WriteBytesExt>(writer: &mut W, offset: Offset) -> std::io::Result<()> {
    for _ in 0..switch_padding(offset) {
        0u8.serialize(writer)?;
    }
    Ok(())
}

impl<L: fmt::Display> fmt::Display for Instruction<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::NoOperand(opcode) => write!(f, "{}", opcode),
            Instruction::ByteOperand(Opcode::LDC, index) => write!(f, "ldc #{}", index),
            Instruction::ByteOperand(opcode, operand) => write!(f, "{} {}", opcode, operand),
            Instruction::BytePush(value) => write!(f, "bipush {}", value),
            Instruction::ShortPush(value) => write!(f, "sipush {}", value),
            Instruction::ConstantRef(opcode, index) => write!(f, "{} {}", opcode, index),
            Instruction::IInc { index, delta } => write!(f, "iinc {} {}", index, delta),
            Instruction::MultiANewArray { class, dimensions } => {
                write!(f, "multianewarray {} {}", class, dimensions)
            }
            Instruction::InvokeInterface { method, count } => {
                write!(f, "invokeinterface {} {}", method, count)
            }
            Instruction::InvokeDynamic(index) => write!(f, "invokedynamic {}", index),
            Instruction::Branch(opcode, target) | Instruction::WideBranch(opcode, target) => {
                write!(f, "{} -> {}", opcode, target)
            }
            Instruction::TableSwitch {
                default,
                low,
                targets,
            } => {
                write!(f, "tableswitch {{")?;
                for (case, target) in targets.iter().enumerate() {
                    write!(f, " {}: {},", *low as i64 + case as i64, target)?;
                }
                write!(f, " default: {} }}", default)
            }
            Instruction::LookupSwitch { default, pairs } => {
                write!(f, "lookupswitch {{")?;
                for (key, target) in pairs {
                    write!(f, " {}: {},", key, target)?;
                }
                write!(f, " default: {} }}", default)
            }
            Instruction::WideLocal(opcode, index) => write!(f, "wide {} {}", opcode, index),
            Instruction::WideIInc { index, delta } => write!(f, "wide iinc {} {}", index, delta),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn decode_all(bytes: &[u8]) -> Vec<(Offset, Instruction<Offset>)> {
        let mut insns = vec![];
        let mut cursor = 0;
        while cursor < bytes.len() {
            let (insn, consumed) = decode_one(bytes, cursor, Offset(cursor)).unwrap();
            assert_eq!(consumed, insn.width(Offset(cursor)));
            insns.push((Offset(cursor), insn));
            cursor += consumed;
        }
        insns
    }

    fn encode_all(insns: &[(Offset, Instruction<Offset>)]) -> Vec<u8> {
        let mut bytes = vec![];
        for (offset, insn) in insns {
            insn.encode(*offset, &mut bytes).unwrap();
        }
        bytes
    }

    #[test]
    fn fixed_width_operands() {
        let bytes = [
            0x10, 0xf9, // bipush -7
            0x11, 0x80, 0x00, // sipush -32768
            0x84, 0x02, 0xff, // iinc 2 -1
            0xb2, 0x00, 0x0c, // getstatic #12
            0xc5, 0x00, 0x03, 0x02, // multianewarray #3 2
            0xb9, 0x00, 0x05, 0x02, 0x00, // invokeinterface #5 2
            0xba, 0x00, 0x06, 0x00, 0x00, // invokedynamic #6
            0xc4, 0x15, 0x01, 0x2c, // wide iload 300
            0xc4, 0x84, 0x01, 0x2c, 0xfc, 0x18, // wide iinc 300 -1000
            0xb1, // return
        ];
        let insns = decode_all(&bytes);
        let decoded: Vec<_> = insns.iter().map(|(_, insn)| insn.clone()).collect();
        assert_eq!(
            decoded,
            vec![
                Instruction::BytePush(-7),
                Instruction::ShortPush(-32768),
                Instruction::IInc {
                    index: 2,
                    delta: -1
                },
                Instruction::ConstantRef(Opcode::GETSTATIC, ConstantIndex(12)),
                Instruction::MultiANewArray {
                    class: ConstantIndex(3),
                    dimensions: 2
                },
                Instruction::InvokeInterface {
                    method: ConstantIndex(5),
                    count: 2
                },
                Instruction::InvokeDynamic(ConstantIndex(6)),
                Instruction::WideLocal(Opcode::ILOAD, 300),
                Instruction::WideIInc {
                    index: 300,
                    delta: -1000
                },
                Instruction::NoOperand(Opcode::RETURN),
            ]
        );
        assert_eq!(encode_all(&insns), bytes);
    }

    #[test]
    fn branch_targets_are_absolute() {
        // nop; goto -1 (back to the nop); goto_w +5 (past itself)
        let bytes = [0x00, 0xa7, 0xff, 0xff, 0xc8, 0x00, 0x00, 0x00, 0x05, 0x00];
        let insns = decode_all(&bytes);
        assert_eq!(insns[1].1, Instruction::Branch(Opcode::GOTO, Offset(0)));
        assert_eq!(insns[2].1, Instruction::WideBranch(Opcode::GOTO_W, Offset(9)));
        assert_eq!(encode_all(&insns), bytes);
    }

    #[test]
    fn branch_before_start_of_code() {
        let bytes = [0xa7, 0xff, 0xfe];
        assert!(matches!(
            decode_one(&bytes, 0, Offset(0)),
            Err(Error::Format(FormatError::InvalidBranchTarget { target: -2, .. }))
        ));
    }

    #[test]
    fn tableswitch_padding() {
        // nop; tableswitch at offset 1 (2 bytes of padding), low 0, high 2
        let mut bytes = vec![0x00, 0xaa, 0x00, 0x00];
        bytes.extend_from_slice(&[0, 0, 0, 27]); // default -> 28
        bytes.extend_from_slice(&[0, 0, 0, 0]); // low
        bytes.extend_from_slice(&[0, 0, 0, 2]); // high
        bytes.extend_from_slice(&[0, 0, 0, 27, 0, 0, 0, 27, 0xff, 0xff, 0xff, 0xff]);
        bytes.push(0xb1);

        let insns = decode_all(&bytes);
        assert_eq!(insns[1].1.width(Offset(1)), 27);
        assert_eq!(
            insns[1].1,
            Instruction::TableSwitch {
                default: Offset(28),
                low: 0,
                targets: vec![Offset(28), Offset(28), Offset(0)],
            }
        );
        assert_eq!(insns[2].0, Offset(28));
        assert_eq!(encode_all(&insns), bytes);

        // The same switch moved to offset 0 needs 3 bytes of padding
        let moved = encode_one(&insns[1].1, Offset(0)).unwrap();
        assert_eq!(moved.len(), 28);
        assert_eq!(&moved[..4], &[0xaa, 0, 0, 0]);
        assert_eq!(&moved[4..8], &[0, 0, 0, 28]);
    }

    #[test]
    fn lookupswitch() {
        // lookupswitch at offset 0 (3 bytes of padding), 2 pairs
        let mut bytes = vec![0xab, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(&[0, 0, 0, 28]); // default
        bytes.extend_from_slice(&[0, 0, 0, 2]); // npairs
        bytes.extend_from_slice(&[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 28]); // -1 -> 28
        bytes.extend_from_slice(&[0, 0, 0, 10, 0, 0, 0, 28]); // 10 -> 28
        bytes.push(0xb1);

        let insns = decode_all(&bytes);
        assert_eq!(
            insns[0].1,
            Instruction::LookupSwitch {
                default: Offset(28),
                pairs: vec![(-1, Offset(28)), (10, Offset(28))],
            }
        );
        assert_eq!(encode_all(&insns), bytes);
    }

    #[test]
    fn malformed_switches() {
        let bytes = [0xaa, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0];
        assert!(matches!(
            decode_one(&bytes, 0, Offset(0)),
            Err(Error::Format(FormatError::InvalidSwitchRange { low: 1, high: 0, .. }))
        ));

        let bytes = [0xab, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(
            decode_one(&bytes, 0, Offset(0)),
            Err(Error::Format(FormatError::NegativePairCount { npairs: -1, .. }))
        ));

        let bytes = [0xab, 0, 1, 0];
        assert!(matches!(
            decode_one(&bytes, 0, Offset(0)),
            Err(Error::Format(FormatError::NonZeroPadding { .. }))
        ));
    }

    #[test]
    fn unknown_and_reserved_opcodes() {
        for byte in [0xcb, 0xfe, 0xff] {
            match decode_one(&[0x00, byte], 1, Offset(1)) {
                Err(Error::UnknownOpcode { opcode, offset }) => {
                    assert_eq!(opcode, byte);
                    assert_eq!(offset, Offset(1));
                }
                other => panic!("expected unknown opcode, got {:?}", other),
            }
        }
        let (breakpoint, _) = decode_one(&[0xca], 0, Offset(0)).unwrap();
        assert_eq!(breakpoint, Instruction::NoOperand(Opcode::BREAKPOINT));
    }

    #[test]
    fn wide_only_before_widenable() {
        assert!(matches!(
            decode_one(&[0xc4, 0x12, 0x00, 0x01], 0, Offset(0)),
            Err(Error::Format(FormatError::InvalidWideOpcode { opcode: 0x12, .. }))
        ));
    }

    #[test]
    fn nonzero_invoke_padding() {
        assert!(matches!(
            decode_one(&[0xb9, 0x00, 0x01, 0x01, 0x01], 0, Offset(0)),
            Err(Error::Format(FormatError::NonZeroPadding { .. }))
        ));
        assert!(matches!(
            decode_one(&[0xba, 0x00, 0x01, 0x00, 0x01], 0, Offset(0)),
            Err(Error::Format(FormatError::NonZeroPadding { .. }))
        ));
    }

    #[test]
    fn truncated_operands() {
        assert!(matches!(
            decode_one(&[0x11, 0x00], 0, Offset(0)),
            Err(Error::Format(FormatError::Truncated))
        ));
        assert!(matches!(
            decode_one(&[0x00], 4, Offset(4)),
            Err(Error::Format(FormatError::Truncated))
        ));
    }

    #[test]
    fn encoding_checks_opcode_category() {
        let bogus: Instruction<Offset> = Instruction::Branch(Opcode::NOP, Offset(0));
        assert!(matches!(
            encode_one(&bogus, Offset(0)),
            Err(Error::InvalidInstruction {
                expected: Category::Branch,
                ..
            })
        ));
        let bogus: Instruction<Offset> = Instruction::WideLocal(Opcode::LDC, 1);
        assert!(bogus.check().is_err());
    }

    #[test]
    fn short_branch_overflow() {
        let far: Instruction<Offset> = Instruction::Branch(Opcode::GOTO, Offset(40000));
        assert!(matches!(
            encode_one(&far, Offset(0)),
            Err(Error::BranchOverflow { .. })
        ));
        let far: Instruction<Offset> = Instruction::WideBranch(Opcode::GOTO_W, Offset(40000));
        assert_eq!(encode_one(&far, Offset(0)).unwrap(), vec![0xc8, 0, 0, 0x9c, 0x40]);
    }

    #[test]
    fn display() {
        let insn: Instruction<Offset> = Instruction::Branch(Opcode::IFEQ, Offset(7));
        assert_eq!(insn.to_string(), "ifeq -> @7");
        let insn: Instruction<Offset> = Instruction::ByteOperand(Opcode::LDC, 3);
        assert_eq!(insn.to_string(), "ldc #3");
        let insn: Instruction<Offset> = Instruction::WideLocal(Opcode::ALOAD, 300);
        assert_eq!(insn.to_string(), "wide aload 300");
    }
}
