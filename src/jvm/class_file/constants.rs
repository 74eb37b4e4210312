use crate::jvm::binary_format::{read_bytes, Deserialize, Serialize};
use crate::jvm::{Error, FormatError};
use crate::util::{Offset, Width};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Index into the constant pool
///
/// Indices start at 1. Index 0 is never a valid entry, although some structures use it to mean
/// "no constant" (eg. the catch type of a `finally` handler).
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct ConstantIndex(pub u16);

impl ConstantIndex {
    pub const NONE: ConstantIndex = ConstantIndex(0);
}

impl Serialize for ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Deserialize for ConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> Result<Self, Error> {
        Ok(ConstantIndex(u16::deserialize(reader)?))
    }
}

impl fmt::Display for ConstantIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Constants as in the constant pool
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone)]
pub enum Constant {
    /// Constant raw string value, in modified UTF-8
    ///
    /// The bytes are kept exactly as they appeared in the class file (they are only validated),
    /// so that writing the pool back out is byte-exact. Use [`Constant::utf8_str`] to decode.
    Utf8(Vec<u8>),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Class or an interface
    Class(ConstantIndex),

    /// Constant object of type `java.lang.String`
    String(ConstantIndex),

    FieldRef {
        class: ConstantIndex,
        name_and_type: ConstantIndex,
    },
    MethodRef {
        class: ConstantIndex,
        name_and_type: ConstantIndex,
    },
    InterfaceMethodRef {
        class: ConstantIndex,
        name_and_type: ConstantIndex,
    },

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: ConstantIndex,
        descriptor: ConstantIndex,
    },

    /// Constant object of type `java.lang.invoke.MethodHandle`
    MethodHandle {
        handle_kind: HandleKind,

        /// Depending on the method kind, this points to different things:
        ///
        ///   - `FieldRef` for `GetField`, `GetStatic`, `PutField`, `PutStatic`
        ///   - `MethodRef` or `InterfaceMethodRef` for the rest
        member: ConstantIndex,
    },

    /// Method type
    MethodType { descriptor: ConstantIndex },

    /// Dynamically-computed constant
    Dynamic {
        /// Index into the `BootstrapMethods` attribute (not the constant pool)
        bootstrap_method: u16,
        name_and_type: ConstantIndex,
    },

    /// Dynamically-computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute (not the constant pool)
        bootstrap_method: u16,
        name_and_type: ConstantIndex,
    },

    Module(ConstantIndex),
    Package(ConstantIndex),
}

/// Kind of a constant, as encoded in its leading tag byte
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u8)]
pub enum ConstantTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    FieldRef = 9,
    MethodRef = 10,
    InterfaceMethodRef = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}

impl ConstantTag {
    pub fn from_u8(tag: u8) -> Option<ConstantTag> {
        Some(match tag {
            1 => ConstantTag::Utf8,
            3 => ConstantTag::Integer,
            4 => ConstantTag::Float,
            5 => ConstantTag::Long,
            6 => ConstantTag::Double,
            7 => ConstantTag::Class,
            8 => ConstantTag::String,
            9 => ConstantTag::FieldRef,
            10 => ConstantTag::MethodRef,
            11 => ConstantTag::InterfaceMethodRef,
            12 => ConstantTag::NameAndType,
            15 => ConstantTag::MethodHandle,
            16 => ConstantTag::MethodType,
            17 => ConstantTag::Dynamic,
            18 => ConstantTag::InvokeDynamic,
            19 => ConstantTag::Module,
            20 => ConstantTag::Package,
            _ => return None,
        })
    }
}

/// Entries that hold constant pool indices and need to follow them when the pool is compacted
pub trait Renumber {
    /// Replace every occurrence of `old` with `new`
    fn renumber(&mut self, old: ConstantIndex, new: ConstantIndex);
}

impl Constant {
    pub fn tag(&self) -> ConstantTag {
        match self {
            Constant::Utf8(_) => ConstantTag::Utf8,
            Constant::Integer(_) => ConstantTag::Integer,
            Constant::Float(_) => ConstantTag::Float,
            Constant::Long(_) => ConstantTag::Long,
            Constant::Double(_) => ConstantTag::Double,
            Constant::Class(_) => ConstantTag::Class,
            Constant::String(_) => ConstantTag::String,
            Constant::FieldRef { .. } => ConstantTag::FieldRef,
            Constant::MethodRef { .. } => ConstantTag::MethodRef,
            Constant::InterfaceMethodRef { .. } => ConstantTag::InterfaceMethodRef,
            Constant::NameAndType { .. } => ConstantTag::NameAndType,
            Constant::MethodHandle { .. } => ConstantTag::MethodHandle,
            Constant::MethodType { .. } => ConstantTag::MethodType,
            Constant::Dynamic { .. } => ConstantTag::Dynamic,
            Constant::InvokeDynamic { .. } => ConstantTag::InvokeDynamic,
            Constant::Module(_) => ConstantTag::Module,
            Constant::Package(_) => ConstantTag::Package,
        }
    }

    /// Decode a `Utf8` constant into a Rust string
    ///
    /// Returns `None` for other constants, and for `Utf8` constants holding unpaired surrogates
    /// (which are valid in Java strings, but not in Rust ones).
    pub fn utf8_str(&self) -> Option<String> {
        match self {
            Constant::Utf8(bytes) => decode_modified_utf8(bytes),
            _ => None,
        }
    }

    /// Other constants in the pool which this constant refers to, in field order
    ///
    /// The same index can show up twice (eg. a `NameAndType` whose name and descriptor are the
    /// same string).
    pub fn references(&self) -> impl Iterator<Item = ConstantIndex> {
        let pair: [Option<ConstantIndex>; 2] = match self {
            Constant::Utf8(_)
            | Constant::Integer(_)
            | Constant::Float(_)
            | Constant::Long(_)
            | Constant::Double(_) => [None, None],
            Constant::Class(name)
            | Constant::String(name)
            | Constant::Module(name)
            | Constant::Package(name)
            | Constant::MethodType { descriptor: name } => [Some(*name), None],
            Constant::FieldRef {
                class,
                name_and_type,
            }
            | Constant::MethodRef {
                class,
                name_and_type,
            }
            | Constant::InterfaceMethodRef {
                class,
                name_and_type,
            } => [Some(*class), Some(*name_and_type)],
            Constant::NameAndType { name, descriptor } => [Some(*name), Some(*descriptor)],
            Constant::MethodHandle { member, .. } => [Some(*member), None],
            Constant::Dynamic { name_and_type, .. }
            | Constant::InvokeDynamic { name_and_type, .. } => [Some(*name_and_type), None],
        };
        pair.into_iter().flatten()
    }

    fn references_mut(&mut self) -> [Option<&mut ConstantIndex>; 2] {
        match self {
            Constant::Utf8(_)
            | Constant::Integer(_)
            | Constant::Float(_)
            | Constant::Long(_)
            | Constant::Double(_) => [None, None],
            Constant::Class(name)
            | Constant::String(name)
            | Constant::Module(name)
            | Constant::Package(name)
            | Constant::MethodType { descriptor: name } => [Some(name), None],
            Constant::FieldRef {
                class,
                name_and_type,
            }
            | Constant::MethodRef {
                class,
                name_and_type,
            }
            | Constant::InterfaceMethodRef {
                class,
                name_and_type,
            } => [Some(class), Some(name_and_type)],
            Constant::NameAndType { name, descriptor } => [Some(name), Some(descriptor)],
            Constant::MethodHandle { member, .. } => [Some(member), None],
            Constant::Dynamic { name_and_type, .. }
            | Constant::InvokeDynamic { name_and_type, .. } => [Some(name_and_type), None],
        }
    }

    /// Everything that makes two constants interchangeable in the pool
    ///
    /// Floating point values are compared by bit pattern: `NaN` is its own constant and `0.0` is
    /// distinct from `-0.0`.
    fn identity(&self) -> (ConstantTag, u64, u64, &[u8]) {
        let tag = self.tag();
        match self {
            Constant::Utf8(bytes) => (tag, 0, 0, bytes),
            Constant::Integer(integer) => (tag, *integer as u32 as u64, 0, &[]),
            Constant::Float(float) => (tag, float.to_bits() as u64, 0, &[]),
            Constant::Long(long) => (tag, *long as u64, 0, &[]),
            Constant::Double(double) => (tag, double.to_bits(), 0, &[]),
            Constant::MethodHandle {
                handle_kind,
                member,
            } => (tag, handle_kind.to_u8() as u64, member.0 as u64, &[]),
            Constant::Dynamic {
                bootstrap_method,
                name_and_type,
            }
            | Constant::InvokeDynamic {
                bootstrap_method,
                name_and_type,
            } => (tag, *bootstrap_method as u64, name_and_type.0 as u64, &[]),
            _ => {
                let mut refs = self.references();
                let first = refs.next().map_or(0, |idx| idx.0 as u64);
                let second = refs.next().map_or(0, |idx| idx.0 as u64);
                (tag, first, second, &[])
            }
        }
    }

    /// Read one constant (tag included) from a class file
    ///
    /// `index` is the slot the constant will end up in, and is only used for error reporting.
    pub fn read<R: ReadBytesExt>(reader: &mut R, index: ConstantIndex) -> Result<Constant, Error> {
        let tag_byte = u8::deserialize(reader)?;
        let tag = ConstantTag::from_u8(tag_byte).ok_or(FormatError::UnknownConstantTag {
            index,
            tag: tag_byte,
        })?;
        let constant = match tag {
            ConstantTag::Utf8 => {
                let len = u16::deserialize(reader)?;
                let bytes = read_bytes(reader, len as usize)?;
                if modified_utf8_units(&bytes).is_none() {
                    return Err(Error::Format(FormatError::MalformedUtf8 { index }));
                }
                Constant::Utf8(bytes)
            }
            ConstantTag::Integer => Constant::Integer(i32::deserialize(reader)?),
            ConstantTag::Float => Constant::Float(f32::deserialize(reader)?),
            ConstantTag::Long => Constant::Long(i64::deserialize(reader)?),
            ConstantTag::Double => Constant::Double(f64::deserialize(reader)?),
            ConstantTag::Class => Constant::Class(ConstantIndex::deserialize(reader)?),
            ConstantTag::String => Constant::String(ConstantIndex::deserialize(reader)?),
            ConstantTag::FieldRef => Constant::FieldRef {
                class: ConstantIndex::deserialize(reader)?,
                name_and_type: ConstantIndex::deserialize(reader)?,
            },
            ConstantTag::MethodRef => Constant::MethodRef {
                class: ConstantIndex::deserialize(reader)?,
                name_and_type: ConstantIndex::deserialize(reader)?,
            },
            ConstantTag::InterfaceMethodRef => Constant::InterfaceMethodRef {
                class: ConstantIndex::deserialize(reader)?,
                name_and_type: ConstantIndex::deserialize(reader)?,
            },
            ConstantTag::NameAndType => Constant::NameAndType {
                name: ConstantIndex::deserialize(reader)?,
                descriptor: ConstantIndex::deserialize(reader)?,
            },
            ConstantTag::MethodHandle => {
                let kind = u8::deserialize(reader)?;
                let handle_kind = HandleKind::from_u8(kind)
                    .ok_or(FormatError::InvalidHandleKind { index, kind })?;
                Constant::MethodHandle {
                    handle_kind,
                    member: ConstantIndex::deserialize(reader)?,
                }
            }
            ConstantTag::MethodType => Constant::MethodType {
                descriptor: ConstantIndex::deserialize(reader)?,
            },
            ConstantTag::Dynamic => Constant::Dynamic {
                bootstrap_method: u16::deserialize(reader)?,
                name_and_type: ConstantIndex::deserialize(reader)?,
            },
            ConstantTag::InvokeDynamic => Constant::InvokeDynamic {
                bootstrap_method: u16::deserialize(reader)?,
                name_and_type: ConstantIndex::deserialize(reader)?,
            },
            ConstantTag::Module => Constant::Module(ConstantIndex::deserialize(reader)?),
            ConstantTag::Package => Constant::Package(ConstantIndex::deserialize(reader)?),
        };
        Ok(constant)
    }
}

impl Renumber for Constant {
    fn renumber(&mut self, old: ConstantIndex, new: ConstantIndex) {
        for index in self.references_mut().into_iter().flatten() {
            if *index == old {
                *index = new;
            }
        }
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Constant) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Constant {}

impl Hash for Constant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state)
    }
}

impl Serialize for Constant {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        (self.tag() as u8).serialize(writer)?;
        match self {
            Constant::Utf8(bytes) => {
                let len = u16::try_from(bytes.len()).map_err(|_| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "utf8 constant longer than 65535 bytes",
                    )
                })?;
                len.serialize(writer)?;
                writer.write_all(bytes)?;
            }
            Constant::Integer(integer) => integer.serialize(writer)?,
            Constant::Float(float) => float.serialize(writer)?,
            Constant::Long(long) => long.serialize(writer)?,
            Constant::Double(double) => double.serialize(writer)?,
            Constant::MethodHandle {
                handle_kind,
                member,
            } => {
                handle_kind.serialize(writer)?;
                member.serialize(writer)?;
            }
            Constant::Dynamic {
                bootstrap_method,
                name_and_type,
            }
            | Constant::InvokeDynamic {
                bootstrap_method,
                name_and_type,
            } => {
                bootstrap_method.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            _ => {
                for index in self.references() {
                    index.serialize(writer)?;
                }
            }
        };
        Ok(())
    }
}

/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`. Quoting
/// the JVM specification:
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
/// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
/// > at index n, then the next usable item in the pool is located at index n+2. The constant_pool
/// > index n+1 must be valid but is considered unusable.
/// >
/// > In retrospect, making 8-byte constants take two constant pool entries was a poor choice.
impl Width for Constant {
    fn width(&self, _offset: Offset) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

/// Type of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-5.html#jvms-5.4.3.5-220
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl HandleKind {
    pub fn to_u8(self) -> u8 {
        match self {
            HandleKind::GetField => 1,
            HandleKind::GetStatic => 2,
            HandleKind::PutField => 3,
            HandleKind::PutStatic => 4,
            HandleKind::InvokeVirtual => 5,
            HandleKind::InvokeStatic => 6,
            HandleKind::InvokeSpecial => 7,
            HandleKind::NewInvokeSpecial => 8,
            HandleKind::InvokeInterface => 9,
        }
    }

    pub fn from_u8(kind: u8) -> Option<HandleKind> {
        Some(match kind {
            1 => HandleKind::GetField,
            2 => HandleKind::GetStatic,
            3 => HandleKind::PutField,
            4 => HandleKind::PutStatic,
            5 => HandleKind::InvokeVirtual,
            6 => HandleKind::InvokeStatic,
            7 => HandleKind::InvokeSpecial,
            8 => HandleKind::NewInvokeSpecial,
            9 => HandleKind::InvokeInterface,
            _ => return None,
        })
    }
}

impl Serialize for HandleKind {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.to_u8().serialize(writer)
    }
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = vec![];
    for c in string.chars() {
        // Handle the exception for how `\u{0000}` is represented
        let len: usize = if c == '\u{0000}' { 2 } else { c.len_utf8() };
        let code: u32 = c as u32;

        match len {
            1 => buffer.push(code as u8),
            2 => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            3 => {
                buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }

            // Supplementary characters: main divergence from unicode
            _ => {
                buffer.push(0b1110_1101);
                buffer.push(((code >> 16 & 0x0F) as u8).wrapping_sub(1) & 0x0F | 0b1010_0000);
                buffer.push((code >> 10 & 0x3F) as u8 | 0b1000_0000);

                buffer.push(0b1110_1101);
                buffer.push(((code >> 6 & 0x1F) as u8) | 0b1011_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}

/// Inverse of [`encode_modified_utf8`]
///
/// Returns `None` if the bytes are malformed or decode to unpaired surrogates.
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    String::from_utf16(&modified_utf8_units(bytes)?).ok()
}

/// Decode modified UTF-8 into UTF-16 code units (which is what Java strings are made of)
fn modified_utf8_units(bytes: &[u8]) -> Option<Vec<u16>> {
    fn continuation(byte: Option<u8>) -> Option<u16> {
        match byte {
            Some(byte) if byte & 0b1100_0000 == 0b1000_0000 => Some((byte & 0x3F) as u16),
            _ => None,
        }
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut bytes = bytes.iter().copied();
    while let Some(lead) = bytes.next() {
        let unit = match lead {
            0x01..=0x7F => lead as u16,
            0xC0..=0xDF => {
                let low = continuation(bytes.next())?;
                ((lead as u16 & 0x1F) << 6) | low
            }
            0xE0..=0xEF => {
                let mid = continuation(bytes.next())?;
                let low = continuation(bytes.next())?;
                ((lead as u16 & 0x0F) << 12) | (mid << 6) | low
            }
            _ => return None,
        };
        units.push(unit);
    }
    Some(units)
}

#[cfg(test)]
mod encode_modified_utf8_tests {
    use super::*;

    #[test]
    fn containing_null_byte() {
        assert_eq!(encode_modified_utf8("a\x00a"), vec![97, 192, 128, 97]);
    }

    #[test]
    fn simple_ascii() {
        assert_eq!(encode_modified_utf8("foo"), vec![102, 111, 111]);
        assert_eq!(
            encode_modified_utf8("hel10_World"),
            vec![104, 101, 108, 49, 48, 95, 87, 111, 114, 108, 100]
        );
    }

    #[test]
    fn two_and_three_byte_encodings() {
        assert_eq!(
            encode_modified_utf8("ĄǍǞǠǺȀȂȦȺӐӒ"),
            vec![
                196, 132, 199, 141, 199, 158, 199, 160, 199, 186, 200, 128, 200, 130, 200, 166,
                200, 186, 211, 144, 211, 146
            ]
        );
        assert_eq!(
            encode_modified_utf8("ऄअॲঅਅઅଅஅఅಅഅะະ༁ཨ"),
            vec![
                224, 164, 132, 224, 164, 133, 224, 165, 178, 224, 166, 133, 224, 168, 133, 224,
                170, 133, 224, 172, 133, 224, 174, 133, 224, 176, 133, 224, 178, 133, 224, 180,
                133, 224, 184, 176, 224, 186, 176, 224, 188, 129, 224, 189, 168
            ]
        );
    }

    #[test]
    fn supplementary_characters() {
        assert_eq!(
            encode_modified_utf8("\u{10000}\u{dffff}\u{10FFFF}"),
            vec![
                237, 160, 128, 237, 176, 128, 237, 172, 191, 237, 191, 191, 237, 175, 191, 237,
                191, 191
            ]
        );
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn floats_intern_by_bit_pattern() {
        assert_eq!(Constant::Float(f32::NAN), Constant::Float(f32::NAN));
        assert_ne!(Constant::Float(0.0), Constant::Float(-0.0));
        assert_ne!(Constant::Double(0.0), Constant::Double(-0.0));
        assert_ne!(Constant::Integer(1), Constant::Float(f32::from_bits(1)));
    }

    #[test]
    fn method_refs_are_not_interface_method_refs() {
        let method = Constant::MethodRef {
            class: ConstantIndex(1),
            name_and_type: ConstantIndex(2),
        };
        let interface_method = Constant::InterfaceMethodRef {
            class: ConstantIndex(1),
            name_and_type: ConstantIndex(2),
        };
        assert_ne!(method, interface_method);
    }

    #[test]
    fn renumber_touches_every_matching_field() {
        let mut constant = Constant::NameAndType {
            name: ConstantIndex(4),
            descriptor: ConstantIndex(4),
        };
        constant.renumber(ConstantIndex(4), ConstantIndex(3));
        assert_eq!(
            constant.references().collect::<Vec<_>>(),
            vec![ConstantIndex(3), ConstantIndex(3)]
        );
    }

    #[test]
    fn read_method_handle() {
        let bytes = [15, 6, 0, 9];
        let constant = Constant::read(&mut &bytes[..], ConstantIndex(1)).unwrap();
        assert_eq!(
            constant,
            Constant::MethodHandle {
                handle_kind: HandleKind::InvokeStatic,
                member: ConstantIndex(9),
            }
        );

        let mut written = vec![];
        constant.serialize(&mut written).unwrap();
        assert_eq!(written, bytes);
    }

    #[test]
    fn read_rejects_bad_handle_kind() {
        let bytes = [15, 10, 0, 9];
        match Constant::read(&mut &bytes[..], ConstantIndex(7)) {
            Err(Error::Format(FormatError::InvalidHandleKind { index, kind })) => {
                assert_eq!(index, ConstantIndex(7));
                assert_eq!(kind, 10);
            }
            other => panic!("expected bad handle kind, got {:?}", other),
        }
    }

    #[test]
    fn read_rejects_unknown_tag() {
        let bytes = [2, 0, 0];
        match Constant::read(&mut &bytes[..], ConstantIndex(3)) {
            Err(Error::Format(FormatError::UnknownConstantTag { index, tag })) => {
                assert_eq!(index, ConstantIndex(3));
                assert_eq!(tag, 2);
            }
            other => panic!("expected unknown tag, got {:?}", other),
        }
    }

    #[test]
    fn read_rejects_malformed_utf8() {
        let bytes = [1, 0, 2, 0xC0, 0x41];
        match Constant::read(&mut &bytes[..], ConstantIndex(1)) {
            Err(Error::Format(FormatError::MalformedUtf8 { .. })) => (),
            other => panic!("expected malformed utf8, got {:?}", other),
        }
    }
}
