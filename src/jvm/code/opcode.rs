use bitflags::bitflags;
use std::fmt;

/// Opcode byte of an instruction
///
/// Every defined opcode has an associated constant (eg. [`Opcode::GOTO`]) and an entry in a static
/// table describing its mnemonic, how its operands are laid out, and a couple of properties that
/// code transformations care about.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-6.html#jvms-6.5
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Opcode(pub u8);

/// Addressing mode of an opcode, which determines its operands and its encoded length
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Category {
    /// No operands, length 1
    NoOperand,

    /// Unsigned byte operand (local index, `ldc` constant index, `newarray` type), length 2
    ByteOperand,

    /// `bipush`, length 2
    BytePush,

    /// `sipush`, length 3
    ShortPush,

    /// Unsigned 2-byte constant pool index, length 3
    ConstantRef,

    /// `iinc`, length 3
    IInc,

    /// `multianewarray`, length 4
    MultiANewArray,

    /// `invokeinterface`, length 5
    InvokeInterface,

    /// `invokedynamic`, length 5
    InvokeDynamic,

    /// Signed 2-byte relative jump, length 3
    Branch,

    /// Signed 4-byte relative jump, length 5
    WideBranch,

    /// Padded and variable length
    TableSwitch,

    /// Padded and variable length
    LookupSwitch,

    /// The `wide` prefix, which is decoded together with the opcode it modifies
    Wide,
}

bitflags! {
    /// Properties of opcodes
    pub struct OpcodeFlags: u8 {
        /// Has at least one jump target
        const BRANCH = 0x01;

        /// Never continues on to the next instruction
        const NO_FALLTHROUGH = 0x02;

        /// May follow a `wide` prefix
        const WIDENABLE = 0x04;

        /// Has a constant pool index among its operands
        const CONSTANT_OPERAND = 0x08;
    }
}

/// Static information about an opcode
#[derive(Copy, Clone, Debug)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    pub category: Category,
    pub flags: OpcodeFlags,
}

macro_rules! opcodes {
    ($( $name:ident = $byte:literal, $mnemonic:literal, $category:ident, [$($flag:ident),*]; )*) => {
        impl Opcode {
            $( pub const $name: Opcode = Opcode($byte); )*
        }

        static OPCODE_TABLE: [Option<OpcodeInfo>; 256] = {
            let mut table: [Option<OpcodeInfo>; 256] = [None; 256];
            $(
                table[$byte as usize] = Some(OpcodeInfo {
                    mnemonic: $mnemonic,
                    category: Category::$category,
                    flags: OpcodeFlags::from_bits_truncate(0 $( | OpcodeFlags::$flag.bits() )*),
                });
            )*
            table
        };
    };
}

opcodes! {
    NOP = 0x00, "nop", NoOperand, [];
    ACONST_NULL = 0x01, "aconst_null", NoOperand, [];
    ICONST_M1 = 0x02, "iconst_m1", NoOperand, [];
    ICONST_0 = 0x03, "iconst_0", NoOperand, [];
    ICONST_1 = 0x04, "iconst_1", NoOperand, [];
    ICONST_2 = 0x05, "iconst_2", NoOperand, [];
    ICONST_3 = 0x06, "iconst_3", NoOperand, [];
    ICONST_4 = 0x07, "iconst_4", NoOperand, [];
    ICONST_5 = 0x08, "iconst_5", NoOperand, [];
    LCONST_0 = 0x09, "lconst_0", NoOperand, [];
    LCONST_1 = 0x0a, "lconst_1", NoOperand, [];
    FCONST_0 = 0x0b, "fconst_0", NoOperand, [];
    FCONST_1 = 0x0c, "fconst_1", NoOperand, [];
    FCONST_2 = 0x0d, "fconst_2", NoOperand, [];
    DCONST_0 = 0x0e, "dconst_0", NoOperand, [];
    DCONST_1 = 0x0f, "dconst_1", NoOperand, [];
    BIPUSH = 0x10, "bipush", BytePush, [];
    SIPUSH = 0x11, "sipush", ShortPush, [];
    LDC = 0x12, "ldc", ByteOperand, [CONSTANT_OPERAND];
    LDC_W = 0x13, "ldc_w", ConstantRef, [CONSTANT_OPERAND];
    LDC2_W = 0x14, "ldc2_w", ConstantRef, [CONSTANT_OPERAND];
    ILOAD = 0x15, "iload", ByteOperand, [WIDENABLE];
    LLOAD = 0x16, "lload", ByteOperand, [WIDENABLE];
    FLOAD = 0x17, "fload", ByteOperand, [WIDENABLE];
    DLOAD = 0x18, "dload", ByteOperand, [WIDENABLE];
    ALOAD = 0x19, "aload", ByteOperand, [WIDENABLE];
    ILOAD_0 = 0x1a, "iload_0", NoOperand, [];
    ILOAD_1 = 0x1b, "iload_1", NoOperand, [];
    ILOAD_2 = 0x1c, "iload_2", NoOperand, [];
    ILOAD_3 = 0x1d, "iload_3", NoOperand, [];
    LLOAD_0 = 0x1e, "lload_0", NoOperand, [];
    LLOAD_1 = 0x1f, "lload_1", NoOperand, [];
    LLOAD_2 = 0x20, "lload_2", NoOperand, [];
    LLOAD_3 = 0x21, "lload_3", NoOperand, [];
    FLOAD_0 = 0x22, "fload_0", NoOperand, [];
    FLOAD_1 = 0x23, "fload_1", NoOperand, [];
    FLOAD_2 = 0x24, "fload_2", NoOperand, [];
    FLOAD_3 = 0x25, "fload_3", NoOperand, [];
    DLOAD_0 = 0x26, "dload_0", NoOperand, [];
    DLOAD_1 = 0x27, "dload_1", NoOperand, [];
    DLOAD_2 = 0x28, "dload_2", NoOperand, [];
    DLOAD_3 = 0x29, "dload_3", NoOperand, [];
    ALOAD_0 = 0x2a, "aload_0", NoOperand, [];
    ALOAD_1 = 0x2b, "aload_1", NoOperand, [];
    ALOAD_2 = 0x2c, "aload_2", NoOperand, [];
    ALOAD_3 = 0x2d, "aload_3", NoOperand, [];
    IALOAD = 0x2e, "iaload", NoOperand, [];
    LALOAD = 0x2f, "laload", NoOperand, [];
    FALOAD = 0x30, "faload", NoOperand, [];
    DALOAD = 0x31, "daload", NoOperand, [];
    AALOAD = 0x32, "aaload", NoOperand, [];
    BALOAD = 0x33, "baload", NoOperand, [];
    CALOAD = 0x34, "caload", NoOperand, [];
    SALOAD = 0x35, "saload", NoOperand, [];
    ISTORE = 0x36, "istore", ByteOperand, [WIDENABLE];
    LSTORE = 0x37, "lstore", ByteOperand, [WIDENABLE];
    FSTORE = 0x38, "fstore", ByteOperand, [WIDENABLE];
    DSTORE = 0x39, "dstore", ByteOperand, [WIDENABLE];
    ASTORE = 0x3a, "astore", ByteOperand, [WIDENABLE];
    ISTORE_0 = 0x3b, "istore_0", NoOperand, [];
    ISTORE_1 = 0x3c, "istore_1", NoOperand, [];
    ISTORE_2 = 0x3d, "istore_2", NoOperand, [];
    ISTORE_3 = 0x3e, "istore_3", NoOperand, [];
    LSTORE_0 = 0x3f, "lstore_0", NoOperand, [];
    LSTORE_1 = 0x40, "lstore_1", NoOperand, [];
    LSTORE_2 = 0x41, "lstore_2", NoOperand, [];
    LSTORE_3 = 0x42, "lstore_3", NoOperand, [];
    FSTORE_0 = 0x43, "fstore_0", NoOperand, [];
    FSTORE_1 = 0x44, "fstore_1", NoOperand, [];
    FSTORE_2 = 0x45, "fstore_2", NoOperand, [];
    FSTORE_3 = 0x46, "fstore_3", NoOperand, [];
    DSTORE_0 = 0x47, "dstore_0", NoOperand, [];
    DSTORE_1 = 0x48, "dstore_1", NoOperand, [];
    DSTORE_2 = 0x49, "dstore_2", NoOperand, [];
    DSTORE_3 = 0x4a, "dstore_3", NoOperand, [];
    ASTORE_0 = 0x4b, "astore_0", NoOperand, [];
    ASTORE_1 = 0x4c, "astore_1", NoOperand, [];
    ASTORE_2 = 0x4d, "astore_2", NoOperand, [];
    ASTORE_3 = 0x4e, "astore_3", NoOperand, [];
    IASTORE = 0x4f, "iastore", NoOperand, [];
    LASTORE = 0x50, "lastore", NoOperand, [];
    FASTORE = 0x51, "fastore", NoOperand, [];
    DASTORE = 0x52, "dastore", NoOperand, [];
    AASTORE = 0x53, "aastore", NoOperand, [];
    BASTORE = 0x54, "bastore", NoOperand, [];
    CASTORE = 0x55, "castore", NoOperand, [];
    SASTORE = 0x56, "sastore", NoOperand, [];
    POP = 0x57, "pop", NoOperand, [];
    POP2 = 0x58, "pop2", NoOperand, [];
    DUP = 0x59, "dup", NoOperand, [];
    DUP_X1 = 0x5a, "dup_x1", NoOperand, [];
    DUP_X2 = 0x5b, "dup_x2", NoOperand, [];
    DUP2 = 0x5c, "dup2", NoOperand, [];
    DUP2_X1 = 0x5d, "dup2_x1", NoOperand, [];
    DUP2_X2 = 0x5e, "dup2_x2", NoOperand, [];
    SWAP = 0x5f, "swap", NoOperand, [];
    IADD = 0x60, "iadd", NoOperand, [];
    LADD = 0x61, "ladd", NoOperand, [];
    FADD = 0x62, "fadd", NoOperand, [];
    DADD = 0x63, "dadd", NoOperand, [];
    ISUB = 0x64, "isub", NoOperand, [];
    LSUB = 0x65, "lsub", NoOperand, [];
    FSUB = 0x66, "fsub", NoOperand, [];
    DSUB = 0x67, "dsub", NoOperand, [];
    IMUL = 0x68, "imul", NoOperand, [];
    LMUL = 0x69, "lmul", NoOperand, [];
    FMUL = 0x6a, "fmul", NoOperand, [];
    DMUL = 0x6b, "dmul", NoOperand, [];
    IDIV = 0x6c, "idiv", NoOperand, [];
    LDIV = 0x6d, "ldiv", NoOperand, [];
    FDIV = 0x6e, "fdiv", NoOperand, [];
    DDIV = 0x6f, "ddiv", NoOperand, [];
    IREM = 0x70, "irem", NoOperand, [];
    LREM = 0x71, "lrem", NoOperand, [];
    FREM = 0x72, "frem", NoOperand, [];
    DREM = 0x73, "drem", NoOperand, [];
    INEG = 0x74, "ineg", NoOperand, [];
    LNEG = 0x75, "lneg", NoOperand, [];
    FNEG = 0x76, "fneg", NoOperand, [];
    DNEG = 0x77, "dneg", NoOperand, [];
    ISHL = 0x78, "ishl", NoOperand, [];
    LSHL = 0x79, "lshl", NoOperand, [];
    ISHR = 0x7a, "ishr", NoOperand, [];
    LSHR = 0x7b, "lshr", NoOperand, [];
    IUSHR = 0x7c, "iushr", NoOperand, [];
    LUSHR = 0x7d, "lushr", NoOperand, [];
    IAND = 0x7e, "iand", NoOperand, [];
    LAND = 0x7f, "land", NoOperand, [];
    IOR = 0x80, "ior", NoOperand, [];
    LOR = 0x81, "lor", NoOperand, [];
    IXOR = 0x82, "ixor", NoOperand, [];
    LXOR = 0x83, "lxor", NoOperand, [];
    IINC = 0x84, "iinc", IInc, [WIDENABLE];
    I2L = 0x85, "i2l", NoOperand, [];
    I2F = 0x86, "i2f", NoOperand, [];
    I2D = 0x87, "i2d", NoOperand, [];
    L2I = 0x88, "l2i", NoOperand, [];
    L2F = 0x89, "l2f", NoOperand, [];
    L2D = 0x8a, "l2d", NoOperand, [];
    F2I = 0x8b, "f2i", NoOperand, [];
    F2L = 0x8c, "f2l", NoOperand, [];
    F2D = 0x8d, "f2d", NoOperand, [];
    D2I = 0x8e, "d2i", NoOperand, [];
    D2L = 0x8f, "d2l", NoOperand, [];
    D2F = 0x90, "d2f", NoOperand, [];
    I2B = 0x91, "i2b", NoOperand, [];
    I2C = 0x92, "i2c", NoOperand, [];
    I2S = 0x93, "i2s", NoOperand, [];
    LCMP = 0x94, "lcmp", NoOperand, [];
    FCMPL = 0x95, "fcmpl", NoOperand, [];
    FCMPG = 0x96, "fcmpg", NoOperand, [];
    DCMPL = 0x97, "dcmpl", NoOperand, [];
    DCMPG = 0x98, "dcmpg", NoOperand, [];
    IFEQ = 0x99, "ifeq", Branch, [BRANCH];
    IFNE = 0x9a, "ifne", Branch, [BRANCH];
    IFLT = 0x9b, "iflt", Branch, [BRANCH];
    IFGE = 0x9c, "ifge", Branch, [BRANCH];
    IFGT = 0x9d, "ifgt", Branch, [BRANCH];
    IFLE = 0x9e, "ifle", Branch, [BRANCH];
    IF_ICMPEQ = 0x9f, "if_icmpeq", Branch, [BRANCH];
    IF_ICMPNE = 0xa0, "if_icmpne", Branch, [BRANCH];
    IF_ICMPLT = 0xa1, "if_icmplt", Branch, [BRANCH];
    IF_ICMPGE = 0xa2, "if_icmpge", Branch, [BRANCH];
    IF_ICMPGT = 0xa3, "if_icmpgt", Branch, [BRANCH];
    IF_ICMPLE = 0xa4, "if_icmple", Branch, [BRANCH];
    IF_ACMPEQ = 0xa5, "if_acmpeq", Branch, [BRANCH];
    IF_ACMPNE = 0xa6, "if_acmpne", Branch, [BRANCH];
    GOTO = 0xa7, "goto", Branch, [BRANCH, NO_FALLTHROUGH];
    JSR = 0xa8, "jsr", Branch, [BRANCH];
    RET = 0xa9, "ret", ByteOperand, [WIDENABLE, NO_FALLTHROUGH];
    TABLESWITCH = 0xaa, "tableswitch", TableSwitch, [BRANCH, NO_FALLTHROUGH];
    LOOKUPSWITCH = 0xab, "lookupswitch", LookupSwitch, [BRANCH, NO_FALLTHROUGH];
    IRETURN = 0xac, "ireturn", NoOperand, [NO_FALLTHROUGH];
    LRETURN = 0xad, "lreturn", NoOperand, [NO_FALLTHROUGH];
    FRETURN = 0xae, "freturn", NoOperand, [NO_FALLTHROUGH];
    DRETURN = 0xaf, "dreturn", NoOperand, [NO_FALLTHROUGH];
    ARETURN = 0xb0, "areturn", NoOperand, [NO_FALLTHROUGH];
    RETURN = 0xb1, "return", NoOperand, [NO_FALLTHROUGH];
    GETSTATIC = 0xb2, "getstatic", ConstantRef, [CONSTANT_OPERAND];
    PUTSTATIC = 0xb3, "putstatic", ConstantRef, [CONSTANT_OPERAND];
    GETFIELD = 0xb4, "getfield", ConstantRef, [CONSTANT_OPERAND];
    PUTFIELD = 0xb5, "putfield", ConstantRef, [CONSTANT_OPERAND];
    INVOKEVIRTUAL = 0xb6, "invokevirtual", ConstantRef, [CONSTANT_OPERAND];
    INVOKESPECIAL = 0xb7, "invokespecial", ConstantRef, [CONSTANT_OPERAND];
    INVOKESTATIC = 0xb8, "invokestatic", ConstantRef, [CONSTANT_OPERAND];
    INVOKEINTERFACE = 0xb9, "invokeinterface", InvokeInterface, [CONSTANT_OPERAND];
    INVOKEDYNAMIC = 0xba, "invokedynamic", InvokeDynamic, [CONSTANT_OPERAND];
    NEW = 0xbb, "new", ConstantRef, [CONSTANT_OPERAND];
    NEWARRAY = 0xbc, "newarray", ByteOperand, [];
    ANEWARRAY = 0xbd, "anewarray", ConstantRef, [CONSTANT_OPERAND];
    ARRAYLENGTH = 0xbe, "arraylength", NoOperand, [];
    ATHROW = 0xbf, "athrow", NoOperand, [NO_FALLTHROUGH];
    CHECKCAST = 0xc0, "checkcast", ConstantRef, [CONSTANT_OPERAND];
    INSTANCEOF = 0xc1, "instanceof", ConstantRef, [CONSTANT_OPERAND];
    MONITORENTER = 0xc2, "monitorenter", NoOperand, [];
    MONITOREXIT = 0xc3, "monitorexit", NoOperand, [];
    WIDE = 0xc4, "wide", Wide, [];
    MULTIANEWARRAY = 0xc5, "multianewarray", MultiANewArray, [CONSTANT_OPERAND];
    IFNULL = 0xc6, "ifnull", Branch, [BRANCH];
    IFNONNULL = 0xc7, "ifnonnull", Branch, [BRANCH];
    GOTO_W = 0xc8, "goto_w", WideBranch, [BRANCH, NO_FALLTHROUGH];
    JSR_W = 0xc9, "jsr_w", WideBranch, [BRANCH];
    BREAKPOINT = 0xca, "breakpoint", NoOperand, [];
}

impl Opcode {
    /// Table entry for this opcode, or `None` if it is reserved or undefined
    pub fn info(self) -> Option<&'static OpcodeInfo> {
        OPCODE_TABLE[self.0 as usize].as_ref()
    }

    pub fn mnemonic(self) -> Option<&'static str> {
        self.info().map(|info| info.mnemonic)
    }

    pub fn category(self) -> Option<Category> {
        self.info().map(|info| info.category)
    }

    /// Properties of the opcode (empty for undefined opcodes)
    pub fn flags(self) -> OpcodeFlags {
        self.info().map_or(OpcodeFlags::empty(), |info| info.flags)
    }

    pub fn is_branch(self) -> bool {
        self.flags().contains(OpcodeFlags::BRANCH)
    }

    /// Does control never fall through to the next instruction?
    pub fn is_terminal(self) -> bool {
        self.flags().contains(OpcodeFlags::NO_FALLTHROUGH)
    }

    pub fn is_widenable(self) -> bool {
        self.flags().contains(OpcodeFlags::WIDENABLE)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(mnemonic) => f.write_str(mnemonic),
            None => write!(f, "<0x{:02x}>", self.0),
        }
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defined_range() {
        for byte in 0x00..=0xca {
            assert!(Opcode(byte).info().is_some(), "0x{:02x} should be defined", byte);
        }
        for byte in 0xcb..=0xff {
            assert!(Opcode(byte).info().is_none(), "0x{:02x} should be reserved", byte);
        }
    }

    #[test]
    fn widenable_opcodes() {
        let widenable: Vec<Opcode> = (0..=255u8)
            .map(Opcode)
            .filter(|opcode| opcode.is_widenable())
            .collect();
        assert_eq!(
            widenable,
            vec![
                Opcode::ILOAD,
                Opcode::LLOAD,
                Opcode::FLOAD,
                Opcode::DLOAD,
                Opcode::ALOAD,
                Opcode::ISTORE,
                Opcode::LSTORE,
                Opcode::FSTORE,
                Opcode::DSTORE,
                Opcode::ASTORE,
                Opcode::IINC,
                Opcode::RET,
            ]
        );
    }

    #[test]
    fn metadata() {
        assert_eq!(Opcode::RETURN.mnemonic(), Some("return"));
        assert_eq!(Opcode::GOTO_W.category(), Some(Category::WideBranch));
        assert!(Opcode::GOTO.is_branch() && Opcode::GOTO.is_terminal());
        assert!(Opcode::IFEQ.is_branch() && !Opcode::IFEQ.is_terminal());
        assert!(Opcode::LDC.flags().contains(OpcodeFlags::CONSTANT_OPERAND));
        assert!(!Opcode::NEWARRAY.flags().contains(OpcodeFlags::CONSTANT_OPERAND));
        assert_eq!(format!("{}", Opcode(0xfe)), "<0xfe>");
    }
}
