//! Instruction boundaries of a `Code` attribute's bytecode array.
//!
//! Only lengths are computed here; operands are left uninterpreted.

use byteorder::{BigEndian, ByteOrder};

const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;
const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;

#[rustfmt::skip]
const MNEMONICS: [&str; 202] = [
    "nop", "aconst_null", "iconst_m1", "iconst_0", "iconst_1", "iconst_2", "iconst_3", "iconst_4",
    "iconst_5", "lconst_0", "lconst_1", "fconst_0", "fconst_1", "fconst_2", "dconst_0", "dconst_1",
    "bipush", "sipush", "ldc", "ldc_w", "ldc2_w", "iload", "lload", "fload",
    "dload", "aload", "iload_0", "iload_1", "iload_2", "iload_3", "lload_0", "lload_1",
    "lload_2", "lload_3", "fload_0", "fload_1", "fload_2", "fload_3", "dload_0", "dload_1",
    "dload_2", "dload_3", "aload_0", "aload_1", "aload_2", "aload_3", "iaload", "laload",
    "faload", "daload", "aaload", "baload", "caload", "saload", "istore", "lstore",
    "fstore", "dstore", "astore", "istore_0", "istore_1", "istore_2", "istore_3", "lstore_0",
    "lstore_1", "lstore_2", "lstore_3", "fstore_0", "fstore_1", "fstore_2", "fstore_3", "dstore_0",
    "dstore_1", "dstore_2", "dstore_3", "astore_0", "astore_1", "astore_2", "astore_3", "iastore",
    "lastore", "fastore", "dastore", "aastore", "bastore", "castore", "sastore", "pop",
    "pop2", "dup", "dup_x1", "dup_x2", "dup2", "dup2_x1", "dup2_x2", "swap",
    "iadd", "ladd", "fadd", "dadd", "isub", "lsub", "fsub", "dsub",
    "imul", "lmul", "fmul", "dmul", "idiv", "ldiv", "fdiv", "ddiv",
    "irem", "lrem", "frem", "drem", "ineg", "lneg", "fneg", "dneg",
    "ishl", "lshl", "ishr", "lshr", "iushr", "lushr", "iand", "land",
    "ior", "lor", "ixor", "lxor", "iinc", "i2l", "i2f", "i2d",
    "l2i", "l2f", "l2d", "f2i", "f2l", "f2d", "d2i", "d2l",
    "d2f", "i2b", "i2c", "i2s", "lcmp", "fcmpl", "fcmpg", "dcmpl",
    "dcmpg", "ifeq", "ifne", "iflt", "ifge", "ifgt", "ifle", "if_icmpeq",
    "if_icmpne", "if_icmplt", "if_icmpge", "if_icmpgt", "if_icmple", "if_acmpeq", "if_acmpne", "goto",
    "jsr", "ret", "tableswitch", "lookupswitch", "ireturn", "lreturn", "freturn", "dreturn",
    "areturn", "return", "getstatic", "putstatic", "getfield", "putfield", "invokevirtual", "invokespecial",
    "invokestatic", "invokeinterface", "invokedynamic", "new", "newarray", "anewarray", "arraylength", "athrow",
    "checkcast", "instanceof", "monitorenter", "monitorexit", "wide", "multianewarray", "ifnull", "ifnonnull",
    "goto_w", "jsr_w",
];

/// The instruction stream ended in the middle of the instruction at
/// `offset`, or the byte there is not an opcode.
#[derive(Debug, PartialEq, Eq)]
pub struct MalformedInstruction {
    pub offset: usize,
}

pub fn opcode_name(opcode: u8) -> Option<&'static str> {
    MNEMONICS.get(opcode as usize).copied()
}

/// Calls `visitor` with `(offset, length, opcode)` for each instruction.
pub fn for_each_instruction(
    code: &[u8],
    mut visitor: impl FnMut(usize, usize, u8),
) -> Result<(), MalformedInstruction> {
    let mut offset = 0;
    while offset < code.len() {
        let opcode = code[offset];
        let length = instruction_length(code, offset).ok_or(MalformedInstruction { offset })?;
        if offset + length > code.len() {
            return Err(MalformedInstruction { offset });
        }

        visitor(offset, length, opcode);
        offset += length;
    }

    Ok(())
}

fn instruction_length(code: &[u8], offset: usize) -> Option<usize> {
    let length = match code[offset] {
        0x10 | 0x12 | 0x15..=0x19 | 0x36..=0x3a | 0xa9 | 0xbc => 2,
        0x11 | 0x13 | 0x14 | 0x84 | 0x99..=0xa8 | 0xb2..=0xb8 | 0xbb | 0xbd | 0xc0 | 0xc1
        | 0xc6 | 0xc7 => 3,
        0xc5 => 4,
        0xb9 | 0xba | 0xc8 | 0xc9 => 5,
        WIDE => match code.get(offset + 1)? {
            &IINC => 6,
            _ => 4,
        },
        TABLESWITCH => {
            let operands = offset + 1 + padding(offset);
            let low = read_i32(code, operands + 4)?;
            let high = read_i32(code, operands + 8)?;
            let count = (high as i64 - low as i64 + 1).max(0) as usize;
            1 + padding(offset) + 12 + count.checked_mul(4)?
        }
        LOOKUPSWITCH => {
            let operands = offset + 1 + padding(offset);
            let pairs = read_i32(code, operands + 4)?.max(0) as usize;
            1 + padding(offset) + 8 + pairs.checked_mul(8)?
        }
        0x00..=0xc9 => 1,
        _ => return None,
    };

    Some(length)
}

/// Switch operands start at the next multiple of four after the opcode.
fn padding(offset: usize) -> usize {
    (4 - (offset + 1) % 4) % 4
}

fn read_i32(code: &[u8], offset: usize) -> Option<i32> {
    code.get(offset..offset + 4).map(BigEndian::read_i32)
}
