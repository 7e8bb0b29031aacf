//! Instruction decoding for the reference cores.
//!
//! Only `addi` and `jal` carry meaning for the probe; every other word decodes to
//! [`Decoded::Other`] and behaves as a no-op in the models.

use crate::isa::opcodes::{OP_IMM, OP_JAL, OPCODE_MASK};

/// Bit shift for the I-type immediate (bits 31-20).
const I_IMM_SHIFT: u32 = 20;

/// Funct3 value selecting ADDI within `OP_IMM`.
const FUNCT3_ADDI: u32 = 0b000;

/// Decoded form of an instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// `addi rd, rs1, imm`.
    Addi {
        /// Destination register.
        rd: usize,
        /// Source register.
        rs1: usize,
        /// Sign-extended immediate.
        imm: i64,
    },
    /// `jal rd, offset`.
    Jal {
        /// Link register.
        rd: usize,
        /// Sign-extended byte offset.
        offset: i64,
    },
    /// Anything else.
    Other,
}

/// Decodes a 32-bit instruction word.
pub fn decode(inst: u32) -> Decoded {
    let rd = ((inst >> 7) & 0x1F) as usize;
    match inst & OPCODE_MASK {
        OP_IMM if (inst >> 12) & 0x7 == FUNCT3_ADDI => Decoded::Addi {
            rd,
            rs1: ((inst >> 15) & 0x1F) as usize,
            imm: i64::from((inst as i32) >> I_IMM_SHIFT),
        },
        OP_JAL => Decoded::Jal {
            rd,
            offset: decode_j_type_imm(inst),
        },
        _ => Decoded::Other,
    }
}

/// Decodes the immediate value for J-Type instructions.
///
/// J-Type format: `imm[20] | imm[10:1] | imm[11] | imm[19:12] | rd | opcode`
pub fn decode_j_type_imm(inst: u32) -> i64 {
    let bits_19_12 = (inst >> 12) & 0xFF;
    let bit_11 = (inst >> 20) & 0x1;
    let bits_10_1 = (inst >> 21) & 0x3FF;
    let bit_20 = (inst >> 31) & 0x1;

    let combined = (bit_20 << 20) | (bits_19_12 << 12) | (bit_11 << 11) | (bits_10_1 << 1);
    sign_extend(combined, 21)
}

/// Sign extends a value of `bits` width to a 64-bit signed integer.
fn sign_extend(val: u32, bits: u32) -> i64 {
    let shift = 32 - bits;
    i64::from(((val as i32) << shift) >> shift)
}
