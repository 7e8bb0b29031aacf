//! Instruction encoding.
//!
//! J-format layout: `imm[20] | imm[10:1] | imm[11] | imm[19:12] | rd | opcode`.
//! The immediate is a signed byte offset with bit 0 implied zero, giving a range of
//! `-(1 << 20) ..= (1 << 20) - 2`.

use crate::common::EncodeError;
use crate::isa::opcodes::{OP_IMM, OP_JAL};

/// Width of the J-format immediate including the sign bit.
const J_IMM_BITS: u32 = 21;

/// Width of the I-format immediate.
const I_IMM_BITS: u32 = 12;

/// Number of architectural integer registers.
const REGISTER_COUNT: u32 = 32;

/// Encodes `jal rd, offset`.
///
/// # Arguments
///
/// * `offset` - Signed byte distance from the jump to its target.
/// * `rd` - Link register (`0` discards the return address).
///
/// # Errors
///
/// [`EncodeError::JumpOutOfRange`] when `offset` does not fit 21 signed bits,
/// [`EncodeError::MisalignedJump`] for odd offsets, and
/// [`EncodeError::InvalidRegister`] for `rd > 31`.
pub fn encode_jal(offset: i64, rd: u32) -> Result<u32, EncodeError> {
    let limit = 1_i64 << (J_IMM_BITS - 1);
    if !(-limit..limit).contains(&offset) {
        return Err(EncodeError::JumpOutOfRange { offset });
    }
    if offset & 1 != 0 {
        return Err(EncodeError::MisalignedJump { offset });
    }
    if rd >= REGISTER_COUNT {
        return Err(EncodeError::InvalidRegister(rd));
    }

    let imm = (offset as u32) & ((1 << J_IMM_BITS) - 1);
    let imm20 = (imm >> 20) & 0x1;
    let imm10_1 = (imm >> 1) & 0x3FF;
    let imm11 = (imm >> 11) & 0x1;
    let imm19_12 = (imm >> 12) & 0xFF;

    Ok((imm20 << 31) | (imm10_1 << 21) | (imm11 << 20) | (imm19_12 << 12) | (rd << 7) | OP_JAL)
}

/// Encodes `addi rd, rs1, imm`.
///
/// # Errors
///
/// [`EncodeError::InvalidRegister`] for register indices above 31. The immediate is
/// truncated to its low 12 bits, the way an assembler's `%lo` would.
pub fn encode_addi(rd: u32, rs1: u32, imm: i32) -> Result<u32, EncodeError> {
    if rd >= REGISTER_COUNT {
        return Err(EncodeError::InvalidRegister(rd));
    }
    if rs1 >= REGISTER_COUNT {
        return Err(EncodeError::InvalidRegister(rs1));
    }
    let imm = (imm as u32) & ((1 << I_IMM_BITS) - 1);
    Ok((imm << 20) | (rs1 << 15) | (rd << 7) | OP_IMM)
}
