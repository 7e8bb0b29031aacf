//! RV32I major opcodes (bits 6-0) and fixed instruction words.

/// Immediate arithmetic instructions (ADDI, ANDI, SLLI, etc.).
pub const OP_IMM: u32 = 0b0010011;

/// Jump and Link (JAL).
pub const OP_JAL: u32 = 0b1101111;

/// Mask selecting the major opcode.
pub const OPCODE_MASK: u32 = 0x7F;

/// Canonical no-op: `addi x0, x0, 0`.
pub const NOP: u32 = 0x0000_0013;

/// First distinguishing instruction: `addi x1, x0, 5`.
pub const INSTR_A: u32 = 0x0050_0093;

/// Second distinguishing instruction: `addi x1, x0, 6`.
pub const INSTR_B: u32 = 0x0060_0093;
