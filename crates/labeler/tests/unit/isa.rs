//! Instruction encoding tests.
//!
//! Covers the `jal` J-format packing (range, alignment, register checks), the fixed
//! `addi` words of the probe program, and the decoder used by the reference cores.

use corelabel_core::common::EncodeError;
use corelabel_core::isa::decode::decode_j_type_imm;
use corelabel_core::isa::opcodes::{INSTR_A, INSTR_B, NOP, OP_JAL, OPCODE_MASK};
use corelabel_core::isa::{Decoded, decode, encode_addi, encode_jal};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

// ══════════════════════════════════════════════════════════
// 1. JAL encoding
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::loop_back(-24, 0xfe9f_f06f)]
#[case::self_loop_minus_four(-4, 0xffdf_f06f)]
#[case::forward_eight(8, 0x0080_006f)]
#[case::forward_thirty_two(0x20, 0x0200_006f)]
fn jal_known_words(#[case] offset: i64, #[case] word: u32) {
    assert_eq!(encode_jal(offset, 0), Ok(word));
}

#[test]
fn jal_range_edges() {
    let limit = 1_i64 << 20;
    assert!(encode_jal(-limit, 0).is_ok(), "most negative offset fits");
    assert!(encode_jal(limit - 2, 0).is_ok(), "largest even positive offset fits");
    assert_eq!(
        encode_jal(limit, 0),
        Err(EncodeError::JumpOutOfRange { offset: limit })
    );
    assert_eq!(
        encode_jal(-limit - 2, 0),
        Err(EncodeError::JumpOutOfRange {
            offset: -limit - 2
        })
    );
}

#[test]
fn jal_rejects_odd_offsets() {
    assert_eq!(
        encode_jal(-23, 0),
        Err(EncodeError::MisalignedJump { offset: -23 })
    );
}

#[test]
fn jal_rejects_bad_link_register() {
    assert_eq!(encode_jal(8, 32), Err(EncodeError::InvalidRegister(32)));
}

#[test]
fn jal_places_link_register() {
    let word = encode_jal(8, 1).unwrap();
    assert_eq!((word >> 7) & 0x1F, 1);
    assert_eq!(word & OPCODE_MASK, OP_JAL);
}

proptest! {
    #[test]
    fn jal_immediate_survives_decoding(half in -(1_i64 << 19)..(1_i64 << 19)) {
        let offset = half * 2;
        let word = encode_jal(offset, 0).unwrap();
        prop_assert_eq!(word & OPCODE_MASK, OP_JAL);
        prop_assert_eq!(decode_j_type_imm(word), offset);
    }
}

// ══════════════════════════════════════════════════════════
// 2. ADDI and fixed words
// ══════════════════════════════════════════════════════════

#[test]
fn distinguishing_words_are_addi_x1() {
    assert_eq!(encode_addi(1, 0, 5), Ok(INSTR_A));
    assert_eq!(encode_addi(1, 0, 6), Ok(INSTR_B));
    assert_eq!(encode_addi(0, 0, 0), Ok(NOP));
}

#[test]
fn addi_rejects_bad_registers() {
    assert_eq!(encode_addi(40, 0, 1), Err(EncodeError::InvalidRegister(40)));
    assert_eq!(encode_addi(1, 33, 1), Err(EncodeError::InvalidRegister(33)));
}

#[test]
fn addi_negative_immediate_round_trips() {
    let word = encode_addi(3, 2, -1).unwrap();
    assert_eq!(
        decode(word),
        Decoded::Addi {
            rd: 3,
            rs1: 2,
            imm: -1
        }
    );
}

// ══════════════════════════════════════════════════════════
// 3. Decoding
// ══════════════════════════════════════════════════════════

#[test]
fn decode_probe_words() {
    assert_eq!(
        decode(INSTR_A),
        Decoded::Addi {
            rd: 1,
            rs1: 0,
            imm: 5
        }
    );
    assert_eq!(
        decode(0xfe9f_f06f),
        Decoded::Jal {
            rd: 0,
            offset: -24
        }
    );
}

#[test]
fn decode_unknown_is_other() {
    // lw x1, 0(x2)
    assert_eq!(decode(0x0001_2083), Decoded::Other);
    // slti x1, x0, 5 shares OP_IMM but not the ADDI funct3
    assert_eq!(decode(0x0050_2093), Decoded::Other);
}
