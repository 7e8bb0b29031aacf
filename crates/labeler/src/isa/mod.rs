//! Instruction encodings used by the probe program.
//!
//! The probe only needs three instruction shapes: `addi` (I-type) for the distinguishing
//! writes, `jal` (J-type) for the backward jump, and the canonical `nop`. The decoder covers
//! the same subset for the reference cores.

/// Instruction decoding for the reference cores.
pub mod decode;
/// Instruction encoding (`addi`, `jal`).
pub mod encode;
/// Major opcodes and fixed instruction words.
pub mod opcodes;

pub use decode::{Decoded, decode};
pub use encode::{encode_addi, encode_jal};
