//! Probe-wide constants.
//!
//! Offsets are relative to the first address the core fetches after reset. The straight-line
//! body is fixed at seven words between `loop_start` and the branch, so the layout never
//! depends on the core.

/// Offset of the loop entry from the start address (third word).
pub const LOOP_START_OFFSET: u64 = 8;

/// Offset of the backward jump from the start address.
pub const BRANCH_OFFSET: u64 = 32;

/// Offset of the word executed once looping stops.
pub const FINISH_OFFSET: u64 = 36;

/// Width of one instruction word in bytes.
pub const INSTRUCTION_BYTES: u64 = 4;

/// Highest address representable on the 32-bit fetch bus.
pub const ADDRESS_LIMIT: u64 = u32::MAX as u64;

/// Architectural register written by the distinguishing instructions (`x1`).
pub const PROBE_REGISTER: usize = 1;

/// Label value written for anything the probe could not determine.
pub const UNDETECTED: &str = "Undetected";
