//! Probe program synthesis.
//!
//! The program is laid out relative to the first address the core fetches after reset:
//!
//! | Address          | Word                                   |
//! |------------------|----------------------------------------|
//! | `start`          | `addi x1, x0, 5`                       |
//! | `start + 4`      | `addi x1, x0, 6`                       |
//! | `start + 8..32`  | `nop` (loop body)                      |
//! | `start + 32`     | `jal x0, loop_start - branch`          |
//! | `start + 36`     | `nop`                                  |
//! | anything else    | `nop`                                  |
//!
//! Once enough loop closures have been observed, the branch address serves a `nop` too and the
//! core falls through to `finish`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::common::ProbeError;
use crate::common::constants::{
    ADDRESS_LIMIT, BRANCH_OFFSET, FINISH_OFFSET, INSTRUCTION_BYTES, LOOP_START_OFFSET,
};
use crate::isa::encode_jal;
use crate::isa::opcodes::{INSTR_A, INSTR_B, NOP};

/// Addresses and the jump word of a synthesized probe program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgramLayout {
    /// First fetched address; holds the first distinguishing instruction.
    pub start: u64,
    /// Target of the backward jump.
    pub loop_start: u64,
    /// Address of the backward jump.
    pub branch: u64,
    /// Word executed once looping stops.
    pub finish: u64,
    /// `jal x0, loop_start - branch`.
    pub jump_back_word: u32,
}

impl ProgramLayout {
    /// Lays the program out around the first fetched address.
    ///
    /// # Arguments
    ///
    /// * `start` - Address of the first fetch the core issued after reset.
    ///
    /// # Errors
    ///
    /// [`ProbeError::AddressOverflow`] if `finish` does not fit the 32-bit fetch bus, and
    /// [`ProbeError::Configuration`] if the backward jump cannot be encoded.
    pub fn from_start(start: u64) -> Result<Self, ProbeError> {
        let finish = start
            .checked_add(FINISH_OFFSET)
            .filter(|&finish| finish <= ADDRESS_LIMIT)
            .ok_or(ProbeError::AddressOverflow(start))?;
        Self::new(start, start + LOOP_START_OFFSET, start + BRANCH_OFFSET, finish)
    }

    /// Builds a layout from explicit addresses and encodes its backward jump.
    ///
    /// # Errors
    ///
    /// [`ProbeError::AddressOverflow`] if any address exceeds the 32-bit fetch bus, and
    /// [`ProbeError::Configuration`] if `loop_start - branch` is not a valid J-format offset.
    pub fn new(start: u64, loop_start: u64, branch: u64, finish: u64) -> Result<Self, ProbeError> {
        if [start, loop_start, branch, finish]
            .iter()
            .any(|&address| address > ADDRESS_LIMIT)
        {
            return Err(ProbeError::AddressOverflow(start));
        }
        let offset = loop_start as i64 - branch as i64;
        let jump_back_word =
            encode_jal(offset, 0).map_err(|source| ProbeError::Configuration {
                start,
                loop_start,
                branch,
                source,
            })?;
        debug!(
            start = format_args!("{start:#010x}"),
            loop_start = format_args!("{loop_start:#010x}"),
            branch = format_args!("{branch:#010x}"),
            offset,
            jump = format_args!("{jump_back_word:#010x}"),
            "program layout"
        );
        Ok(Self {
            start,
            loop_start,
            branch,
            finish,
            jump_back_word,
        })
    }

    /// Builds the address-to-word mapping served by the responder.
    pub fn instruction_map(&self) -> InstructionMap {
        let mut words = BTreeMap::new();
        let _ = words.insert(self.start, INSTR_A);
        let _ = words.insert(self.start + INSTRUCTION_BYTES, INSTR_B);
        let mut address = self.loop_start;
        while address < self.branch {
            let _ = words.insert(address, NOP);
            address += INSTRUCTION_BYTES;
        }
        let _ = words.insert(self.branch, self.jump_back_word);
        let _ = words.insert(self.finish, NOP);
        InstructionMap {
            words,
            branch: self.branch,
        }
    }
}

/// Instruction memory of the probe program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionMap {
    words: BTreeMap<u64, u32>,
    branch: u64,
}

impl InstructionMap {
    /// Returns the word at `address`.
    ///
    /// Addresses outside the program read as `nop`. With `looping` false the branch address
    /// reads as `nop` as well.
    pub fn word_at(&self, address: u64, looping: bool) -> u32 {
        if address == self.branch && !looping {
            return NOP;
        }
        self.words.get(&address).copied().unwrap_or(NOP)
    }

    /// Number of explicitly placed words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// `true` if nothing has been placed.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
