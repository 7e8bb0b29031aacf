//! Behavioral reference cores.
//!
//! These cores speak the fetch bus with the same timing a synthesized design would and are
//! what the CLI and the tests probe. They provide:
//! 1. **Pipelined core:** Configurable depth; depth one is a single-cycle core.
//! 2. **Multicycle core:** Configurable cycles per instruction.
//! 3. **Register file:** A tri-state register bank exposed through the design hierarchy.
//!
//! Only `addi` and `jal` have an effect; every other word executes as a no-op.

/// Multicycle reference core.
pub mod multicycle;
/// Pipelined reference core.
pub mod pipelined;

pub use multicycle::MulticycleCore;
pub use pipelined::PipelinedCore;

use crate::common::Logic;
use crate::hierarchy::HierarchyNode;

/// Address the reference cores fetch first after reset.
pub const RESET_VECTOR: u64 = 0x8000_0000;

/// Number of architectural registers.
const REGISTER_COUNT: usize = 32;

/// Register width of the reference cores.
const XLEN: u32 = 32;

/// Register bank of a reference core.
///
/// Registers power up unresolved, except `x0` which is hardwired to zero. Reset does not
/// clear the bank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [Logic; REGISTER_COUNT],
}

impl RegisterFile {
    /// Creates a register file with every register unresolved and `x0` zero.
    pub fn new() -> Self {
        let mut regs = [Logic::Unresolved; REGISTER_COUNT];
        regs[0] = Logic::LOW;
        Self { regs }
    }

    /// Reads register `idx`; indices past `x31` read unresolved.
    pub fn read(&self, idx: usize) -> Logic {
        self.regs.get(idx).copied().unwrap_or(Logic::Unresolved)
    }

    /// Writes register `idx`, truncated to the register width. Writes to `x0` are ignored.
    pub fn write(&mut self, idx: usize, value: Logic) {
        if idx == 0 {
            return;
        }
        if let Some(slot) = self.regs.get_mut(idx) {
            *slot = match value {
                Logic::Resolved(v) => Logic::Resolved(v & u64::from(u32::MAX)),
                Logic::Unresolved => Logic::Unresolved,
            };
        }
    }

    /// Result of `addi` on register `rs1`; unresolved sources give unresolved results.
    pub fn add_immediate(&self, rs1: usize, imm: i64) -> Logic {
        match self.read(rs1) {
            Logic::Resolved(v) => Logic::Resolved(v.wrapping_add(imm as u64)),
            Logic::Unresolved => Logic::Unresolved,
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Hierarchy shared by the reference cores: `<name>.core.regfile.regs` plus `<name>.core.pc`.
fn core_hierarchy(name: &str) -> HierarchyNode {
    HierarchyNode::module(
        name,
        vec![HierarchyNode::module(
            "core",
            vec![
                HierarchyNode::signal("pc", XLEN),
                HierarchyNode::module(
                    "regfile",
                    vec![HierarchyNode::array("regs", REGISTER_COUNT, XLEN)],
                ),
            ],
        )],
    )
}

/// Hierarchical path of the register array inside [`core_hierarchy`].
fn register_path(name: &str) -> String {
    format!("{name}.core.regfile.regs")
}
