//! Pipelined reference core.
//!
//! An instruction whose fetch completes on edge `N` occupies stage `k` on edge `N + k`.
//! `addi` writes back in the last stage, so with depth `d` the write lands on edge
//! `N + d - 1`. `jal` redirects fetch from stage `min(2, d - 1)` and squashes everything
//! younger. Fetch never stops; a new request goes out every edge.

use std::collections::VecDeque;

use tracing::trace;

use crate::common::Logic;
use crate::hierarchy::{DesignNode, HierarchyNode};
use crate::isa::{Decoded, decode};
use crate::models::{RESET_VECTOR, RegisterFile, core_hierarchy, register_path};
use crate::sim::{CoreInputs, CoreOutputs, CoreUnderTest};

/// Stage in which jumps resolve on deep pipelines (execute of a classic five-stage design).
const JUMP_RESOLVE_STAGE: usize = 2;

/// Instruction in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Slot {
    pc: u64,
    inst: Decoded,
}

/// In-order pipelined core of configurable depth.
#[derive(Clone, Debug)]
pub struct PipelinedCore {
    name: String,
    depth: usize,
    hierarchy: HierarchyNode,
    regfile_path: String,
    regs: RegisterFile,
    fetch_pc: u64,
    requested: Option<u64>,
    stages: VecDeque<Option<Slot>>,
}

impl PipelinedCore {
    /// Creates a core with `depth` stages; a depth of zero is treated as one.
    pub fn new(name: impl Into<String>, depth: usize) -> Self {
        let name = name.into();
        let depth = depth.max(1);
        Self {
            hierarchy: core_hierarchy(&name),
            regfile_path: register_path(&name),
            name,
            depth,
            regs: RegisterFile::new(),
            fetch_pc: RESET_VECTOR,
            requested: None,
            stages: VecDeque::from(vec![None; depth]),
        }
    }

    /// A single-cycle core: fetch and write-back on the same edge.
    pub fn single_cycle(name: impl Into<String>) -> Self {
        Self::new(name, 1)
    }

    /// Number of stages.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Architectural register file.
    pub const fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    fn resolve_stage(&self) -> usize {
        JUMP_RESOLVE_STAGE.min(self.depth - 1)
    }

    fn reset(&mut self) {
        self.fetch_pc = RESET_VECTOR;
        self.requested = None;
        self.stages.iter_mut().for_each(|slot| *slot = None);
    }
}

impl CoreUnderTest for PipelinedCore {
    fn name(&self) -> &str {
        &self.name
    }

    fn rising_edge(&mut self, inputs: &CoreInputs) -> CoreOutputs {
        if inputs.in_reset() {
            self.reset();
            return CoreOutputs::RESET;
        }

        let fetched = inputs.fetched_word().zip(self.requested).map(|(word, pc)| {
            trace!(
                core = %self.name,
                pc = format_args!("{pc:#010x}"),
                word = format_args!("{word:#010x}"),
                "fetched"
            );
            Slot {
                pc,
                inst: decode(word),
            }
        });
        let _ = self.stages.pop_back();
        self.stages.push_front(fetched);
        if let Some(slot) = fetched {
            self.fetch_pc = slot.pc + 4;
        }

        let resolve = self.resolve_stage();
        if let Some(Some(Slot {
            pc,
            inst: Decoded::Jal { offset, .. },
        })) = self.stages.get(resolve).copied()
        {
            self.fetch_pc = pc.wrapping_add(offset as u64) & u64::from(u32::MAX);
            self.stages.iter_mut().take(resolve).for_each(|slot| *slot = None);
        }

        if let Some(Some(slot)) = self.stages.back().copied() {
            match slot.inst {
                Decoded::Addi { rd, rs1, imm } => {
                    let value = self.regs.add_immediate(rs1, imm);
                    self.regs.write(rd, value);
                }
                Decoded::Jal { rd, .. } => self.regs.write(rd, Logic::Resolved(slot.pc + 4)),
                Decoded::Other => {}
            }
        }

        self.requested = Some(self.fetch_pc);
        CoreOutputs::fetch(self.fetch_pc)
    }

    fn hierarchy(&self) -> &dyn DesignNode {
        &self.hierarchy
    }

    fn read_element(&self, path: &str, index: usize) -> Logic {
        if path == self.regfile_path {
            self.regs.read(index)
        } else {
            Logic::Unresolved
        }
    }
}
