//! Multicycle reference core.
//!
//! One instruction at a time: fetch, then `cpi - 1` edges of execution with the request
//! dropped and the address held, then retire and fetch the next one.

use crate::common::Logic;
use crate::hierarchy::{DesignNode, HierarchyNode};
use crate::isa::{Decoded, decode};
use crate::models::{RESET_VECTOR, RegisterFile, core_hierarchy, register_path};
use crate::sim::{CoreInputs, CoreOutputs, CoreUnderTest};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Fetch { requested: bool },
    Execute { inst: Decoded, remaining: u32 },
}

/// Non-pipelined core taking `cpi` edges per instruction.
#[derive(Clone, Debug)]
pub struct MulticycleCore {
    name: String,
    cpi: u32,
    hierarchy: HierarchyNode,
    regfile_path: String,
    regs: RegisterFile,
    pc: u64,
    state: State,
}

impl MulticycleCore {
    /// Creates a core taking `cpi` edges per instruction; values below two are raised to two.
    pub fn new(name: impl Into<String>, cpi: u32) -> Self {
        let name = name.into();
        Self {
            hierarchy: core_hierarchy(&name),
            regfile_path: register_path(&name),
            name,
            cpi: cpi.max(2),
            regs: RegisterFile::new(),
            pc: RESET_VECTOR,
            state: State::Fetch { requested: false },
        }
    }

    /// Edges per instruction.
    pub const fn cpi(&self) -> u32 {
        self.cpi
    }

    /// Architectural register file.
    pub const fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Applies the effect of `inst` and returns the next program counter.
    fn retire(&mut self, inst: Decoded) -> u64 {
        match inst {
            Decoded::Addi { rd, rs1, imm } => {
                let value = self.regs.add_immediate(rs1, imm);
                self.regs.write(rd, value);
                self.pc + 4
            }
            Decoded::Jal { rd, offset } => {
                self.regs.write(rd, Logic::Resolved(self.pc + 4));
                self.pc.wrapping_add(offset as u64) & u64::from(u32::MAX)
            }
            Decoded::Other => self.pc + 4,
        }
    }
}

impl CoreUnderTest for MulticycleCore {
    fn name(&self) -> &str {
        &self.name
    }

    fn rising_edge(&mut self, inputs: &CoreInputs) -> CoreOutputs {
        if inputs.in_reset() {
            self.pc = RESET_VECTOR;
            self.state = State::Fetch { requested: false };
            return CoreOutputs::RESET;
        }

        match (self.state, inputs.fetched_word()) {
            (State::Fetch { requested: true }, Some(word)) => {
                self.state = State::Execute {
                    inst: decode(word),
                    remaining: self.cpi - 1,
                };
                CoreOutputs::idle(self.pc)
            }
            (State::Fetch { .. }, _) => {
                self.state = State::Fetch { requested: true };
                CoreOutputs::fetch(self.pc)
            }
            (State::Execute { inst, remaining }, _) => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.pc = self.retire(inst);
                    self.state = State::Fetch { requested: true };
                    CoreOutputs::fetch(self.pc)
                } else {
                    self.state = State::Execute { inst, remaining };
                    CoreOutputs::idle(self.pc)
                }
            }
        }
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
