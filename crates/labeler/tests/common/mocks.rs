use corelabel_core::common::{Logic, ProbeError};
use corelabel_core::hierarchy::{DesignNode, HierarchyNode};
use corelabel_core::sim::{CoreInputs, CoreOutputs, CoreUnderTest, EdgeContext, Process, SignalId, TaskState};
use std::cell::Cell;
use std::rc::Rc;

// ══════════════════════════════════════════════════════════
// Cores
// ══════════════════════════════════════════════════════════

/// A core that ignores the bus and walks a fixed address script.
///
/// Out of reset it asserts a fetch every edge. The first `unresolved` edges carry an
/// unresolved address; after that the address starts at `start` and advances by 4 every
/// `hold` edges. Register reads are always unresolved.
pub struct ScriptedCore {
    name: String,
    start: u64,
    hold: u64,
    unresolved: u64,
    edges_out_of_reset: u64,
    hierarchy: HierarchyNode,
}

impl ScriptedCore {
    pub fn stepping(name: &str, start: u64, hold: u64) -> Self {
        Self {
            name: name.to_owned(),
            start,
            hold: hold.max(1),
            unresolved: 0,
            edges_out_of_reset: 0,
            hierarchy: HierarchyNode::module(
                name,
                vec![HierarchyNode::module(
                    "rf",
                    vec![HierarchyNode::array("regs", 32, 32)],
                )],
            ),
        }
    }

    pub fn with_unresolved_prefix(mut self, edges: u64) -> Self {
        self.unresolved = edges;
        self
    }

    /// Replaces the hierarchy, e.g. with one that has no register file.
    pub fn with_hierarchy(mut self, hierarchy: HierarchyNode) -> Self {
        self.hierarchy = hierarchy;
        self
    }
}

impl CoreUnderTest for ScriptedCore {
    fn name(&self) -> &str {
        &self.name
    }

    fn rising_edge(&mut self, inputs: &CoreInputs) -> CoreOutputs {
        if inputs.in_reset() {
            self.edges_out_of_reset = 0;
            return CoreOutputs::RESET;
        }
        let n = self.edges_out_of_reset;
        self.edges_out_of_reset += 1;
        if n < self.unresolved {
            return CoreOutputs {
                address: Logic::Unresolved,
                ..CoreOutputs::fetch(0)
            };
        }
        let step = (n - self.unresolved) / self.hold;
        CoreOutputs::fetch(self.start + 4 * step)
    }

    fn hierarchy(&self) -> &dyn DesignNode {
        &self.hierarchy
    }

    fn read_element(&self, _path: &str, _index: usize) -> Logic {
        Logic::Unresolved
    }
}

/// Wraps a core and pins every register read to one value.
pub struct FrozenRegisters<C> {
    pub inner: C,
    pub value: Logic,
}

impl<C: CoreUnderTest> CoreUnderTest for FrozenRegisters<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn rising_edge(&mut self, inputs: &CoreInputs) -> CoreOutputs {
        self.inner.rising_edge(inputs)
    }

    fn hierarchy(&self) -> &dyn DesignNode {
        self.inner.hierarchy()
    }

    fn read_element(&self, _path: &str, _index: usize) -> Logic {
        self.value
    }
}

/// Wraps a core and records the inputs it sampled on every edge.
pub struct RecordingCore<C> {
    pub inner: C,
    pub inputs: Vec<CoreInputs>,
}

impl<C> RecordingCore<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            inputs: Vec::new(),
        }
    }
}

impl<C: CoreUnderTest> CoreUnderTest for RecordingCore<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn rising_edge(&mut self, inputs: &CoreInputs) -> CoreOutputs {
        self.inputs.push(*inputs);
        self.inner.rising_edge(inputs)
    }

    fn hierarchy(&self) -> &dyn DesignNode {
        self.inner.hierarchy()
    }

    fn read_element(&self, path: &str, index: usize) -> Logic {
        self.inner.read_element(path, index)
    }
}

// ══════════════════════════════════════════════════════════
// Processes
// ══════════════════════════════════════════════════════════

/// Main task that plays back a reset schedule, one entry per edge, then finishes.
///
/// `true` releases reset. Reset is driven low before the first edge.
pub struct ResetScript {
    schedule: Vec<bool>,
    edge: usize,
}

impl ResetScript {
    pub fn new(schedule: Vec<bool>) -> Self {
        Self { schedule, edge: 0 }
    }

    /// Builds a schedule from `(released, edges)` runs.
    pub fn runs(runs: &[(bool, usize)]) -> Self {
        let schedule = runs
            .iter()
            .flat_map(|&(level, edges)| std::iter::repeat_n(level, edges))
            .collect();
        Self::new(schedule)
    }
}

impl Process for ResetScript {
    fn name(&self) -> &str {
        "reset-script"
    }

    fn drives(&self) -> &[SignalId] {
        &[SignalId::ResetN]
    }

    fn start(&mut self, ctx: &mut EdgeContext<'_>) -> Result<(), ProbeError> {
        ctx.drive(SignalId::ResetN, false)?;
        Ok(())
    }

    fn on_edge(&mut self, ctx: &mut EdgeContext<'_>) -> Result<TaskState, ProbeError> {
        let Some(&level) = self.schedule.get(self.edge) else {
            return Ok(TaskState::Finished);
        };
        ctx.drive(SignalId::ResetN, level)?;
        self.edge += 1;
        Ok(if self.edge == self.schedule.len() {
            TaskState::Finished
        } else {
            TaskState::Running
        })
    }
}

/// Task that counts its edges and finishes after `limit` of them.
pub struct CountingTask {
    pub seen: Rc<Cell<u64>>,
    limit: u64,
}

impl CountingTask {
    pub fn new(limit: u64) -> Self {
        Self {
            seen: Rc::new(Cell::new(0)),
            limit,
        }
    }
}

impl Process for CountingTask {
    fn name(&self) -> &str {
        "counter"
    }

    fn drives(&self) -> &[SignalId] {
        &[]
    }

    fn on_edge(&mut self, _ctx: &mut EdgeContext<'_>) -> Result<TaskState, ProbeError> {
        self.seen.set(self.seen.get() + 1);
        Ok(if self.seen.get() >= self.limit {
            TaskState::Finished
        } else {
            TaskState::Running
        })
    }
}

/// Task that drives a signal without claiming it.
pub struct RogueDriver {
    pub signal: SignalId,
}

impl Process for RogueDriver {
    fn name(&self) -> &str {
        "rogue"
    }

    fn drives(&self) -> &[SignalId] {
        &[]
    }

    fn on_edge(&mut self, ctx: &mut EdgeContext<'_>) -> Result<TaskState, ProbeError> {
        ctx.drive(self.signal, true)?;
        Ok(TaskState::Running)
    }
}

/// Task that claims a fixed set of signals and never drives them.
pub struct Claimer {
    pub signals: Vec<SignalId>,
}

impl Process for Claimer {
    fn name(&self) -> &str {
        "claimer"
    }

    fn drives(&self) -> &[SignalId] {
        &self.signals
    }

    fn on_edge(&mut self, _ctx: &mut EdgeContext<'_>) -> Result<TaskState, ProbeError> {
        Ok(TaskState::Running)
    }
}
