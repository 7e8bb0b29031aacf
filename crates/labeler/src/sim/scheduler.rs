//! Cooperative edge scheduler.
//!
//! The scheduler is the clock. On every rising edge it:
//! 1. **Latches** the bus so every party sees the same sampled values.
//! 2. **Steps the core** with the latched inputs and publishes its outputs.
//! 3. **Resumes tasks** in registration order; background tasks first, then the main task.
//!
//! A task suspends by returning from [`Process::on_edge`]; returning
//! [`TaskState::Finished`] drops it from the ready set. When the main task finishes, all
//! remaining tasks are dropped, which is how background tasks are cancelled.

use std::fmt;

use tracing::{debug, trace};

use crate::common::{Logic, ProbeError, SimError};
use crate::sim::dut::{CoreInputs, CoreUnderTest};
use crate::sim::signals::{Driver, FetchRequest, SignalBus, SignalId};

/// Signals driven by the core under test.
const CORE_OUTPUTS: [SignalId; 4] = [
    SignalId::FetchCycle,
    SignalId::FetchStrobe,
    SignalId::FetchWriteEnable,
    SignalId::FetchAddress,
];

/// Identifier of a scheduled task, in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

/// Result of resuming a task for one edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Resume again at the next edge.
    Running,
    /// Remove from the ready set.
    Finished,
}

/// How a [`Scheduler::run`] call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The main task finished after `edges` edges.
    Completed {
        /// Edges simulated by this run.
        edges: u64,
    },
    /// The edge budget ran out before the main task finished.
    Exhausted {
        /// Edges simulated by this run.
        edges: u64,
    },
}

/// A cooperatively scheduled testbench process.
pub trait Process {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Signals this process drives; claimed when it is registered.
    fn drives(&self) -> &[SignalId];

    /// Drives initial values before the first edge.
    ///
    /// # Errors
    ///
    /// Propagates signal ownership violations.
    fn start(&mut self, ctx: &mut EdgeContext<'_>) -> Result<(), ProbeError> {
        let _ = ctx;
        Ok(())
    }

    /// Runs the process for one rising edge.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole run.
    fn on_edge(&mut self, ctx: &mut EdgeContext<'_>) -> Result<TaskState, ProbeError>;
}

/// What a task can see and touch during one edge.
pub struct EdgeContext<'a> {
    cycle: u64,
    driver: Driver,
    bus: &'a mut SignalBus,
    core: &'a dyn CoreUnderTest,
}

impl EdgeContext<'_> {
    /// Index of the current edge; `0` before the first edge.
    #[inline]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Settled value of `signal`.
    #[inline]
    pub const fn read(&self, signal: SignalId) -> Logic {
        self.bus.read(signal)
    }

    /// Value of `signal` latched at this edge.
    #[inline]
    pub const fn sampled(&self, signal: SignalId) -> Logic {
        self.bus.sampled(signal)
    }

    /// Settled request half of the fetch bus.
    pub const fn request(&self) -> FetchRequest {
        self.bus.request()
    }

    /// Request half of the fetch bus latched at this edge.
    pub const fn sampled_request(&self) -> FetchRequest {
        self.bus.sampled_request()
    }

    /// Drives a signal owned by this task.
    ///
    /// # Errors
    ///
    /// [`SimError`] if the task does not own `signal`.
    pub fn drive(&mut self, signal: SignalId, value: impl Into<Logic>) -> Result<(), SimError> {
        self.bus.drive(self.driver, signal, value.into())
    }

    /// The core under test, for hierarchy and register reads.
    pub fn core(&self) -> &dyn CoreUnderTest {
        self.core
    }
}

impl fmt::Debug for EdgeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeContext")
            .field("cycle", &self.cycle)
            .field("driver", &self.driver)
            .field("core", &self.core.name())
            .finish_non_exhaustive()
    }
}

struct Task {
    id: TaskId,
    process: Box<dyn Process>,
}

/// Discrete-event scheduler driving one core instance.
pub struct Scheduler<'c> {
    core: &'c mut dyn CoreUnderTest,
    bus: SignalBus,
    tasks: Vec<Task>,
    next_id: usize,
    cycle: u64,
}

impl<'c> Scheduler<'c> {
    /// Creates a scheduler for `core` and hands it the request half of the bus.
    ///
    /// # Errors
    ///
    /// Never fails on a fresh bus; the signature mirrors [`SignalBus::claim`].
    pub fn new(core: &'c mut dyn CoreUnderTest) -> Result<Self, SimError> {
        let mut bus = SignalBus::new();
        for signal in CORE_OUTPUTS {
            bus.claim(Driver::Core, signal)?;
        }
        Ok(Self {
            core,
            bus,
            tasks: Vec::new(),
            next_id: 0,
            cycle: 0,
        })
    }

    /// Number of edges simulated so far.
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Number of live background tasks.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Registers a background task that runs until it finishes or the main task ends.
    ///
    /// # Errors
    ///
    /// Signal ownership conflicts and errors from [`Process::start`].
    pub fn spawn(&mut self, mut process: Box<dyn Process>) -> Result<TaskId, ProbeError> {
        let id = self.register(process.as_mut())?;
        debug!(task = process.name(), id = id.0, "spawned");
        self.tasks.push(Task { id, process });
        Ok(id)
    }

    /// Runs edges until `main` finishes or `max_edges` edges have elapsed.
    ///
    /// `main` is resumed after every background task on each edge. Once it finishes, the
    /// remaining background tasks are cancelled.
    ///
    /// # Errors
    ///
    /// The first error returned by any process or by a bus access.
    pub fn run(&mut self, main: &mut dyn Process, max_edges: u64) -> Result<RunOutcome, ProbeError> {
        let main_id = self.register(main)?;
        for edges in 1..=max_edges {
            if self.edge(main_id, main)? == TaskState::Finished {
                self.cancel_all();
                return Ok(RunOutcome::Completed { edges });
            }
        }
        debug!(task = main.name(), max_edges, "edge budget exhausted");
        Ok(RunOutcome::Exhausted { edges: max_edges })
    }

    fn register(&mut self, process: &mut dyn Process) -> Result<TaskId, ProbeError> {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        let driver = Driver::Task(id);
        for &signal in process.drives() {
            self.bus.claim(driver, signal)?;
        }
        let mut ctx = EdgeContext {
            cycle: self.cycle,
            driver,
            bus: &mut self.bus,
            core: &*self.core,
        };
        process.start(&mut ctx)?;
        Ok(id)
    }

    fn edge(&mut self, main_id: TaskId, main: &mut dyn Process) -> Result<TaskState, ProbeError> {
        self.cycle += 1;
        self.bus.latch();

        let inputs = CoreInputs {
            reset_n: self.bus.sampled(SignalId::ResetN),
            acknowledge: self.bus.sampled(SignalId::FetchAcknowledge),
            data_in: self.bus.sampled(SignalId::FetchDataIn),
        };
        let outputs = self.core.rising_edge(&inputs);
        self.bus.drive(Driver::Core, SignalId::FetchCycle, outputs.cycle)?;
        self.bus.drive(Driver::Core, SignalId::FetchStrobe, outputs.strobe)?;
        self.bus
            .drive(Driver::Core, SignalId::FetchWriteEnable, outputs.write_enable)?;
        self.bus.drive(Driver::Core, SignalId::FetchAddress, outputs.address)?;
        trace!(cycle = self.cycle, address = %outputs.address, "edge");

        let mut index = 0;
        while index < self.tasks.len() {
            let task = &mut self.tasks[index];
            let mut ctx = EdgeContext {
                cycle: self.cycle,
                driver: Driver::Task(task.id),
                bus: &mut self.bus,
                core: &*self.core,
            };
            let state = task.process.on_edge(&mut ctx)?;
            match state {
                TaskState::Running => index += 1,
                TaskState::Finished => {
                    let task = self.tasks.remove(index);
                    debug!(task = task.process.name(), cycle = self.cycle, "finished");
                }
            }
        }

        let mut ctx = EdgeContext {
            cycle: self.cycle,
            driver: Driver::Task(main_id),
            bus: &mut self.bus,
            core: &*self.core,
        };
        main.on_edge(&mut ctx)
    }

    fn cancel_all(&mut self) {
        for task in self.tasks.drain(..) {
            debug!(task = task.process.name(), cycle = self.cycle, "cancelled");
        }
    }
}

impl fmt::Debug for Scheduler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tasks: Vec<&str> = self.tasks.iter().map(|t| t.process.name()).collect();
        f.debug_struct("Scheduler")
            .field("core", &self.core.name())
            .field("cycle", &self.cycle)
            .field("tasks", &tasks)
            .finish_non_exhaustive()
    }
}
