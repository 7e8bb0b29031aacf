//! Simulation kernel.
//!
//! This module provides the discrete-event machinery the probe runs on:
//! 1. **Signals:** The fetch-bus signal table with single-driver ownership.
//! 2. **Core under test:** The trait a simulation binding implements for one core.
//! 3. **Scheduler:** The clock; resumes every task once per rising edge in registration order.

/// Core-under-test trait and its pin bundles.
pub mod dut;
/// Cooperative edge scheduler and process trait.
pub mod scheduler;
/// Signal identifiers, drivers and the signal bus.
pub mod signals;

pub use dut::{CoreInputs, CoreOutputs, CoreUnderTest};
pub use scheduler::{EdgeContext, Process, RunOutcome, Scheduler, TaskId, TaskState};
pub use signals::{Driver, FetchRequest, SignalBus, SignalId};
