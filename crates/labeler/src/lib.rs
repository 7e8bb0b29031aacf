//! Bus-level microarchitecture classifier for simulated CPU cores.
//!
//! This crate drives a core under test through a cycle-accurate simulation and labels it from
//! what it does on its instruction-fetch bus. It contains:
//! 1. **Simulation:** A single-driver signal bus and a cooperative, edge-driven scheduler.
//! 2. **ISA:** The handful of RV32I encodings the probe program needs (`addi`, `jal`, `nop`).
//! 3. **Probe:** Program synthesis, the fetch-bus responder, trace recording and classification.
//! 4. **Hierarchy:** A typed design tree with register-file and data-width discovery.
//! 5. **Labels:** A non-destructive JSON labels store keyed by processor name.
//! 6. **Models:** Behavioral single-cycle, multicycle and pipelined reference cores.

/// Common types (logic values, errors, constants).
pub mod common;
/// Probe configuration (defaults, hierarchical config structures).
pub mod config;
/// Design hierarchy abstraction and register-file/width discovery.
pub mod hierarchy;
/// Instruction encodings used by the probe program.
pub mod isa;
/// Labels store (result sink) and run environment.
pub mod labels;
/// Behavioral reference cores speaking the fetch bus.
pub mod models;
/// Probe engine: program, responder, recorder, classifier, testbench.
pub mod probe;
/// Simulation kernel: signals, scheduler, core-under-test trait.
pub mod sim;
/// Per-run probe statistics.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Tri-state signal value.
pub use crate::common::Logic;
/// Probe entry points and their report.
pub use crate::probe::{ProbeReport, Verdict, label_core, probe_core, probe_or_undetermined};
/// Trait implemented by every simulated core.
pub use crate::sim::CoreUnderTest;
