//! Probe engine.
//!
//! This module ties the probe together. It provides:
//! 1. **Program:** Layout and instruction map synthesized from the first fetch.
//! 2. **Responder:** The background task playing instruction memory.
//! 3. **Recorder:** Per-edge program-counter and register samples.
//! 4. **Classifier:** Interval test and latency probe.
//! 5. **Testbench:** The main task sequencing reset, observation and measurement.
//!
//! [`probe_core`] runs one core and returns a [`ProbeReport`]; [`label_core`] additionally
//! persists the verdict to a [`LabelStore`].

/// Interval test and latency measurement.
pub mod classifier;
/// Program layout and instruction map.
pub mod program;
/// Program-counter trace recording.
pub mod recorder;
/// Instruction-memory responder task.
pub mod responder;
/// Main probe task.
pub mod testbench;

use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tracing::{info, warn};

use crate::common::ProbeError;
use crate::config::Config;
use crate::hierarchy::{detect_data_width, resolve_register_file};
use crate::labels::LabelStore;
use crate::sim::{CoreUnderTest, RunOutcome, Scheduler};
use crate::stats::ProbeStats;

pub use classifier::{Candidate, LatencyProbe, LatencyStatus, classify_intervals};
pub use program::{InstructionMap, ProgramLayout};
pub use recorder::{TraceEvent, TraceRecorder, pc_change_intervals};
pub use responder::{FetchMonitor, Responder};
pub use testbench::ProbeSequence;

/// Microarchitecture label of a core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    /// More than one edge per instruction.
    Multicycle,
    /// One instruction per edge, written back on the edge it is fetched.
    SingleCycle,
    /// One instruction per edge with a fetch-to-writeback depth of at least two.
    Pipelined {
        /// Fetch-to-writeback depth in edges.
        depth: u64,
    },
    /// The probe could not decide.
    Undetermined,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Multicycle => f.write_str("multicycle"),
            Self::SingleCycle => f.write_str("single-cycle"),
            Self::Pipelined { depth } => write!(f, "pipelined (depth {depth})"),
            Self::Undetermined => f.write_str("undetermined"),
        }
    }
}

/// Everything a probe run found out about one core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    /// Processor name.
    pub processor: String,
    /// Detected data width.
    pub bits: Option<u32>,
    /// Classification.
    pub verdict: Verdict,
    /// Run statistics.
    pub stats: ProbeStats,
}

impl ProbeReport {
    /// Report for a core that could not be probed.
    pub fn undetermined(processor: impl Into<String>, bits: Option<u32>) -> Self {
        Self {
            processor: processor.into(),
            bits,
            verdict: Verdict::Undetermined,
            stats: ProbeStats::default(),
        }
    }
}

/// Probes one core.
///
/// Discovers the register file and the data width, then runs the responder and the probe
/// sequence until the sequence finishes or `config.bench.max_edges` edges have elapsed. An
/// exhausted edge budget yields [`Verdict::Undetermined`].
///
/// # Arguments
///
/// * `core` - Core under test; it is reset by the probe.
/// * `config` - Run configuration.
///
/// # Errors
///
/// [`ProbeError::RegisterFileNotFound`] if discovery fails, and the fatal configuration
/// errors of [`ProgramLayout::from_start`].
pub fn probe_core(core: &mut dyn CoreUnderTest, config: &Config) -> Result<ProbeReport, ProbeError> {
    let processor = core.name().to_owned();
    let bits = detect_data_width(core.hierarchy());
    let register_file = resolve_register_file(core.hierarchy())
        .ok_or_else(|| ProbeError::RegisterFileNotFound(processor.clone()))?;
    info!(
        core = %processor,
        register_file = %register_file.path,
        bits = ?bits,
        "probing"
    );

    let monitor = Rc::new(FetchMonitor::new());
    let mut sequence = ProbeSequence::new(config, register_file, Rc::clone(&monitor));
    let mut scheduler = Scheduler::new(core)?;
    let _ = scheduler.spawn(Box::new(Responder::new(
        config.responder.clone(),
        Rc::clone(&monitor),
    )))?;
    let outcome = scheduler.run(&mut sequence, config.bench.max_edges)?;

    let (edges, verdict) = match outcome {
        RunOutcome::Completed { edges } => {
            (edges, sequence.verdict().unwrap_or(Verdict::Undetermined))
        }
        RunOutcome::Exhausted { edges } => {
            warn!(core = %processor, edges, "edge budget exhausted before a verdict");
            (edges, Verdict::Undetermined)
        }
    };

    let (issue_cycle, write_cycle) = match sequence.latency() {
        Some(LatencyStatus::Measured { issue, write }) => (Some(issue), Some(write)),
        Some(LatencyStatus::TimedOut { issue }) => (issue, None),
        Some(LatencyStatus::Waiting) | None => (None, None),
    };
    let recorder = sequence.recorder();
    let stats = ProbeStats {
        edges,
        elapsed_ns: edges * config.bench.clock_period_ns,
        fetches_served: monitor.served(),
        unresolved_fetch_stalls: monitor.unresolved_stalls(),
        loop_closures: monitor.closures(),
        loop_misses: monitor.misses(),
        trace_samples: recorder.events().len() as u64,
        unresolved_samples: recorder.unresolved_samples() as u64,
        intervals: recorder.intervals(),
        issue_cycle,
        write_cycle,
    };
    info!(core = %processor, %verdict, "probe finished");
    Ok(ProbeReport {
        processor,
        bits,
        verdict,
        stats,
    })
}

/// Probes one core, degrading non-fatal errors to an undetermined report.
///
/// A missing register file yields [`Verdict::Undetermined`] with whatever data width the
/// hierarchy reveals.
///
/// # Errors
///
/// Only the fatal errors of [`probe_core`] (see [`ProbeError::is_fatal`]).
pub fn probe_or_undetermined(
    core: &mut dyn CoreUnderTest,
    config: &Config,
) -> Result<ProbeReport, ProbeError> {
    match probe_core(core, config) {
        Ok(report) => Ok(report),
        Err(e) if !e.is_fatal() => {
            warn!(core = core.name(), error = %e, "probe aborted");
            Ok(ProbeReport::undetermined(
                core.name(),
                detect_data_width(core.hierarchy()),
            ))
        }
        Err(e) => Err(e),
    }
}

/// Probes one core and merges the verdict into the labels store.
///
/// The entry is written under the store's processor name. Undetermined results are
/// persisted like any other verdict. Persistence failures are logged; the report is
/// returned either way.
///
/// # Errors
///
/// Only the fatal errors of [`probe_core`]; those leave the store untouched.
pub fn label_core(
    core: &mut dyn CoreUnderTest,
    config: &Config,
    store: &LabelStore,
) -> Result<ProbeReport, ProbeError> {
    let report = probe_or_undetermined(core, config)?;
    if let Err(e) = store.record(&report) {
        warn!(core = %report.processor, error = %e, "could not persist labels");
    }
    Ok(report)
}
