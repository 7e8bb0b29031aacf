//! Probe sequence.
//!
//! The main task of a probe run. It owns reset and walks through these phases:
//! 1. **Reset:** Hold `reset_n` low for the configured number of edges, then release.
//! 2. **Observe:** Record the fetch address and the probe register every edge.
//! 3. **Classify:** Reduce the trace to a candidate; multicycle cores stop here.
//! 4. **Re-arm:** Apply reset again so the latency probe sees a fresh fetch of the first
//!    distinguishing instruction.
//! 5. **Measure:** Time the fetch completion and the register write-back.

use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::common::ProbeError;
use crate::config::Config;
use crate::hierarchy::RegisterFileHandle;
use crate::isa::opcodes::INSTR_A;
use crate::probe::Verdict;
use crate::probe::classifier::{
    Candidate, LatencyProbe, LatencyStatus, classify_intervals, verdict_from_depth,
};
use crate::probe::recorder::{TraceEvent, TraceRecorder};
use crate::probe::responder::FetchMonitor;
use crate::sim::{EdgeContext, Process, SignalId, TaskState};

const SEQUENCE_DRIVES: [SignalId; 1] = [SignalId::ResetN];

#[derive(Clone, Debug)]
enum Phase {
    Reset { remaining: u64 },
    Observe { remaining: u64 },
    Rearm { remaining: u64 },
    Measure(LatencyProbe),
    Done,
}

/// Main task of a probe run.
#[derive(Debug)]
pub struct ProbeSequence {
    reset_cycles: u64,
    observe_cycles: u64,
    measure_budget: u64,
    probe_register: usize,
    register_file: RegisterFileHandle,
    monitor: Rc<FetchMonitor>,
    phase: Phase,
    recorder: TraceRecorder,
    verdict: Option<Verdict>,
    latency: Option<LatencyStatus>,
}

impl ProbeSequence {
    /// Creates the sequence for one core.
    ///
    /// # Arguments
    ///
    /// * `config` - Run configuration.
    /// * `register_file` - Discovered register bank holding the probe register.
    /// * `monitor` - Progress of the responder, for the loop-closure check.
    pub fn new(config: &Config, register_file: RegisterFileHandle, monitor: Rc<FetchMonitor>) -> Self {
        let observe_cycles = config.classifier.observe_cycles;
        Self {
            reset_cycles: config.bench.reset_cycles,
            observe_cycles,
            measure_budget: config.classifier.measure_budget,
            probe_register: config.classifier.probe_register,
            register_file,
            monitor,
            phase: Phase::Reset {
                remaining: config.bench.reset_cycles,
            },
            recorder: TraceRecorder::with_capacity(usize::try_from(observe_cycles).unwrap_or(0)),
            verdict: None,
            latency: None,
        }
    }

    /// Verdict, once the sequence finished.
    pub const fn verdict(&self) -> Option<Verdict> {
        self.verdict
    }

    /// Trace recorded during observation.
    pub const fn recorder(&self) -> &TraceRecorder {
        &self.recorder
    }

    /// Final state of the latency probe, if one ran.
    pub const fn latency(&self) -> Option<LatencyStatus> {
        self.latency
    }

    fn sample_register(&self, ctx: &EdgeContext<'_>) -> crate::common::Logic {
        self.register_file.read(ctx.core(), self.probe_register)
    }

    /// Ends observation; returns the next phase.
    fn classify(&mut self, ctx: &mut EdgeContext<'_>) -> Result<Phase, ProbeError> {
        let intervals = self.recorder.intervals();
        let candidate = classify_intervals(&intervals);
        info!(
            cycle = ctx.cycle(),
            changes = intervals.len(),
            unresolved = self.recorder.unresolved_samples(),
            ?candidate,
            "observation complete"
        );
        match candidate {
            Candidate::Multicycle => Ok(self.finish(Verdict::Multicycle)),
            Candidate::Pipelined => {
                if self.monitor.closures() == 0 {
                    warn!(
                        misses = self.monitor.misses(),
                        "no loop closure observed; measuring latency anyway"
                    );
                }
                ctx.drive(SignalId::ResetN, false)?;
                debug!(cycle = ctx.cycle(), "re-applying reset for the latency probe");
                Ok(Phase::Rearm {
                    remaining: self.reset_cycles,
                })
            }
        }
    }

    fn finish(&mut self, verdict: Verdict) -> Phase {
        info!(%verdict, "classified");
        self.verdict = Some(verdict);
        Phase::Done
    }
}

impl Process for ProbeSequence {
    fn name(&self) -> &str {
        "probe-sequence"
    }

    fn drives(&self) -> &[SignalId] {
        &SEQUENCE_DRIVES
    }

    fn start(&mut self, ctx: &mut EdgeContext<'_>) -> Result<(), ProbeError> {
        ctx.drive(SignalId::ResetN, false)?;
        Ok(())
    }

    fn on_edge(&mut self, ctx: &mut EdgeContext<'_>) -> Result<TaskState, ProbeError> {
        let phase = std::mem::replace(&mut self.phase, Phase::Done);
        self.phase = match phase {
            Phase::Reset { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    ctx.drive(SignalId::ResetN, true)?;
                    debug!(cycle = ctx.cycle(), "reset released");
                    Phase::Observe {
                        remaining: self.observe_cycles,
                    }
                } else {
                    Phase::Reset { remaining }
                }
            }
            Phase::Observe { remaining } => {
                let event = TraceEvent {
                    cycle: ctx.cycle(),
                    program_counter: ctx.read(SignalId::FetchAddress),
                    register_value: self.sample_register(ctx),
                };
                self.recorder.record(event);
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.classify(ctx)?
                } else {
                    Phase::Observe { remaining }
                }
            }
            Phase::Rearm { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    let baseline = self.sample_register(ctx);
                    ctx.drive(SignalId::ResetN, true)?;
                    debug!(cycle = ctx.cycle(), %baseline, "reset released for the latency probe");
                    Phase::Measure(LatencyProbe::new(INSTR_A, baseline, self.measure_budget))
                } else {
                    Phase::Rearm { remaining }
                }
            }
            Phase::Measure(mut probe) => {
                let acknowledged = ctx.sampled(SignalId::FetchAcknowledge).is_high()
                    && ctx.sampled_request().strobe.is_high();
                let fetched = if acknowledged {
                    ctx.sampled(SignalId::FetchDataIn)
                        .resolved()
                        .map(|word| word as u32)
                } else {
                    None
                };
                let register = self.sample_register(ctx);
                match probe.observe(ctx.cycle(), fetched, register) {
                    LatencyStatus::Waiting => Phase::Measure(probe),
                    status => {
                        self.latency = Some(status);
                        self.finish(verdict_from_depth(probe.depth()))
                    }
                }
            }
            Phase::Done => Phase::Done,
        };
        Ok(if matches!(self.phase, Phase::Done) {
            TaskState::Finished
        } else {
            TaskState::Running
        })
    }
}
