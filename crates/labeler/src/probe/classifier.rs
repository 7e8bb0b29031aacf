//! Behavior classification.
//!
//! Classification happens in two stages:
//! 1. **Interval test:** A core whose program counter changes on every edge is a pipeline
//!    candidate; anything slower is multicycle.
//! 2. **Latency probe:** For candidates, the distance between fetch completion of the first
//!    distinguishing instruction and its register write-back gives the depth.

use tracing::{debug, warn};

use crate::common::Logic;
use crate::probe::Verdict;

/// Outcome of the interval test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Candidate {
    /// One program-counter change per edge; needs a latency probe.
    Pipelined,
    /// Slower than one instruction per edge.
    Multicycle,
}

/// Classifies a core from its program-counter change intervals.
///
/// Zero-length intervals are ignored. An empty list is multicycle since nothing proves the
/// core advances every edge.
pub fn classify_intervals(intervals: &[u64]) -> Candidate {
    let mut changes = intervals.iter().filter(|&&interval| interval != 0).peekable();
    if changes.peek().is_none() {
        return Candidate::Multicycle;
    }
    if changes.all(|&interval| interval == 1) {
        Candidate::Pipelined
    } else {
        Candidate::Multicycle
    }
}

/// Fetch-to-writeback depth, counting both the issue and the write edge.
///
/// Returns `None` if `write` precedes `issue`.
pub const fn pipeline_depth(issue: u64, write: u64) -> Option<u64> {
    match write.checked_sub(issue) {
        Some(distance) => Some(distance + 1),
        None => None,
    }
}

/// Maps a measured depth onto a verdict.
pub const fn verdict_from_depth(depth: Option<u64>) -> Verdict {
    match depth {
        None | Some(0) => Verdict::Undetermined,
        Some(1) => Verdict::SingleCycle,
        Some(depth) => Verdict::Pipelined { depth },
    }
}

/// Progress of a [`LatencyProbe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LatencyStatus {
    /// Still watching.
    Waiting,
    /// Both edges were seen.
    Measured {
        /// Edge on which the core completed the fetch of the distinguishing word.
        issue: u64,
        /// Edge on which the probe register first left its baseline.
        write: u64,
    },
    /// The budget ran out.
    TimedOut {
        /// Issue edge, if the fetch completed at all.
        issue: Option<u64>,
    },
}

/// Edge-by-edge measurement of the latency of one distinguishing instruction.
#[derive(Clone, Debug)]
pub struct LatencyProbe {
    word: u32,
    baseline: Logic,
    budget: u64,
    elapsed: u64,
    issue: Option<u64>,
    status: LatencyStatus,
}

impl LatencyProbe {
    /// Starts a measurement.
    ///
    /// # Arguments
    ///
    /// * `word` - Instruction word whose fetch completion marks the issue edge.
    /// * `baseline` - Probe register value sampled on the reset release edge.
    /// * `budget` - Edges allowed before giving up.
    pub const fn new(word: u32, baseline: Logic, budget: u64) -> Self {
        Self {
            word,
            baseline,
            budget,
            elapsed: 0,
            issue: None,
            status: LatencyStatus::Waiting,
        }
    }

    /// Current status.
    pub const fn status(&self) -> LatencyStatus {
        self.status
    }

    /// Feeds one edge.
    ///
    /// # Arguments
    ///
    /// * `cycle` - Edge index.
    /// * `fetched` - Word the core sampled with an acknowledged fetch this edge, if any.
    /// * `register` - Probe register value after the core stepped.
    ///
    /// # Returns
    ///
    /// The status after this edge. Once measured or timed out, further edges are ignored.
    pub fn observe(&mut self, cycle: u64, fetched: Option<u32>, register: Logic) -> LatencyStatus {
        if self.status != LatencyStatus::Waiting {
            return self.status;
        }
        self.elapsed += 1;

        if self.issue.is_none() && fetched == Some(self.word) {
            debug!(cycle, "distinguishing instruction fetched");
            self.issue = Some(cycle);
        }
        if let Some(issue) = self.issue {
            if register.is_resolved() && register != self.baseline {
                debug!(cycle, %register, baseline = %self.baseline, "register write observed");
                self.status = LatencyStatus::Measured {
                    issue,
                    write: cycle,
                };
                return self.status;
            }
        }
        if self.elapsed >= self.budget {
            warn!(
                budget = self.budget,
                issue = ?self.issue,
                "latency probe timed out"
            );
            self.status = LatencyStatus::TimedOut { issue: self.issue };
        }
        self.status
    }

    /// Depth of a completed measurement.
    pub const fn depth(&self) -> Option<u64> {
        match self.status {
            LatencyStatus::Measured { issue, write } => pipeline_depth(issue, write),
            _ => None,
        }
    }
}
