//! Program-counter trace recording.

use tracing::trace;

use crate::common::Logic;

/// One per-edge sample of the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEvent {
    /// Edge index.
    pub cycle: u64,
    /// Fetch address driven by the core.
    pub program_counter: Logic,
    /// Value of the probe register.
    pub register_value: Logic,
}

/// Append-only trace of the observation window.
#[derive(Clone, Debug, Default)]
pub struct TraceRecorder {
    events: Vec<TraceEvent>,
}

impl TraceRecorder {
    /// Creates an empty recorder with room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Appends a sample.
    pub fn record(&mut self, event: TraceEvent) {
        trace!(
            cycle = event.cycle,
            pc = %event.program_counter,
            reg = %event.register_value,
            "sample"
        );
        self.events.push(event);
    }

    /// Samples in recording order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Samples whose program counter was unresolved.
    pub fn unresolved_samples(&self) -> usize {
        self.events
            .iter()
            .filter(|event| !event.program_counter.is_resolved())
            .count()
    }

    /// Distances in edges between consecutive program-counter changes.
    ///
    /// See [`pc_change_intervals`].
    pub fn intervals(&self) -> Vec<u64> {
        pc_change_intervals(&self.events)
    }
}

/// Computes the edge distance between consecutive program-counter changes.
///
/// Unresolved samples carry no information and are skipped; they neither start nor end an
/// interval. The first resolved sample is the baseline, and every later resolved sample whose
/// value differs from the last resolved value closes one interval. Zero-length intervals
/// (duplicate edges) are dropped.
///
/// # Arguments
///
/// * `events` - Samples in edge order.
///
/// # Returns
///
/// One distance per observed change, in order.
pub fn pc_change_intervals(events: &[TraceEvent]) -> Vec<u64> {
    let mut intervals = Vec::new();
    let mut last: Option<(u64, u64)> = None;
    for event in events {
        let Some(pc) = event.program_counter.resolved() else {
            continue;
        };
        match last {
            None => last = Some((pc, event.cycle)),
            Some((previous, _)) if previous == pc => {}
            Some((_, changed_at)) => {
                let distance = event.cycle.saturating_sub(changed_at);
                if distance > 0 {
                    intervals.push(distance);
                }
                last = Some((pc, event.cycle));
            }
        }
    }
    intervals
}
