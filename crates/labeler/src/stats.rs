//! Probe run statistics.
//!
//! This module collects what a probe run observed. It provides:
//! 1. **Bus activity:** Edges simulated, fetches served and stalls on unresolved addresses.
//! 2. **Loop behavior:** Closures and misses of the backward jump.
//! 3. **Trace quality:** Samples skipped because the program counter was unresolved.
//! 4. **Latency:** Issue and write edges of the latency probe, when measured.

use serde::Serialize;

/// Statistics of one probe run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProbeStats {
    /// Rising edges simulated.
    pub edges: u64,
    /// Simulated time in nanoseconds.
    pub elapsed_ns: u64,
    /// Fetches acknowledged by the responder.
    pub fetches_served: u64,
    /// Edges an asserted fetch carried an unresolved address.
    pub unresolved_fetch_stalls: u64,
    /// Backward jumps the core followed within the watch window.
    pub loop_closures: u32,
    /// Backward jumps the core did not follow within the watch window.
    pub loop_misses: u32,
    /// Trace samples recorded during observation.
    pub trace_samples: u64,
    /// Trace samples skipped for an unresolved program counter.
    pub unresolved_samples: u64,
    /// Program-counter change intervals that fed the classifier.
    pub intervals: Vec<u64>,
    /// Issue edge of the latency probe.
    pub issue_cycle: Option<u64>,
    /// Write-back edge of the latency probe.
    pub write_cycle: Option<u64>,
}

impl ProbeStats {
    /// Fraction of samples with a resolved program counter, in percent.
    pub fn resolved_ratio(&self) -> f64 {
        if self.trace_samples == 0 {
            return 0.0;
        }
        let resolved = self.trace_samples - self.unresolved_samples;
        (resolved as f64 / self.trace_samples as f64) * 100.0
    }

    /// Average edges between program-counter changes.
    pub fn mean_interval(&self) -> Option<f64> {
        if self.intervals.is_empty() {
            return None;
        }
        let total: u64 = self.intervals.iter().sum();
        Some(total as f64 / self.intervals.len() as f64)
    }

    /// Prints the statistics to stdout.
    pub fn print(&self) {
        println!("==========================================================");
        println!("PROBE SUMMARY");
        println!("  sim.edges              {}", self.edges);
        println!("  sim.time_ns            {}", self.elapsed_ns);
        println!("----------------------------------------------------------");
        println!("FETCH BUS");
        println!("  bus.fetches_served     {}", self.fetches_served);
        println!("  bus.unresolved_stalls  {}", self.unresolved_fetch_stalls);
        println!("  loop.closures          {}", self.loop_closures);
        println!("  loop.misses            {}", self.loop_misses);
        println!("----------------------------------------------------------");
        println!("TRACE");
        println!("  trace.samples          {}", self.trace_samples);
        println!(
            "  trace.resolved         {:.2}%",
            self.resolved_ratio()
        );
        match self.mean_interval() {
            Some(mean) => println!("  trace.mean_interval    {mean:.2}"),
            None => println!("  trace.mean_interval    -"),
        }
        println!("----------------------------------------------------------");
        println!("LATENCY");
        let show = |edge: Option<u64>| edge.map_or_else(|| "-".to_owned(), |e| e.to_string());
        println!("  latency.issue_cycle    {}", show(self.issue_cycle));
        println!("  latency.write_cycle    {}", show(self.write_cycle));
        println!("==========================================================");
    }
}
