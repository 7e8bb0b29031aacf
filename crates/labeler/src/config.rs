//! Configuration for a probe run.
//!
//! This module defines the configuration structures used to parameterize a probe. It provides:
//! 1. **Defaults:** Reset length, observation window, measurement budget and responder timing.
//! 2. **Structures:** Hierarchical config for the testbench, the responder and the classifier.
//! 3. **Enums:** Responder timing mode.
//!
//! Configuration is deserialized from JSON; every field is optional and falls back to the
//! defaults below.

use serde::Deserialize;

/// Default configuration constants for a probe run.
mod defaults {
    /// Edges reset is held low before release.
    ///
    /// Five edges of a 10 ns clock, the settle time the testbench has always used.
    pub const RESET_CYCLES: u64 = 5;

    /// Simulated clock period in nanoseconds (reporting only).
    pub const CLOCK_PERIOD_NS: u64 = 10;

    /// Hard cap on edges per run; protects against a probe phase that never ends.
    pub const MAX_EDGES: u64 = 2_000;

    /// Edges watched for a fetch of `loop_start` after the jump-back word is delivered.
    pub const JUMP_CHECK_CYCLES: u64 = 12;

    /// Loop closures after which the branch address serves a no-op instead of the jump.
    pub const REQUIRED_LOOPS: u32 = 25;

    /// Edges of program-counter observation after reset.
    pub const OBSERVE_CYCLES: u64 = 200;

    /// Edges allowed for the issue and the write of the latency probe.
    pub const MEASURE_BUDGET: u64 = 400;

    /// Architectural register written by the distinguishing instructions.
    pub const PROBE_REGISTER: usize = crate::common::constants::PROBE_REGISTER;
}

/// When the responder answers an asserted fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ResponseTiming {
    /// Data and acknowledge are driven on the edge the request is seen.
    ///
    /// The core samples them on the following edge, so back-to-back fetches complete one
    /// per edge.
    #[default]
    Immediate,
    /// Data and acknowledge are driven one edge after the request is seen.
    ///
    /// For cores whose fetch interface is itself pipelined. The delivery edge never accepts
    /// a new request, so a classic handshake completes at most every other edge.
    Registered,
}

/// Root configuration of a probe run.
///
/// # Examples
///
/// ```
/// use corelabel_core::config::{Config, ResponseTiming};
///
/// let json = r#"{
///     "bench": { "reset_cycles": 8 },
///     "responder": { "timing": "Registered" },
///     "classifier": { "observe_cycles": 120 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.bench.reset_cycles, 8);
/// assert_eq!(config.responder.timing, ResponseTiming::Registered);
/// assert_eq!(config.classifier.observe_cycles, 120);
/// assert_eq!(config.classifier.measure_budget, 400);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Testbench settings (reset, clock, edge cap).
    #[serde(default)]
    pub bench: BenchConfig,
    /// Instruction-memory responder settings.
    #[serde(default)]
    pub responder: ResponderConfig,
    /// Trace recorder and classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Testbench settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchConfig {
    /// Edges reset is held low before release
    #[serde(default = "BenchConfig::default_reset_cycles")]
    pub reset_cycles: u64,

    /// Simulated clock period in nanoseconds
    #[serde(default = "BenchConfig::default_clock_period_ns")]
    pub clock_period_ns: u64,

    /// Hard cap on simulated edges per run
    #[serde(default = "BenchConfig::default_max_edges")]
    pub max_edges: u64,
}

impl BenchConfig {
    fn default_reset_cycles() -> u64 {
        defaults::RESET_CYCLES
    }

    fn default_clock_period_ns() -> u64 {
        defaults::CLOCK_PERIOD_NS
    }

    fn default_max_edges() -> u64 {
        defaults::MAX_EDGES
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            reset_cycles: defaults::RESET_CYCLES,
            clock_period_ns: defaults::CLOCK_PERIOD_NS,
            max_edges: defaults::MAX_EDGES,
        }
    }
}

/// Instruction-memory responder settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponderConfig {
    /// Response timing mode
    #[serde(default)]
    pub timing: ResponseTiming,

    /// Edges to wait for the jump back to `loop_start`
    #[serde(default = "ResponderConfig::default_jump_check_cycles")]
    pub jump_check_cycles: u64,

    /// Loop closures served before the branch falls through
    #[serde(default = "ResponderConfig::default_required_loops")]
    pub required_loops: u32,
}

impl ResponderConfig {
    fn default_jump_check_cycles() -> u64 {
        defaults::JUMP_CHECK_CYCLES
    }

    fn default_required_loops() -> u32 {
        defaults::REQUIRED_LOOPS
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            timing: ResponseTiming::default(),
            jump_check_cycles: defaults::JUMP_CHECK_CYCLES,
            required_loops: defaults::REQUIRED_LOOPS,
        }
    }
}

/// Trace recorder and classifier settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Edges of program-counter observation
    #[serde(default = "ClassifierConfig::default_observe_cycles")]
    pub observe_cycles: u64,

    /// Edge budget of the latency probe
    #[serde(default = "ClassifierConfig::default_measure_budget")]
    pub measure_budget: u64,

    /// Architectural register watched for the write-back
    #[serde(default = "ClassifierConfig::default_probe_register")]
    pub probe_register: usize,
}

impl ClassifierConfig {
    fn default_observe_cycles() -> u64 {
        defaults::OBSERVE_CYCLES
    }

    fn default_measure_budget() -> u64 {
        defaults::MEASURE_BUDGET
    }

    fn default_probe_register() -> usize {
        defaults::PROBE_REGISTER
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            observe_cycles: defaults::OBSERVE_CYCLES,
            measure_budget: defaults::MEASURE_BUDGET,
            probe_register: defaults::PROBE_REGISTER,
        }
    }
}

impl Config {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
