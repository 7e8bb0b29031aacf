//! End-to-end probe scenarios.
//!
//! Each test runs the full sequence (reset, observation, classification and, for pipeline
//! candidates, the latency probe) against a reference core or a scripted one.

use corelabel_core::common::{Logic, ProbeError};
use corelabel_core::config::ResponseTiming;
use corelabel_core::hierarchy::HierarchyNode;
use corelabel_core::labels::LabelStore;
use corelabel_core::models::{MulticycleCore, PipelinedCore};
use corelabel_core::{Config, Verdict, label_core, probe_core, probe_or_undetermined};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use tempfile::tempdir;

use crate::common::harness::{config_with_timing, init_tracing, observation_edges, probe};
use crate::common::mocks::{FrozenRegisters, ScriptedCore};

// ══════════════════════════════════════════════════════════
// 1. Classification
// ══════════════════════════════════════════════════════════

#[test]
fn one_change_per_edge_is_a_pipeline_candidate() {
    let config = Config::default();
    let mut core = ScriptedCore::stepping("stream", 0x1000, 1);

    let report = probe(&mut core, &config);

    assert!(!report.stats.intervals.is_empty());
    assert!(report.stats.intervals.iter().all(|&i| i == 1));
    // Scripted registers never resolve, so the latency probe cannot finish.
    assert_eq!(report.verdict, Verdict::Undetermined);
    assert!(report.stats.issue_cycle.is_some());
    assert_eq!(report.stats.write_cycle, None);
}

#[test]
fn held_addresses_classify_as_multicycle() {
    let config = Config::default();
    let mut core = ScriptedCore::stepping("slow", 0x1000, 3);

    let report = probe(&mut core, &config);

    assert_eq!(report.verdict, Verdict::Multicycle);
    assert_eq!(report.stats.edges, observation_edges(&config));
    assert!(report.stats.intervals.iter().all(|&i| i == 3));
    assert_eq!(report.stats.issue_cycle, None);
}

#[test]
fn single_cycle_core() {
    let config = Config::default();
    let mut core = PipelinedCore::single_cycle("single");

    let report = probe(&mut core, &config);

    assert_eq!(report.verdict, Verdict::SingleCycle);
    assert_eq!(report.bits, Some(32));
    assert_eq!(report.stats.issue_cycle, report.stats.write_cycle);
}

#[rstest]
#[case(2)]
#[case(3)]
#[case(5)]
#[case(7)]
fn pipeline_depth_is_measured(#[case] depth: usize) {
    let config = Config::default();
    let mut core = PipelinedCore::new(format!("pipe{depth}"), depth);

    let report = probe(&mut core, &config);

    assert_eq!(report.verdict, Verdict::Pipelined { depth: depth as u64 });
    let issue = report.stats.issue_cycle.unwrap();
    let write = report.stats.write_cycle.unwrap();
    assert_eq!(write - issue + 1, depth as u64);
    assert_eq!(report.stats.edges, write);
    assert!(report.stats.loop_closures > 0);
    assert_eq!(report.stats.loop_misses, 0);
}

#[test]
fn depth_five_timeline() {
    let config = Config::default();
    let mut core = PipelinedCore::new("pipe5", 5);

    let report = probe(&mut core, &config);

    // Observation ends on edge 205; the second reset releases on edge 210.
    assert_eq!(report.stats.issue_cycle, Some(212));
    assert_eq!(report.stats.write_cycle, Some(216));
    assert_eq!(report.stats.edges, 216);
    assert_eq!(report.stats.elapsed_ns, 2_160);
    assert_eq!(report.stats.trace_samples, 200);
}

#[rstest]
#[case(2)]
#[case(3)]
#[case(4)]
fn multicycle_cores(#[case] cpi: u32) {
    let config = Config::default();
    let mut core = MulticycleCore::new(format!("multi{cpi}"), cpi);

    let report = probe(&mut core, &config);

    assert_eq!(report.verdict, Verdict::Multicycle);
    assert_eq!(report.stats.edges, observation_edges(&config));
    assert!(
        report.stats.intervals.iter().all(|&i| i == u64::from(cpi)),
        "{:?}",
        report.stats.intervals
    );
}

#[test]
fn registered_responder_halves_pipeline_throughput() {
    let config = config_with_timing(ResponseTiming::Registered);
    let mut core = PipelinedCore::new("pipe5", 5);

    let report = probe(&mut core, &config);

    assert_eq!(report.verdict, Verdict::Multicycle);
}

// ══════════════════════════════════════════════════════════
// 2. Degraded runs
// ══════════════════════════════════════════════════════════

#[test]
fn frozen_register_file_is_undetermined() {
    let config = Config::default();
    let mut core = FrozenRegisters {
        inner: PipelinedCore::new("frozen", 5),
        value: Logic::Resolved(6),
    };

    let report = probe(&mut core, &config);

    assert_eq!(report.verdict, Verdict::Undetermined);
    assert_eq!(report.stats.issue_cycle, Some(212));
    assert_eq!(report.stats.write_cycle, None);
    assert!(report.stats.edges < config.bench.max_edges);
}

#[test]
fn frozen_register_file_is_persisted_as_undetected() {
    init_tracing();
    let dir = tempdir().unwrap();
    let store = LabelStore::new(dir.path(), "frozen");
    let mut core = FrozenRegisters {
        inner: PipelinedCore::new("frozen", 5),
        value: Logic::Resolved(6),
    };

    let _ = label_core(&mut core, &Config::default(), &store).unwrap();

    let data: Value =
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(
        data["frozen"],
        json!({
            "bits": 32,
            "multicycle": "Undetected",
            "pipeline": "Undetected",
            "singlecycle": "Undetected"
        })
    );
}

#[test]
fn exhausted_edge_budget_is_undetermined() {
    let mut config = Config::default();
    config.bench.max_edges = 100;
    let mut core = PipelinedCore::new("pipe5", 5);

    let report = probe(&mut core, &config);

    assert_eq!(report.verdict, Verdict::Undetermined);
    assert_eq!(report.stats.edges, 100);
}

#[test]
fn missing_register_file_is_reported() {
    init_tracing();
    let mut core = ScriptedCore::stepping("bare", 0x1000, 1)
        .with_hierarchy(HierarchyNode::module("bare", vec![HierarchyNode::signal("pc", 32)]));

    let err = probe_core(&mut core, &Config::default()).unwrap_err();

    assert!(matches!(err, ProbeError::RegisterFileNotFound(ref name) if name == "bare"));
    assert!(!err.is_fatal());
}

#[test]
fn missing_register_file_degrades_without_a_store() {
    init_tracing();
    let mut core = ScriptedCore::stepping("bare", 0x1000, 1)
        .with_hierarchy(HierarchyNode::module("bare", vec![HierarchyNode::signal("pc", 32)]));

    let report = probe_or_undetermined(&mut core, &Config::default()).unwrap();

    assert_eq!(report.verdict, Verdict::Undetermined);
    assert_eq!(report.processor, "bare");
    assert_eq!(report.bits, None);
}

// ══════════════════════════════════════════════════════════
// 3. Fatal configuration
// ══════════════════════════════════════════════════════════

#[test]
fn start_near_top_of_address_space_overflows() {
    init_tracing();
    let mut core = ScriptedCore::stepping("high", 0xFFFF_FFF0, 1);

    let err = probe_core(&mut core, &Config::default()).unwrap_err();

    assert!(matches!(err, ProbeError::AddressOverflow(0xFFFF_FFF0)), "{err}");
    assert!(err.is_fatal());

    let mut core = ScriptedCore::stepping("high", 0xFFFF_FFF0, 1);
    assert!(matches!(
        probe_or_undetermined(&mut core, &Config::default()),
        Err(ProbeError::AddressOverflow(_))
    ));
}

#[test]
fn fatal_errors_leave_the_store_untouched() {
    init_tracing();
    let dir = tempdir().unwrap();
    let store = LabelStore::new(dir.path(), "high");
    let mut core = ScriptedCore::stepping("high", 0xFFFF_FFF0, 1);

    let err = label_core(&mut core, &Config::default(), &store).unwrap_err();

    assert!(matches!(err, ProbeError::AddressOverflow(_)));
    assert!(!store.path().exists());
}
