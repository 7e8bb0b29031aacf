//! Reference core tests.
//!
//! The cores are stepped directly against an ideal instruction memory that answers every
//! request on the next edge.

use corelabel_core::common::Logic;
use corelabel_core::isa::encode_jal;
use corelabel_core::isa::opcodes::{INSTR_A, NOP};
use corelabel_core::models::{MulticycleCore, PipelinedCore, RESET_VECTOR, RegisterFile};
use corelabel_core::sim::{CoreInputs, CoreOutputs, CoreUnderTest};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Steps `core` for `edges` edges; edge 0 is held in reset.
///
/// Calls `after` with the edge index once the core has stepped.
fn drive(
    core: &mut dyn CoreUnderTest,
    memory: impl Fn(u64) -> u32,
    edges: usize,
    mut after: impl FnMut(usize, &CoreOutputs, &dyn CoreUnderTest),
) -> Vec<CoreOutputs> {
    let mut outputs = Vec::with_capacity(edges);
    let mut previous: Option<CoreOutputs> = None;
    for edge in 0..edges {
        let inputs = if edge == 0 {
            CoreInputs {
                reset_n: Logic::LOW,
                ..CoreInputs::default()
            }
        } else {
            let request = previous.filter(|o| o.cycle.is_high() && o.strobe.is_high());
            CoreInputs {
                reset_n: Logic::HIGH,
                acknowledge: Logic::from(request.is_some()),
                data_in: request
                    .and_then(|o| o.address.resolved())
                    .map_or(Logic::Unresolved, |address| Logic::from(memory(address))),
            }
        };
        let out = core.rising_edge(&inputs);
        after(edge, &out, &*core);
        outputs.push(out);
        previous = Some(out);
    }
    outputs
}

fn first_program(address: u64) -> u32 {
    if address == RESET_VECTOR { INSTR_A } else { NOP }
}

fn probe_register(core: &dyn CoreUnderTest) -> Logic {
    core.read_element(&format!("{}.core.regfile.regs", core.name()), 1)
}

// ══════════════════════════════════════════════════════════
// 1. Register file
// ══════════════════════════════════════════════════════════

#[test]
fn register_file_powers_up_unresolved() {
    let regs = RegisterFile::new();
    assert_eq!(regs.read(0), Logic::Resolved(0));
    for idx in 1..32 {
        assert_eq!(regs.read(idx), Logic::Unresolved, "x{idx}");
    }
    assert_eq!(regs.read(32), Logic::Unresolved);
}

#[test]
fn x0_ignores_writes() {
    let mut regs = RegisterFile::new();
    regs.write(0, Logic::Resolved(9));
    assert_eq!(regs.read(0), Logic::Resolved(0));
}

#[test]
fn writes_truncate_to_32_bits() {
    let mut regs = RegisterFile::new();
    let value = regs.add_immediate(0, -1);
    regs.write(3, value);
    assert_eq!(regs.read(3), Logic::Resolved(0xFFFF_FFFF));
}

#[test]
fn unresolved_source_gives_unresolved_result() {
    let regs = RegisterFile::new();
    assert_eq!(regs.add_immediate(7, 1), Logic::Unresolved);
}

// ══════════════════════════════════════════════════════════
// 2. Pipelined core
// ══════════════════════════════════════════════════════════

#[test]
fn pipelined_core_fetches_every_edge() {
    let mut core = PipelinedCore::new("p", 5);
    let outputs = drive(&mut core, first_program, 12, |_, _, _| {});

    assert_eq!(outputs[0], CoreOutputs::RESET);
    for (edge, out) in outputs.iter().enumerate().skip(1) {
        let expected = RESET_VECTOR + 4 * (edge as u64 - 1);
        assert_eq!(*out, CoreOutputs::fetch(expected), "edge {edge}");
    }
}

#[rstest]
#[case::single_cycle(1)]
#[case::two(2)]
#[case::three(3)]
#[case::five(5)]
#[case::seven(7)]
fn write_back_lags_fetch_by_depth(#[case] depth: usize) {
    let mut core = PipelinedCore::new("p", depth);
    let mut written = None;
    let _ = drive(&mut core, first_program, 20, |edge, _, core| {
        if written.is_none() && probe_register(core) == Logic::Resolved(5) {
            written = Some(edge);
        }
    });

    // Fetch completes on edge 2; the write lands on edge 2 + depth - 1.
    assert_eq!(written, Some(depth + 1));
}

#[test]
fn jump_redirects_and_squashes_younger_fetches() {
    let jump = encode_jal(0x40, 0).unwrap();
    let mut core = PipelinedCore::new("p", 5);
    let outputs = drive(
        &mut core,
        |address| if address == RESET_VECTOR { jump } else { NOP },
        8,
        |_, _, _| {},
    );

    assert_eq!(outputs[3].address, Logic::Resolved(RESET_VECTOR + 8));
    assert_eq!(outputs[4].address, Logic::Resolved(RESET_VECTOR + 0x40));
    assert_eq!(outputs[5].address, Logic::Resolved(RESET_VECTOR + 0x44));
}

#[test]
fn single_cycle_jump_redirects_immediately() {
    let jump = encode_jal(0x40, 0).unwrap();
    let mut core = PipelinedCore::single_cycle("s");
    let outputs = drive(
        &mut core,
        |address| if address == RESET_VECTOR { jump } else { NOP },
        4,
        |_, _, _| {},
    );

    assert_eq!(core.depth(), 1);
    assert_eq!(outputs[2].address, Logic::Resolved(RESET_VECTOR + 0x40));
}

#[test]
fn reset_restarts_from_the_reset_vector() {
    let mut core = PipelinedCore::new("p", 3);
    let _ = drive(&mut core, first_program, 10, |_, _, _| {});
    let outputs = drive(&mut core, first_program, 3, |_, _, _| {});

    assert_eq!(outputs[1], CoreOutputs::fetch(RESET_VECTOR));
    assert_eq!(
        core.registers().read(1),
        Logic::Resolved(5),
        "reset does not clear registers"
    );
}

#[test]
fn unknown_paths_read_unresolved() {
    let core = PipelinedCore::new("p", 3);
    assert_eq!(core.read_element("p.core.pc", 0), Logic::Unresolved);
    assert_eq!(core.read_element("p.core.regfile.regs", 0), Logic::Resolved(0));
}

// ══════════════════════════════════════════════════════════
// 3. Multicycle core
// ══════════════════════════════════════════════════════════

#[rstest]
#[case(2)]
#[case(3)]
#[case(4)]
fn multicycle_fetches_every_cpi_edges(#[case] cpi: u32) {
    let mut core = MulticycleCore::new("m", cpi);
    let outputs = drive(&mut core, first_program, 20, |_, _, _| {});

    let fetch_edges: Vec<usize> = outputs
        .iter()
        .enumerate()
        .filter(|(_, o)| o.strobe.is_high())
        .map(|(edge, _)| edge)
        .collect();
    assert!(fetch_edges.len() > 3);
    assert!(
        fetch_edges.windows(2).all(|w| w[1] - w[0] == cpi as usize),
        "{fetch_edges:?}"
    );
}

#[test]
fn multicycle_holds_address_while_executing() {
    let mut core = MulticycleCore::new("m", 4);
    let outputs = drive(&mut core, first_program, 6, |_, _, _| {});

    assert_eq!(outputs[1], CoreOutputs::fetch(RESET_VECTOR));
    assert_eq!(outputs[2], CoreOutputs::idle(RESET_VECTOR));
    assert_eq!(outputs[3], CoreOutputs::idle(RESET_VECTOR));
    assert_eq!(outputs[4], CoreOutputs::idle(RESET_VECTOR));
    assert_eq!(outputs[5], CoreOutputs::fetch(RESET_VECTOR + 4));
}

#[test]
fn multicycle_retires_after_cpi_edges() {
    let mut core = MulticycleCore::new("m", 3);
    let mut written = None;
    let _ = drive(&mut core, first_program, 10, |edge, _, core| {
        if written.is_none() && probe_register(core) == Logic::Resolved(5) {
            written = Some(edge);
        }
    });
    assert_eq!(written, Some(4));
    assert_eq!(core.registers().read(1), Logic::Resolved(5));
}

#[test]
fn cpi_below_two_is_raised() {
    assert_eq!(MulticycleCore::new("m", 1).cpi(), 2);
    assert_eq!(PipelinedCore::new("p", 0).depth(), 1);
}
