//! Instruction-memory responder.
//!
//! The responder is a background task that plays the instruction memory. It provides:
//! 1. **Program synthesis:** The first asserted fetch after reset fixes the program layout.
//! 2. **Handshake:** Data and acknowledge for each asserted fetch, immediately or one edge
//!    late depending on [`ResponseTiming`].
//! 3. **Loop watch:** After serving the backward jump, a bounded wait for the core to fetch
//!    `loop_start`. Hits count as loop closures, timeouts are logged and counted.
//!
//! Unresolved addresses are never served; the responder withholds acknowledge and waits for
//! the address to resolve.

use std::cell::{Cell, OnceCell};
use std::rc::Rc;

use tracing::{debug, info, trace, warn};

use crate::common::{Logic, ProbeError};
use crate::config::{ResponderConfig, ResponseTiming};
use crate::isa::opcodes::NOP;
use crate::probe::program::{InstructionMap, ProgramLayout};
use crate::sim::{EdgeContext, Process, SignalId, TaskState};

/// Signals owned by the responder.
const RESPONDER_DRIVES: [SignalId; 2] = [SignalId::FetchDataIn, SignalId::FetchAcknowledge];

/// Shared view of the responder's progress.
///
/// The testbench holds a second reference to read the layout and the loop counters.
#[derive(Debug, Default)]
pub struct FetchMonitor {
    layout: OnceCell<ProgramLayout>,
    served: Cell<u64>,
    closures: Cell<u32>,
    misses: Cell<u32>,
    unresolved_stalls: Cell<u64>,
}

impl FetchMonitor {
    /// Creates an empty monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout fixed by the first fetch, if one happened.
    pub fn layout(&self) -> Option<&ProgramLayout> {
        self.layout.get()
    }

    /// Fetches acknowledged so far.
    pub fn served(&self) -> u64 {
        self.served.get()
    }

    /// Backward jumps followed by a fetch of `loop_start` within the watch window.
    pub fn closures(&self) -> u32 {
        self.closures.get()
    }

    /// Backward jumps the core did not follow within the watch window.
    pub fn misses(&self) -> u32 {
        self.misses.get()
    }

    /// Edges an asserted fetch waited on an unresolved address.
    pub fn unresolved_stalls(&self) -> u64 {
        self.unresolved_stalls.get()
    }

    fn bump_served(&self) {
        self.served.set(self.served.get() + 1);
    }

    fn bump_closures(&self) -> u32 {
        let closures = self.closures.get() + 1;
        self.closures.set(closures);
        closures
    }

    fn bump_misses(&self) {
        self.misses.set(self.misses.get() + 1);
    }

    fn bump_unresolved_stalls(&self) {
        self.unresolved_stalls.set(self.unresolved_stalls.get() + 1);
    }
}

/// A fetch accepted but not yet delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Response {
    address: u64,
    word: u32,
}

/// Background task answering instruction fetches.
#[derive(Debug)]
pub struct Responder {
    config: ResponderConfig,
    monitor: Rc<FetchMonitor>,
    program: Option<InstructionMap>,
    pending: Option<Response>,
    /// Edges left in the current loop watch.
    watch: Option<u64>,
}

impl Responder {
    /// Creates a responder publishing its progress to `monitor`.
    pub const fn new(config: ResponderConfig, monitor: Rc<FetchMonitor>) -> Self {
        Self {
            config,
            monitor,
            program: None,
            pending: None,
            watch: None,
        }
    }

    /// Accepts the current request if it is asserted and its address is resolved.
    fn accept(&mut self, ctx: &EdgeContext<'_>) -> Result<Option<Response>, ProbeError> {
        let request = ctx.request();
        if !request.asserted() {
            return Ok(None);
        }
        let Some(address) = request.address.resolved() else {
            self.monitor.bump_unresolved_stalls();
            trace!(cycle = ctx.cycle(), "fetch address unresolved; withholding acknowledge");
            return Ok(None);
        };
        let word = self.word_at(address)?;
        Ok(Some(Response { address, word }))
    }

    /// Looks up `address`, synthesizing the program on the first fetch.
    fn word_at(&mut self, address: u64) -> Result<u32, ProbeError> {
        if self.program.is_none() {
            let layout = match self.monitor.layout() {
                Some(layout) => *layout,
                None => {
                    let layout = ProgramLayout::from_start(address)?;
                    info!(start = format_args!("{address:#010x}"), "first fetch");
                    let _ = self.monitor.layout.set(layout);
                    layout
                }
            };
            self.program = Some(layout.instruction_map());
        }
        let looping = self.monitor.closures() < self.config.required_loops;
        Ok(self
            .program
            .as_ref()
            .map_or(NOP, |program| program.word_at(address, looping)))
    }

    fn deliver(&mut self, ctx: &mut EdgeContext<'_>, response: Response) -> Result<(), ProbeError> {
        ctx.drive(SignalId::FetchDataIn, response.word)?;
        ctx.drive(SignalId::FetchAcknowledge, true)?;
        self.monitor.bump_served();
        trace!(
            cycle = ctx.cycle(),
            address = format_args!("{:#010x}", response.address),
            word = format_args!("{:#010x}", response.word),
            "ack"
        );
        let jump_back = self.monitor.layout().is_some_and(|layout| {
            response.address == layout.branch && response.word == layout.jump_back_word
        });
        if jump_back {
            debug!(cycle = ctx.cycle(), "jump back served");
            self.watch = Some(self.config.jump_check_cycles);
        }
        Ok(())
    }

    /// Advances the loop watch by one edge.
    fn step_watch(&mut self, ctx: &EdgeContext<'_>) {
        let Some(remaining) = self.watch else {
            return;
        };
        let Some(loop_start) = self.monitor.layout().map(|layout| layout.loop_start) else {
            return;
        };
        let request = ctx.request();
        if request.asserted() && request.address == Logic::Resolved(loop_start) {
            let closures = self.monitor.bump_closures();
            debug!(cycle = ctx.cycle(), closures, "observed jump back to loop_start");
            self.watch = None;
        } else if remaining <= 1 {
            warn!(
                cycle = ctx.cycle(),
                window = self.config.jump_check_cycles,
                "core did not fetch loop_start after the jump back"
            );
            self.monitor.bump_misses();
            self.watch = None;
        } else {
            self.watch = Some(remaining - 1);
        }
    }
}

impl Process for Responder {
    fn name(&self) -> &str {
        "responder"
    }

    fn drives(&self) -> &[SignalId] {
        &RESPONDER_DRIVES
    }

    fn start(&mut self, ctx: &mut EdgeContext<'_>) -> Result<(), ProbeError> {
        ctx.drive(SignalId::FetchAcknowledge, false)?;
        ctx.drive(SignalId::FetchDataIn, 0_u32)?;
        Ok(())
    }

    fn on_edge(&mut self, ctx: &mut EdgeContext<'_>) -> Result<TaskState, ProbeError> {
        if !ctx.read(SignalId::ResetN).is_high() {
            let pending = self.pending.take();
            let watch = self.watch.take();
            if pending.is_some() || watch.is_some() {
                debug!(cycle = ctx.cycle(), "reset asserted; dropping in-flight state");
            }
            ctx.drive(SignalId::FetchAcknowledge, false)?;
            return Ok(TaskState::Running);
        }

        self.step_watch(ctx);

        match self.config.timing {
            ResponseTiming::Immediate => match self.accept(ctx)? {
                Some(response) => self.deliver(ctx, response)?,
                None => ctx.drive(SignalId::FetchAcknowledge, false)?,
            },
            ResponseTiming::Registered => {
                if let Some(response) = self.pending.take() {
                    self.deliver(ctx, response)?;
                } else {
                    ctx.drive(SignalId::FetchAcknowledge, false)?;
                    self.pending = self.accept(ctx)?;
                }
            }
        }
        Ok(TaskState::Running)
    }
}
