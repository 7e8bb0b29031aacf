//! Core-under-test interface.
//!
//! A simulation binding wraps one design instance behind [`CoreUnderTest`]. The scheduler
//! calls [`CoreUnderTest::rising_edge`] once per clock edge with the inputs latched at that
//! edge and publishes the returned outputs on the bus before any task runs.

use crate::common::Logic;
use crate::hierarchy::DesignNode;

/// Inputs of the core as latched at a rising edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoreInputs {
    /// Active-low reset.
    pub reset_n: Logic,
    /// Fetch acknowledge from the responder.
    pub acknowledge: Logic,
    /// Instruction word from the responder.
    pub data_in: Logic,
}

impl CoreInputs {
    /// `true` unless reset is resolved high; an undriven reset holds the core in reset.
    pub const fn in_reset(&self) -> bool {
        !self.reset_n.is_high()
    }

    /// The acknowledged instruction word, if this edge completes a fetch.
    pub const fn fetched_word(&self) -> Option<u32> {
        match (self.acknowledge.is_high(), self.data_in) {
            (true, Logic::Resolved(word)) => Some(word as u32),
            _ => None,
        }
    }
}

/// Request outputs of the core after a rising edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoreOutputs {
    /// `fetch_cycle`.
    pub cycle: Logic,
    /// `fetch_strobe`.
    pub strobe: Logic,
    /// `fetch_write_enable`.
    pub write_enable: Logic,
    /// `fetch_address`.
    pub address: Logic,
}

impl CoreOutputs {
    /// Outputs of a core held in reset: no request and an undriven address.
    pub const RESET: Self = Self {
        cycle: Logic::LOW,
        strobe: Logic::LOW,
        write_enable: Logic::LOW,
        address: Logic::Unresolved,
    };

    /// An asserted instruction fetch of `address`.
    pub const fn fetch(address: u64) -> Self {
        Self {
            cycle: Logic::HIGH,
            strobe: Logic::HIGH,
            write_enable: Logic::LOW,
            address: Logic::Resolved(address),
        }
    }

    /// No request; the address bus keeps `address`.
    pub const fn idle(address: u64) -> Self {
        Self {
            cycle: Logic::LOW,
            strobe: Logic::LOW,
            write_enable: Logic::LOW,
            address: Logic::Resolved(address),
        }
    }
}

/// A simulated CPU core with a generic instruction-fetch bus.
pub trait CoreUnderTest {
    /// Processor name used to key the labels store.
    fn name(&self) -> &str;

    /// Advances the design by one clock edge.
    ///
    /// `inputs` are the values latched at this edge; the returned outputs become visible to
    /// every task during the same edge.
    fn rising_edge(&mut self, inputs: &CoreInputs) -> CoreOutputs;

    /// Root of the design hierarchy.
    fn hierarchy(&self) -> &dyn DesignNode;

    /// Reads element `index` of the array at hierarchical `path`.
    ///
    /// Unknown paths and out-of-range indices read as [`Logic::Unresolved`].
    fn read_element(&self, path: &str, index: usize) -> Logic;
}
