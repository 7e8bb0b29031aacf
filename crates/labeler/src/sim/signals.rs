//! Fetch-bus signals.
//!
//! Every signal has at most one driver. The core owns the request half of the bus, the
//! responder owns the response half and the testbench owns reset. Any party may read any
//! signal, either as it stood at the current edge ([`SignalBus::sampled`]) or as it settled
//! after the drivers that already ran this edge ([`SignalBus::read`]).

use std::fmt;

use crate::common::{Logic, SimError};
use crate::sim::scheduler::TaskId;

/// Identifier of a fetch-bus signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalId {
    /// Active-low reset.
    ResetN,
    /// Bus cycle in progress (driven by the core).
    FetchCycle,
    /// Request strobe (driven by the core).
    FetchStrobe,
    /// Write enable; fetches are reads (driven by the core).
    FetchWriteEnable,
    /// Requested instruction address (driven by the core).
    FetchAddress,
    /// Returned instruction word (driven by the responder).
    FetchDataIn,
    /// Acknowledge for the current request (driven by the responder).
    FetchAcknowledge,
}

impl SignalId {
    /// Number of signals on the bus.
    pub const COUNT: usize = 7;

    /// Generic signal name as seen by a simulation binding.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ResetN => "reset_n",
            Self::FetchCycle => "fetch_cycle",
            Self::FetchStrobe => "fetch_strobe",
            Self::FetchWriteEnable => "fetch_write_enable",
            Self::FetchAddress => "fetch_address",
            Self::FetchDataIn => "fetch_data_in",
            Self::FetchAcknowledge => "fetch_acknowledge",
        }
    }

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Owner of a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Driver {
    /// The core under test.
    Core,
    /// A scheduler task.
    Task(TaskId),
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core => f.write_str("core"),
            Self::Task(id) => write!(f, "task #{}", id.0),
        }
    }
}

/// The request half of the fetch bus at one point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    /// `fetch_cycle`.
    pub cycle: Logic,
    /// `fetch_strobe`.
    pub strobe: Logic,
    /// `fetch_write_enable`.
    pub write_enable: Logic,
    /// `fetch_address`.
    pub address: Logic,
}

impl FetchRequest {
    /// A fetch is asserted when cycle and strobe are high and write enable is low.
    ///
    /// Unresolved control bits never assert a fetch.
    pub const fn asserted(&self) -> bool {
        self.cycle.is_high() && self.strobe.is_high() && self.write_enable.is_low()
    }
}

/// Signal table with per-signal ownership.
#[derive(Clone, Debug, Default)]
pub struct SignalBus {
    current: [Logic; SignalId::COUNT],
    sampled: [Logic; SignalId::COUNT],
    owners: [Option<Driver>; SignalId::COUNT],
}

impl SignalBus {
    /// Creates a bus with every signal unresolved and unowned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `driver` as the only driver of `signal`.
    ///
    /// Claiming a signal twice with the same driver is allowed.
    ///
    /// # Errors
    ///
    /// [`SimError::MultipleDrivers`] if another driver already owns the signal.
    pub fn claim(&mut self, driver: Driver, signal: SignalId) -> Result<(), SimError> {
        match self.owners[signal.index()] {
            Some(owner) if owner != driver => Err(SimError::MultipleDrivers {
                signal,
                owner,
                driver,
            }),
            _ => {
                self.owners[signal.index()] = Some(driver);
                Ok(())
            }
        }
    }

    /// Drives `signal` to `value` on behalf of `driver`.
    ///
    /// # Errors
    ///
    /// [`SimError::MultipleDrivers`] if the signal belongs to someone else and
    /// [`SimError::Unclaimed`] if nobody claimed it.
    pub fn drive(&mut self, driver: Driver, signal: SignalId, value: Logic) -> Result<(), SimError> {
        match self.owners[signal.index()] {
            Some(owner) if owner == driver => {
                self.current[signal.index()] = value;
                Ok(())
            }
            Some(owner) => Err(SimError::MultipleDrivers {
                signal,
                owner,
                driver,
            }),
            None => Err(SimError::Unclaimed { signal, driver }),
        }
    }

    /// Current (settled) value of `signal`.
    #[inline]
    pub const fn read(&self, signal: SignalId) -> Logic {
        self.current[signal.index()]
    }

    /// Value of `signal` as latched at the current clock edge.
    #[inline]
    pub const fn sampled(&self, signal: SignalId) -> Logic {
        self.sampled[signal.index()]
    }

    /// Current owner of `signal`, if any.
    pub const fn owner(&self, signal: SignalId) -> Option<Driver> {
        self.owners[signal.index()]
    }

    /// Latches every current value as the sampled value of a new edge.
    pub fn latch(&mut self) {
        self.sampled = self.current;
    }

    /// Current request half of the bus.
    pub const fn request(&self) -> FetchRequest {
        FetchRequest {
            cycle: self.read(SignalId::FetchCycle),
            strobe: self.read(SignalId::FetchStrobe),
            write_enable: self.read(SignalId::FetchWriteEnable),
            address: self.read(SignalId::FetchAddress),
        }
    }

    /// Request half of the bus as latched at the current edge.
    pub const fn sampled_request(&self) -> FetchRequest {
        FetchRequest {
            cycle: self.sampled(SignalId::FetchCycle),
            strobe: self.sampled(SignalId::FetchStrobe),
            write_enable: self.sampled(SignalId::FetchWriteEnable),
            address: self.sampled(SignalId::FetchAddress),
        }
    }
}
