//! Error taxonomy.
//!
//! Each layer has its own error type:
//! 1. **Encoding:** An instruction field that cannot represent the requested value.
//! 2. **Simulation:** Violations of the single-driver discipline on the signal bus.
//! 3. **Probe:** Fatal configuration errors and missing preconditions of a probe run.
//! 4. **Store:** Reading or writing the labels store.
//!
//! Only [`ProbeError::Configuration`] and [`ProbeError::AddressOverflow`] abort a probe.
//! Timeouts never surface as errors; they become [`Verdict::Undetermined`].
//!
//! [`Verdict::Undetermined`]: crate::probe::Verdict::Undetermined

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sim::{Driver, SignalId};

/// Failure to encode an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The jump distance does not fit the signed 21-bit J-format immediate.
    #[error("JAL immediate {offset} out of range for 21-bit signed J-format")]
    JumpOutOfRange {
        /// Requested byte offset.
        offset: i64,
    },
    /// J-format immediates drop bit 0, so odd offsets cannot be encoded.
    #[error("JAL immediate {offset} is not 2-byte aligned")]
    MisalignedJump {
        /// Requested byte offset.
        offset: i64,
    },
    /// Register index outside `x0`-`x31`.
    #[error("register x{0} does not exist")]
    InvalidRegister(u32),
}

/// Violation of the signal ownership rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// A second driver tried to claim or drive a signal.
    #[error("signal {signal} is driven by {owner}, {driver} may not drive it")]
    MultipleDrivers {
        /// Contested signal.
        signal: SignalId,
        /// Current owner.
        owner: Driver,
        /// Offending driver.
        driver: Driver,
    },
    /// A driver wrote a signal it never claimed.
    #[error("{driver} drove unclaimed signal {signal}")]
    Unclaimed {
        /// Signal written.
        signal: SignalId,
        /// Offending driver.
        driver: Driver,
    },
}

/// Errors that end a probe run.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The backward jump of the synthesized program cannot be encoded.
    #[error(
        "malformed program layout (start={start:#010x}, loop_start={loop_start:#010x}, \
         branch={branch:#010x}): {source}"
    )]
    Configuration {
        /// First fetched address.
        start: u64,
        /// Jump target.
        loop_start: u64,
        /// Address of the jump.
        branch: u64,
        /// Encoding failure.
        #[source]
        source: EncodeError,
    },
    /// The program would run past the end of the 32-bit address space.
    #[error("program layout starting at {0:#x} overflows the 32-bit fetch address space")]
    AddressOverflow(u64),
    /// Discovery found no register file in the design hierarchy.
    #[error("no register file found in the design hierarchy of {0}")]
    RegisterFileNotFound(String),
    /// The simulation kernel rejected a signal access.
    #[error(transparent)]
    Sim(#[from] SimError),
}

impl ProbeError {
    /// Returns `true` for errors that must abort the run rather than degrade the verdict.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::RegisterFileNotFound(_))
    }
}

/// Errors from the labels store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("labels store {path}: {source}")]
    Io {
        /// Store file or directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Serialization failure.
    #[error("labels store {path}: {source}")]
    Json {
        /// Store file.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}
