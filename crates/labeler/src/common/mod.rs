//! Common types shared by every part of the probe.
//!
//! This module provides:
//! 1. **Logic values:** A tri-state value type that keeps "not yet driven" apart from zero.
//! 2. **Constants:** Program offsets, instruction words and default budgets.
//! 3. **Errors:** The error taxonomy for encoding, simulation, probing and persistence.

/// Probe-wide constants (layout offsets, instruction words).
pub mod constants;

/// Error types for every layer of the probe.
pub mod error;

/// Tri-state signal values.
pub mod logic;

pub use error::{EncodeError, ProbeError, SimError, StoreError};
pub use logic::Logic;
