//! Tri-state signal values.
//!
//! A simulated signal is either driven to a concrete value or still unresolved (the `X`/`Z`
//! states of an HDL simulator during reset or flush). The two are never merged: reading an
//! unresolved signal yields no information, and in particular is not zero.

use std::fmt;

/// Value of a simulated signal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Logic {
    /// The signal has not been driven to a concrete value yet.
    #[default]
    Unresolved,
    /// The signal carries a concrete value.
    Resolved(u64),
}

impl Logic {
    /// Logic low.
    pub const LOW: Self = Self::Resolved(0);
    /// Logic high.
    pub const HIGH: Self = Self::Resolved(1);

    /// Returns the concrete value, or `None` while unresolved.
    #[inline]
    pub const fn resolved(self) -> Option<u64> {
        match self {
            Self::Resolved(v) => Some(v),
            Self::Unresolved => None,
        }
    }

    /// Returns `true` if the signal carries a concrete value.
    #[inline]
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Returns `true` only for a resolved, non-zero value.
    ///
    /// Unresolved control bits never count as asserted.
    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::Resolved(v) if v != 0)
    }

    /// Returns `true` only for a resolved zero.
    #[inline]
    pub const fn is_low(self) -> bool {
        matches!(self, Self::Resolved(0))
    }
}

impl From<bool> for Logic {
    fn from(bit: bool) -> Self {
        Self::Resolved(u64::from(bit))
    }
}

impl From<u32> for Logic {
    fn from(value: u32) -> Self {
        Self::Resolved(u64::from(value))
    }
}

impl From<u64> for Logic {
    fn from(value: u64) -> Self {
        Self::Resolved(value)
    }
}

impl From<Option<u64>> for Logic {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Self::Unresolved, Self::Resolved)
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(v) => write!(f, "{v:#010x}"),
            Self::Unresolved => f.write_str("x"),
        }
    }
}
