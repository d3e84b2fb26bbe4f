use serde::{Deserialize, Serialize};
use std::fmt;

pub const TESS_DECIMALS: u32 = 18;
pub const TESS_BASE_UNIT: u128 = 1_000_000_000_000_000_000; // 10^18

/// Reward token amount in base units.
///
/// u128 because the token carries 18 decimals; four-digit whole-token
/// amounts already overflow u64.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TessAmount(u128);

impl TessAmount {
    pub const ZERO: Self = Self(0);

    pub fn from_tess(tess: f64) -> Self {
        Self((tess * TESS_BASE_UNIT as f64) as u128)
    }

    pub fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    pub fn to_tess(&self) -> f64 {
        self.0 as f64 / TESS_BASE_UNIT as f64
    }

    pub fn to_base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for TessAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} TESS", self.to_tess())
    }
}
