//! Thermal domain types
//!
//! Provides the validated critical temperature band for the incubator.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default critical minimum in Celsius
pub const DEFAULT_CRITICAL_LOW: f64 = 34.0;

/// Default critical maximum in Celsius
pub const DEFAULT_CRITICAL_HIGH: f64 = 38.5;

/// Where a reading sits relative to the critical band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureZone {
    /// Strictly below the critical minimum
    CriticalLow,
    /// Within the band, thresholds inclusive
    Safe,
    /// Strictly above the critical maximum
    CriticalHigh,
}

/// Critical temperature band
///
/// Readings exactly equal to either bound are considered safe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureThresholds {
    low: f64,
    high: f64,
}

impl TemperatureThresholds {
    /// Create a new band, validating that `low < high` and both are finite
    pub fn new(low: f64, high: f64) -> Result<Self, DomainError> {
        if !low.is_finite() {
            return Err(DomainError::InvalidTemperature(low));
        }
        if !high.is_finite() {
            return Err(DomainError::InvalidTemperature(high));
        }
        if low >= high {
            return Err(DomainError::InvalidThresholds { low, high });
        }
        Ok(Self { low, high })
    }

    /// Critical minimum in Celsius
    #[inline]
    pub const fn low(&self) -> f64 {
        self.low
    }

    /// Critical maximum in Celsius
    #[inline]
    pub const fn high(&self) -> f64 {
        self.high
    }

    /// Classify a reading
    pub fn zone(&self, celsius: f64) -> TemperatureZone {
        if celsius < self.low {
            TemperatureZone::CriticalLow
        } else if celsius > self.high {
            TemperatureZone::CriticalHigh
        } else {
            TemperatureZone::Safe
        }
    }
}

impl Default for TemperatureThresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_CRITICAL_LOW,
            high: DEFAULT_CRITICAL_HIGH,
        }
    }
}

impl fmt::Display for TemperatureThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C .. {}°C", self.low, self.high)
    }
}
