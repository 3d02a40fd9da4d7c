//! Domain models for incuwatch
//!
//! This module contains all domain types with validation.
//! Types are validated on construction (fail-fast pattern), except for
//! device snapshots, which tolerate partial data.

pub mod contacts;
pub mod snapshot;
pub mod thermal;

pub use contacts::{Contact, ContactRoster};
pub use snapshot::{on_off, DeviceSnapshot, DEFAULT_TARGET_TEMP};
pub use thermal::{TemperatureThresholds, TemperatureZone};
