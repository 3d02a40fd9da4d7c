//! incuwatch - incubator telemetry alerting library
//!
//! This library watches the live state of a medical incubator, classifies
//! each reading against critical thresholds, and notifies on-call staff by
//! e-mail with a per-alert cooldown.
//!
//! # Modules
//!
//! - [`alerts`]: Classification, cooldown and notification
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`domain`]: Domain models with validation
//! - [`error`]: Error types
//! - [`services`]: Dispatch loop and liveness tracking
//! - [`source`]: Snapshot sources

pub mod alerts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod source;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
