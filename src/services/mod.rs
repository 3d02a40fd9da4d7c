//! Service layer for the monitoring loop
//!
//! Services encapsulate the runtime behavior: data liveness tracking and the
//! snapshot dispatch loop.

pub mod liveness;
pub mod monitor;

pub use liveness::LivenessMonitor;
pub use monitor::{Monitor, MonitorConfig, StopReason};
