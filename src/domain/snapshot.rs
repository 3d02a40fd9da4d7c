//! Device snapshot domain type
//!
//! One point-in-time reading of incubator state as published by the firmware.
//! Decoding is tolerant field by field: absent, `null` or unusable values fall
//! back to defaults instead of failing the whole reading.

use crate::error::DomainError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Target temperature assumed when the device does not report one
pub const DEFAULT_TARGET_TEMP: f64 = 36.5;

/// Incubator state snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    /// Measured air temperature in Celsius
    pub current_temp: f64,
    /// Setpoint in Celsius
    pub target_temp: f64,
    /// Free-form firmware status, e.g. `NORMAL`, `SENSOR_FAULT`
    pub status: String,
    /// Heater relay state
    pub heater_state: bool,
    /// Cooler relay state
    pub cooler_state: bool,
}

impl DeviceSnapshot {
    /// Decode a snapshot from a JSON document
    ///
    /// Returns `Ok(None)` for `null` or an empty object, which the device
    /// publishes when it has no data. Any other non-object is an error.
    /// Fields of the wrong type are replaced by their defaults.
    pub fn from_value(value: &Value) -> Result<Option<Self>, DomainError> {
        match value {
            Value::Null => Ok(None),
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Object(map) => Ok(Some(Self::from_map(map))),
            other => Err(DomainError::NotAnObject(json_kind(other))),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        Self {
            current_temp: field(map, "currentTemp", as_temperature, defaults.current_temp),
            target_temp: field(map, "targetTemp", as_temperature, defaults.target_temp),
            status: field(map, "status", as_status, defaults.status),
            heater_state: field(map, "heaterState", as_relay, defaults.heater_state),
            cooler_state: field(map, "coolerState", as_relay, defaults.cooler_state),
        }
    }

    /// Status for display, `UNKNOWN` when the device sent none
    pub fn status_label(&self) -> &str {
        if self.status.is_empty() {
            "UNKNOWN"
        } else {
            &self.status
        }
    }

    /// Builder: set current temperature
    pub fn with_current_temp(mut self, celsius: f64) -> Self {
        self.current_temp = celsius;
        self
    }

    /// Builder: set status
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Builder: set heater state
    pub fn with_heater(mut self, on: bool) -> Self {
        self.heater_state = on;
        self
    }
}

impl Default for DeviceSnapshot {
    fn default() -> Self {
        Self {
            current_temp: 0.0,
            target_temp: DEFAULT_TARGET_TEMP,
            status: String::new(),
            heater_state: false,
            cooler_state: false,
        }
    }
}

impl fmt::Display for DeviceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Temp: {:.1}°C | Status: {}",
            self.current_temp,
            self.status_label()
        )
    }
}

/// Human form of a relay state
pub fn on_off(state: bool) -> &'static str {
    if state {
        "ON"
    } else {
        "OFF"
    }
}

fn field<T>(
    map: &Map<String, Value>,
    key: &str,
    convert: fn(&Value) -> Option<T>,
    default: T,
) -> T {
    match map.get(key) {
        None | Some(Value::Null) => default,
        Some(value) => convert(value).unwrap_or_else(|| {
            log::warn!("Ignoring unusable {} value {}, using default", key, value);
            default
        }),
    }
}

/// Number, or a number inside a string
fn as_temperature(value: &Value) -> Option<f64> {
    let celsius = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    celsius.is_finite().then_some(celsius)
}

fn as_status(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `true`/`false`, `0`/`1` and `ON`/`OFF`
fn as_relay(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64()? {
            x if x == 0.0 => Some(false),
            x if x == 1.0 => Some(true),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
            "ON" | "TRUE" | "1" => Some(true),
            "OFF" | "FALSE" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
