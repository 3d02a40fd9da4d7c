//! Alert report rendering
//!
//! Builds the HTML and plain-text bodies sent to staff from askama templates.
//! Both carry the same facts: device identity, current readings and the
//! action checklist.

use super::types::AlertEvent;
use crate::domain::on_off;
use askama::Template;
use chrono::Local;

/// Accent colour for critical alerts
const SEVERITY_COLOR: &str = "#ff0066";

/// Checklist included in every report
pub const RECOMMENDED_ACTIONS: [&str; 5] = [
    "Check infant immediately",
    "Verify incubator display and controls",
    "Monitor temperature closely",
    "Contact biomedical engineering if needed",
    "Document all actions taken",
];

/// Site information shown in reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Hospital name
    pub hospital: String,
    /// Ward or room label
    pub location: String,
}

impl Site {
    /// Create site info
    pub fn new(hospital: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            hospital: hospital.into(),
            location: location.into(),
        }
    }
}

/// Rendered notification content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertReport {
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
    /// Plain-text body
    pub text: String,
}

impl AlertReport {
    /// Render a report for an alert
    pub fn render(event: &AlertEvent, site: &Site) -> Result<Self, askama::Error> {
        let fields = ReportFields::new(event, site);
        Ok(Self {
            subject: event.subject(),
            html: HtmlReport {
                r: &fields,
                color: SEVERITY_COLOR,
            }
            .render()?,
            text: TextReport { r: &fields }.render()?,
        })
    }
}

/// Values shared by both report templates
struct ReportFields<'a> {
    label: &'static str,
    details: &'a str,
    device_id: &'a str,
    hospital: &'a str,
    location: &'a str,
    time: String,
    current: String,
    target: String,
    status: &'a str,
    heater: &'static str,
    cooler: &'static str,
    actions: &'static [&'static str],
}

impl<'a> ReportFields<'a> {
    fn new(event: &'a AlertEvent, site: &'a Site) -> Self {
        let snap = &event.snapshot;
        Self {
            label: event.alert_type.label(),
            details: &event.details,
            device_id: &event.device_id,
            hospital: &site.hospital,
            location: &site.location,
            time: event
                .detected_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            current: format!("{:.1}°C", snap.current_temp),
            target: format!("{:.1}°C", snap.target_temp),
            status: snap.status_label(),
            heater: on_off(snap.heater_state),
            cooler: on_off(snap.cooler_state),
            actions: &RECOMMENDED_ACTIONS,
        }
    }
}

#[derive(Template)]
#[template(path = "alert_report.html")]
struct HtmlReport<'a> {
    r: &'a ReportFields<'a>,
    color: &'a str,
}

#[derive(Template)]
#[template(path = "alert_report.txt")]
struct TextReport<'a> {
    r: &'a ReportFields<'a>,
}
