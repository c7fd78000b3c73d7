//! Event and error report types.
//!
//! An [`Event`] is created at the call site, forwarded once, and dropped.
//! An [`ErrorReport`] carries the same identity fields plus the causing
//! error and the flags that decide how it is recorded.

use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;
use std::fmt;

use crate::value::Data;

/// A named occurrence forwarded to the crash backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Machine-readable identifier, stable across releases
    pub event_id: String,

    /// Human-readable name
    pub name: String,

    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Additional data, string-coerced before forwarding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_data: Option<Data>,
}

impl Event {
    /// Creates an event with no description or additional data.
    pub fn new(event_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            name: name.into(),
            description: None,
            additional_data: None,
        }
    }

    /// Returns a copy with the description set.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns a copy with the additional data set.
    pub fn with_data(mut self, data: Data) -> Self {
        self.additional_data = Some(data);
        self
    }

    /// Formats the log line appended to the backend's log buffer.
    ///
    /// `Event: {id} | {name}` or `Event: {id} | {name} - {description}`.
    pub fn log_line(&self) -> String {
        match &self.description {
            Some(d) => format!("Event: {} | {} - {}", self.event_id, self.name, d),
            None => format!("Event: {} | {}", self.event_id, self.name),
        }
    }
}

/// The causing error of a report, reduced to its type name and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedError {
    /// Runtime type name of the original error
    pub type_name: String,

    /// Display text of the original error
    pub message: String,
}

impl CapturedError {
    /// Captures an error value.
    pub fn new<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Self {
            type_name: short_type_name::<E>(),
            message: error.to_string(),
        }
    }

    /// Captures a plain message with an explicit type name.
    pub fn from_message(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<E: std::error::Error + ?Sized> From<&E> for CapturedError {
    fn from(error: &E) -> Self {
        CapturedError::new(error)
    }
}

/// Strips module paths from a type name (`std::io::error::Error` → `Error`).
fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// A textual stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackTrace(String);

impl StackTrace {
    /// Wraps an existing trace.
    pub fn new(trace: impl Into<String>) -> Self {
        Self(trace.into())
    }

    /// Captures the current call stack, regardless of `RUST_BACKTRACE`.
    pub fn capture() -> Self {
        Self(Backtrace::force_capture().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An error caught by the application, ready to be logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Identity of the event the error belongs to
    #[serde(flatten)]
    pub event: Event,

    /// The causing error
    pub error: CapturedError,

    /// Trace captured where the error was caught
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTrace>,

    /// Whether the error terminated the operation fatally
    #[serde(default)]
    pub fatal: bool,

    /// Whether a non-fatal error also sets the visibility keys
    #[serde(default = "default_force_visible")]
    pub force_visible: bool,
}

fn default_force_visible() -> bool {
    true
}

impl ErrorReport {
    /// Creates a non-fatal, force-visible report.
    pub fn new(
        event_id: impl Into<String>,
        name: impl Into<String>,
        error: impl Into<CapturedError>,
    ) -> Self {
        Self {
            event: Event::new(event_id, name),
            error: error.into(),
            stack_trace: None,
            fatal: false,
            force_visible: true,
        }
    }

    pub fn with_stack_trace(mut self, trace: StackTrace) -> Self {
        self.stack_trace = Some(trace);
        self
    }

    pub fn fatal(mut self, fatal: bool) -> Self {
        self.fatal = fatal;
        self
    }

    pub fn force_visible(mut self, force_visible: bool) -> Self {
        self.force_visible = force_visible;
        self
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.event.additional_data = Some(data);
        self
    }

    pub fn event_id(&self) -> &str {
        &self.event.event_id
    }

    pub fn name(&self) -> &str {
        &self.event.name
    }

    pub fn additional_data(&self) -> Option<&Data> {
        self.event.additional_data.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_line_without_description() {
        let event = Event::new("btn_tap", "Button Tapped");

        assert_eq!(event.log_line(), "Event: btn_tap | Button Tapped");
    }

    #[test]
    fn log_line_with_description() {
        let event = Event::new("btn_tap", "Button Tapped").with_description("increment");

        assert_eq!(event.log_line(), "Event: btn_tap | Button Tapped - increment");
    }

    #[test]
    fn captured_error_uses_short_type_name() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let captured = CapturedError::new(&io);

        assert_eq!(captured.type_name, "Error");
        assert_eq!(captured.message, "disk on fire");
        assert_eq!(captured.to_string(), "disk on fire");
    }

    #[test]
    fn captured_error_from_parse_error() {
        let err = "x".parse::<i32>().unwrap_err();
        let captured = CapturedError::from(&err);

        assert_eq!(captured.type_name, "ParseIntError");
    }

    #[test]
    fn captured_error_from_boxed_dyn_error() {
        let boxed: Box<dyn std::error::Error> = "x".parse::<u8>().unwrap_err().into();
        let captured = CapturedError::from(&*boxed);

        assert_eq!(captured.type_name, "Error");
        assert_eq!(captured.message, "invalid digit found in string");
    }

    #[test]
    fn stack_trace_capture_is_not_empty() {
        let trace = StackTrace::capture();

        assert!(!trace.as_str().is_empty());
    }

    #[test]
    fn error_report_defaults() {
        let report = ErrorReport::new("e1", "Simulated", CapturedError::from_message("StateError", "bad"));

        assert!(!report.fatal);
        assert!(report.force_visible);
        assert!(report.stack_trace.is_none());
        assert!(report.additional_data().is_none());
    }

    #[test]
    fn error_report_deserializes_with_defaults() {
        let report: ErrorReport = serde_json::from_value(json!({
            "event_id": "e1",
            "name": "Simulated",
            "error": {"type_name": "StateError", "message": "bad"}
        }))
        .unwrap();

        assert_eq!(report.event_id(), "e1");
        assert!(report.force_visible);
        assert!(!report.fatal);
    }
}
