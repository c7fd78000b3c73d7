//! Composite action logging.
//!
//! One user action produces an analytics event and, when both crash
//! identifiers are given, a crash-context event carrying the same
//! parameters as string-coerced additional data.

use crate::analytics::AnalyticsLogger;
use crate::crash::CrashLogger;
use crate::value::{params_to_data, Params};

/// Sequences analytics and crash-context logging for a user action.
#[derive(Debug, Clone)]
pub struct ActionLogger {
    analytics: AnalyticsLogger,
    crash: CrashLogger,
}

impl ActionLogger {
    pub fn new(analytics: AnalyticsLogger, crash: CrashLogger) -> Self {
        Self { analytics, crash }
    }

    /// Logs the analytics event, then the crash-context event if both
    /// `crash_event_id` and `crash_event_name` are set.
    pub async fn log_action(
        &self,
        analytics_event: &str,
        analytics_params: Option<&Params>,
        crash_event_id: Option<&str>,
        crash_event_name: Option<&str>,
    ) {
        self.analytics
            .log_event(analytics_event, analytics_params)
            .await;

        if let (Some(event_id), Some(event_name)) = (crash_event_id, crash_event_name) {
            let data = analytics_params.map(params_to_data);
            self.crash
                .log_event(event_id, event_name, None, data.as_ref())
                .await;
        }
    }
}
