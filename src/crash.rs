//! Crash-reporting facade.
//!
//! [`CrashLogger`] formats events and errors, tags them with context keys,
//! and forwards them to a [`CrashBackend`]. Every operation except
//! [`CrashLogger::force_crash`] is best-effort: backend errors and panics
//! are reduced to a `tracing` diagnostic and never reach the caller.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use telemetry_facade::{CrashLogger, ErrorReport, CapturedError, MemoryBackend};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let backend = Arc::new(MemoryBackend::new());
//! let crash = CrashLogger::new(backend.clone());
//!
//! crash.log_event("checkout", "Checkout Started", None, None).await;
//!
//! let report = ErrorReport::new(
//!     "checkout",
//!     "Checkout Failed",
//!     CapturedError::from_message("PaymentError", "card declined"),
//! );
//! crash.log_error(&report).await;
//!
//! assert_eq!(backend.errors().len(), 1);
//! # }
//! ```

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::backend::{BackendError, CrashBackend, ErrorRecord};
use crate::best_effort::{attempt, attempt_sync};
use crate::event::{CapturedError, ErrorReport, Event, StackTrace};
use crate::value::{self, stringify, stringify_serialize, Data};

/// First log line of a non-fatal error block.
pub const NON_FATAL_BANNER: &str = "=== NON-FATAL ERROR ===";

/// Marker prefixed to the reason of every `log_non_fatal_error` record.
pub const NON_FATAL_MARKER: &str = "[NON_FATAL_ERROR]";

/// Best-effort facade over a crash-reporting backend.
#[derive(Clone)]
pub struct CrashLogger {
    backend: Arc<dyn CrashBackend>,
}

impl std::fmt::Debug for CrashLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrashLogger").finish_non_exhaustive()
    }
}

impl CrashLogger {
    pub fn new(backend: Arc<dyn CrashBackend>) -> Self {
        Self { backend }
    }

    /// Tags the backend context with an event and appends its log line.
    ///
    /// Sets `event_id`, `event_name`, `event_description` (when given) and one
    /// key per additional data entry, in that order, then logs
    /// `Event: {id} | {name}[ - {description}]`.
    pub async fn log_event(
        &self,
        event_id: &str,
        event_name: &str,
        description: Option<&str>,
        additional_data: Option<&Data>,
    ) {
        attempt(
            "log_event",
            self.try_log_event(event_id, event_name, description, additional_data),
        )
        .await;
    }

    /// Same as [`log_event`](Self::log_event) for a prebuilt [`Event`].
    pub async fn log(&self, event: &Event) {
        self.log_event(
            &event.event_id,
            &event.name,
            event.description.as_deref(),
            event.additional_data.as_ref(),
        )
        .await;
    }

    async fn try_log_event(
        &self,
        event_id: &str,
        event_name: &str,
        description: Option<&str>,
        additional_data: Option<&Data>,
    ) -> Result<(), BackendError> {
        self.backend.set_custom_key(value::KEY_EVENT_ID, event_id).await?;
        self.backend.set_custom_key(value::KEY_EVENT_NAME, event_name).await?;
        if let Some(description) = description {
            self.backend
                .set_custom_key(value::KEY_EVENT_DESCRIPTION, description)
                .await?;
        }
        self.set_data_keys("", additional_data).await?;

        let mut event = Event::new(event_id, event_name);
        event.description = description.map(str::to_string);
        self.backend.log(&event.log_line())?;

        debug!(event_id, event_name, "event forwarded");
        Ok(())
    }

    /// Logs a caught error.
    ///
    /// A non-fatal, force-visible report is recorded once and then
    /// reinforced with the `last_non_fatal_*` keys. Any other report is
    /// recorded once with a `[FATAL]` or `[NON-FATAL]` reason.
    pub async fn log_error(&self, report: &ErrorReport) {
        attempt("log_error", self.try_log_error(report)).await;
    }

    async fn try_log_error(&self, report: &ErrorReport) -> Result<(), BackendError> {
        let event_id = report.event_id();
        let event_name = report.name();
        let error = &report.error;

        self.backend.set_custom_key(value::KEY_ERROR_EVENT_ID, event_id).await?;
        self.backend
            .set_custom_key(value::KEY_ERROR_EVENT_NAME, event_name)
            .await?;
        self.backend
            .set_custom_key(value::KEY_IS_FATAL, if report.fatal { "true" } else { "false" })
            .await?;
        self.backend
            .set_custom_key(
                value::KEY_ERROR_TYPE,
                if report.fatal { "FATAL" } else { "NON_FATAL" },
            )
            .await?;
        self.set_data_keys(value::ERROR_DATA_PREFIX, report.additional_data())
            .await?;

        self.backend
            .log(&format!("Error in {} ({}): {}", event_id, event_name, error))?;

        if !report.fatal && report.force_visible {
            let record = ErrorRecord {
                error: error.clone(),
                stack_trace: report.stack_trace.clone(),
                reason: Some(format!(
                    "Visible non-fatal in {} ({}): {}",
                    event_id, event_name, error
                )),
                fatal: false,
                print_details: false,
            };
            self.backend.record_error(&record).await?;

            self.backend
                .set_custom_key(
                    value::KEY_LAST_NON_FATAL_ERROR,
                    &format!("{}: {}", event_id, event_name),
                )
                .await?;
            self.backend
                .set_custom_key(value::KEY_LAST_NON_FATAL_TIME, &timestamp())
                .await?;
            self.backend
                .set_custom_key(value::KEY_LAST_NON_FATAL_MESSAGE, &error.message)
                .await?;
        } else {
            let tag = if report.fatal { "[FATAL]" } else { "[NON-FATAL]" };
            let record = ErrorRecord {
                error: error.clone(),
                stack_trace: report.stack_trace.clone(),
                reason: Some(format!("{} {} ({}): {}", tag, event_id, event_name, error)),
                fatal: report.fatal,
                print_details: false,
            };
            self.backend.record_error(&record).await?;
        }

        debug!(event_id, fatal = report.fatal, "error forwarded");
        Ok(())
    }

    /// Records a non-fatal error with a detailed log block.
    ///
    /// Without a `stack_trace`, the trace of this call is captured instead.
    pub async fn log_non_fatal_error(
        &self,
        event_id: &str,
        event_name: &str,
        error: impl Into<CapturedError>,
        stack_trace: Option<StackTrace>,
        additional_data: Option<&Data>,
    ) {
        let error = error.into();
        let stack_trace = stack_trace.unwrap_or_else(StackTrace::capture);
        attempt(
            "log_non_fatal_error",
            self.try_log_non_fatal_error(event_id, event_name, &error, stack_trace, additional_data),
        )
        .await;
    }

    async fn try_log_non_fatal_error(
        &self,
        event_id: &str,
        event_name: &str,
        error: &CapturedError,
        stack_trace: StackTrace,
        additional_data: Option<&Data>,
    ) -> Result<(), BackendError> {
        let now = timestamp();

        self.backend
            .set_custom_key(value::KEY_NON_FATAL_EVENT_ID, event_id)
            .await?;
        self.backend
            .set_custom_key(value::KEY_NON_FATAL_EVENT_NAME, event_name)
            .await?;
        self.backend
            .set_custom_key(value::KEY_NON_FATAL_TIMESTAMP, &now)
            .await?;
        self.backend
            .set_custom_key(value::KEY_NON_FATAL_ERROR_TYPE, &error.type_name)
            .await?;
        self.set_data_keys(value::NON_FATAL_DATA_PREFIX, additional_data)
            .await?;

        self.backend.log(NON_FATAL_BANNER)?;
        self.backend.log(&format!("Event ID: {}", event_id))?;
        self.backend.log(&format!("Event Name: {}", event_name))?;
        self.backend.log(&format!("Error: {}", error))?;
        self.backend.log(&format!("Timestamp: {}", now))?;
        if let Some(data) = additional_data {
            self.backend
                .log(&format!("Additional Data: {}", stringify_serialize(data)))?;
        }

        let record = ErrorRecord {
            error: error.clone(),
            stack_trace: Some(stack_trace),
            reason: Some(format!(
                "{} {} ({}): {}",
                NON_FATAL_MARKER, event_id, event_name, error
            )),
            fatal: false,
            print_details: true,
        };
        self.backend.record_error(&record).await?;

        debug!(event_id, "non-fatal error forwarded");
        Ok(())
    }

    pub async fn set_user_id(&self, user_id: &str) {
        attempt("set_user_id", self.backend.set_user_identifier(user_id)).await;
    }

    /// Sets one context key; the value is string-coerced.
    pub async fn set_custom_key<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        attempt("set_custom_key", async {
            let value = stringify_serialize(value);
            self.backend.set_custom_key(key, &value).await
        })
        .await;
    }

    /// Overwrites `event_id`, `event_name` and `event_description` with `""`.
    ///
    /// Other keys cannot be removed from the backend and are left alone.
    pub async fn clear_custom_keys(&self) {
        attempt("clear_custom_keys", async {
            for key in value::CLEARABLE_KEYS {
                self.backend.set_custom_key(key, "").await?;
            }
            Ok::<_, BackendError>(())
        })
        .await;
    }

    /// Returns `false` when the backend cannot answer.
    pub fn is_collection_enabled(&self) -> bool {
        attempt_sync("is_collection_enabled", || self.backend.is_collection_enabled())
            .unwrap_or_default()
    }

    pub async fn set_collection_enabled(&self, enabled: bool) {
        attempt(
            "set_collection_enabled",
            self.backend.set_collection_enabled(enabled),
        )
        .await;
    }

    /// Terminates the process through the backend. Test and demo hook.
    pub fn force_crash(&self) -> ! {
        self.backend.crash()
    }

    async fn set_data_keys(&self, prefix: &str, data: Option<&Data>) -> Result<(), BackendError> {
        let Some(data) = data else {
            return Ok(());
        };
        for (key, value) in data {
            self.backend
                .set_custom_key(&format!("{}{}", prefix, key), &stringify(value))
                .await?;
        }
        Ok(())
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}
