//! Development backend that writes every call to `tracing`.
//!
//! Stands in for the vendor SDKs when running locally. Keeps its own
//! last-write-wins key store so `status`-style queries have something to
//! report.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

use crate::backend::{AnalyticsBackend, BackendError, CrashBackend, ErrorRecord};
use crate::value::{stringify_serialize, Params};

/// Console backend for both crash reporting and analytics.
#[derive(Debug)]
pub struct ConsoleBackend {
    keys: Mutex<BTreeMap<String, String>>,
    collection_enabled: Mutex<bool>,
}

impl ConsoleBackend {
    pub fn new(collection_enabled: bool) -> Self {
        Self {
            keys: Mutex::new(BTreeMap::new()),
            collection_enabled: Mutex::new(collection_enabled),
        }
    }

    /// Returns a snapshot of the context key store.
    pub fn keys(&self) -> BTreeMap<String, String> {
        self.keys.lock().clone()
    }
}

impl Default for ConsoleBackend {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl CrashBackend for ConsoleBackend {
    async fn set_custom_key(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.keys.lock().insert(key.to_string(), value.to_string());
        info!(target: "telemetry::crash", key, value, "custom key");
        Ok(())
    }

    async fn set_user_identifier(&self, user_id: &str) -> Result<(), BackendError> {
        info!(target: "telemetry::crash", user_id, "user identifier");
        Ok(())
    }

    fn log(&self, message: &str) -> Result<(), BackendError> {
        info!(target: "telemetry::crash", "{}", message);
        Ok(())
    }

    async fn record_error(&self, record: &ErrorRecord) -> Result<(), BackendError> {
        if !*self.collection_enabled.lock() {
            warn!(target: "telemetry::crash", "collection disabled, error not recorded");
            return Ok(());
        }
        let reason = record.reason.as_deref().unwrap_or_default();
        if record.fatal {
            error!(
                target: "telemetry::crash",
                error_type = %record.error.type_name,
                reason,
                "fatal: {}",
                record.error
            );
        } else {
            warn!(
                target: "telemetry::crash",
                error_type = %record.error.type_name,
                reason,
                "non-fatal: {}",
                record.error
            );
        }
        if record.print_details {
            if let Some(trace) = &record.stack_trace {
                info!(target: "telemetry::crash", "stack trace:\n{}", trace);
            }
            info!(target: "telemetry::crash", "keys: {}", stringify_serialize(&self.keys()));
        }
        Ok(())
    }

    fn is_collection_enabled(&self) -> Result<bool, BackendError> {
        Ok(*self.collection_enabled.lock())
    }

    async fn set_collection_enabled(&self, enabled: bool) -> Result<(), BackendError> {
        *self.collection_enabled.lock() = enabled;
        info!(target: "telemetry::crash", enabled, "collection toggled");
        Ok(())
    }

    fn crash(&self) -> ! {
        error!(target: "telemetry::crash", "forced crash");
        std::process::abort()
    }
}

#[async_trait]
impl AnalyticsBackend for ConsoleBackend {
    async fn log_event(&self, name: &str, parameters: Option<&Params>) -> Result<(), BackendError> {
        match parameters {
            Some(params) => {
                let params = serde_json::to_string(params)?;
                info!(target: "telemetry::analytics", name, params, "event");
            }
            None => info!(target: "telemetry::analytics", name, "event"),
        }
        Ok(())
    }

    async fn log_screen_view(
        &self,
        screen_name: &str,
        screen_class: Option<&str>,
    ) -> Result<(), BackendError> {
        info!(
            target: "telemetry::analytics",
            screen_name,
            screen_class = screen_class.unwrap_or(screen_name),
            "screen view"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_last_written_key() {
        let backend = ConsoleBackend::default();

        backend.set_custom_key("k", "1").await.unwrap();
        backend.set_custom_key("k", "2").await.unwrap();

        assert_eq!(backend.keys().get("k").map(String::as_str), Some("2"));
    }

    #[tokio::test]
    async fn collection_flag_round_trips() {
        let backend = ConsoleBackend::new(false);
        assert!(!backend.is_collection_enabled().unwrap());

        backend.set_collection_enabled(true).await.unwrap();

        assert!(backend.is_collection_enabled().unwrap());
    }
}
