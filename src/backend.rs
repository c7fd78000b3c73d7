//! Telemetry backend interfaces.
//!
//! The facades never talk to a vendor SDK directly. They hold a handle to
//! one of these traits, injected by the composition root, so a test double
//! or a development console can stand in for the real client.
//!
//! The context key/value store lives behind [`CrashBackend`]. Writes are
//! last-write-wins and keys can only be overwritten, never removed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{CapturedError, StackTrace};
use crate::value::Params;

/// Errors a backend may report. None of these ever reach facade callers.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend rejected the call: {0}")]
    Rejected(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Backend panicked: {0}")]
    Panicked(String),
}

/// A single `record_error` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: CapturedError,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<StackTrace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub fatal: bool,
    #[serde(default)]
    pub print_details: bool,
}

/// Crash-reporting backend.
#[async_trait]
pub trait CrashBackend: Send + Sync {
    /// Sets a context key attached to subsequent crash and error records.
    async fn set_custom_key(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Associates subsequent records with a user.
    async fn set_user_identifier(&self, user_id: &str) -> Result<(), BackendError>;

    /// Appends a line to the backend's log buffer. Fire-and-forget.
    fn log(&self, message: &str) -> Result<(), BackendError>;

    /// Records a fatal or non-fatal error.
    async fn record_error(&self, record: &ErrorRecord) -> Result<(), BackendError>;

    fn is_collection_enabled(&self) -> Result<bool, BackendError>;

    async fn set_collection_enabled(&self, enabled: bool) -> Result<(), BackendError>;

    /// Terminates the process.
    fn crash(&self) -> !;
}

/// Analytics backend.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    async fn log_event(&self, name: &str, parameters: Option<&Params>) -> Result<(), BackendError>;

    async fn log_screen_view(
        &self,
        screen_name: &str,
        screen_class: Option<&str>,
    ) -> Result<(), BackendError>;
}
