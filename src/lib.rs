//! Telemetry facade - best-effort crash reporting and analytics logging
//!
//! Wraps a crash-reporting backend and an analytics backend behind thin
//! logging facades that never fail. Backends are injected as trait objects,
//! so vendor SDKs, a development console, or a test double can be swapped
//! in at the composition root.
//!
//! # Features
//!
//! - Structured events and errors with context key tagging
//! - Visible non-fatal errors and detailed non-fatal error blocks
//! - Usage events and screen views
//! - Composite action logging across both backends
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use telemetry_facade::{MemoryBackend, Params, Telemetry, TelemetryConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let crash = Arc::new(MemoryBackend::new());
//! let analytics = Arc::new(MemoryBackend::new());
//! let telemetry = Telemetry::init(&TelemetryConfig::default(), crash.clone(), analytics).await;
//!
//! let mut params = Params::new();
//! params.insert("value".into(), 1.into());
//! telemetry
//!     .actions
//!     .log_action("counter_incremented", Some(&params), Some("counter"), Some("Counter Incremented"))
//!     .await;
//!
//! assert_eq!(crash.key("value").as_deref(), Some("1"));
//! # }
//! ```

pub mod action;
pub mod analytics;
pub mod backend;
mod best_effort;
pub mod config;
pub mod console;
pub mod crash;
pub mod event;
pub mod memory;
pub mod value;

pub use action::ActionLogger;
pub use analytics::AnalyticsLogger;
pub use backend::{AnalyticsBackend, BackendError, CrashBackend, ErrorRecord};
pub use config::{ConfigError, TelemetryConfig};
pub use console::ConsoleBackend;
pub use crash::CrashLogger;
pub use event::{CapturedError, ErrorReport, Event, StackTrace};
pub use memory::{Call, FailureMode, MemoryBackend};
pub use value::{stringify, Data, ParamValue, Params};

use std::sync::Arc;
use tracing::info;

/// The three facades wired to the same pair of backends.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub crash: CrashLogger,
    pub analytics: AnalyticsLogger,
    pub actions: ActionLogger,
}

impl Telemetry {
    /// Builds the facades without touching backend state.
    pub fn new(crash: Arc<dyn CrashBackend>, analytics: Arc<dyn AnalyticsBackend>) -> Self {
        let crash = CrashLogger::new(crash);
        let analytics = AnalyticsLogger::new(analytics);
        let actions = ActionLogger::new(analytics.clone(), crash.clone());
        Self {
            crash,
            analytics,
            actions,
        }
    }

    /// Builds the facades and applies `config` to the crash backend.
    ///
    /// Sets the collection flag, the `app_name` and `app_version` keys, and
    /// the user id when one is configured. Like every facade call, this
    /// never fails.
    pub async fn init(
        config: &TelemetryConfig,
        crash: Arc<dyn CrashBackend>,
        analytics: Arc<dyn AnalyticsBackend>,
    ) -> Self {
        let telemetry = Self::new(crash, analytics);

        telemetry
            .crash
            .set_collection_enabled(config.collection_enabled)
            .await;
        telemetry.crash.set_custom_key("app_name", &config.app_name).await;
        telemetry
            .crash
            .set_custom_key("app_version", &config.app_version)
            .await;
        if let Some(user_id) = &config.user_id {
            telemetry.crash.set_user_id(user_id).await;
        }

        info!(
            app_name = %config.app_name,
            app_version = %config.app_version,
            collection_enabled = config.collection_enabled,
            "telemetry initialized"
        );
        telemetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_applies_config() {
        let crash = Arc::new(MemoryBackend::new());
        let analytics = Arc::new(MemoryBackend::new());
        let config = TelemetryConfig {
            app_name: "demo".into(),
            app_version: "1.0.0".into(),
            collection_enabled: true,
            user_id: Some("user-7".into()),
        };

        let telemetry = Telemetry::init(&config, crash.clone(), analytics.clone()).await;

        assert!(telemetry.crash.is_collection_enabled());
        assert_eq!(crash.key("app_name").as_deref(), Some("demo"));
        assert_eq!(crash.key("app_version").as_deref(), Some("1.0.0"));
        assert_eq!(crash.user_id().as_deref(), Some("user-7"));
        assert!(analytics.calls().is_empty());
    }

    #[tokio::test]
    async fn init_survives_failing_backends() {
        let crash = Arc::new(MemoryBackend::failing(FailureMode::Panic));
        let analytics = Arc::new(MemoryBackend::failing(FailureMode::Error));

        let telemetry = Telemetry::init(&TelemetryConfig::default(), crash, analytics).await;
        telemetry
            .actions
            .log_action("x", None, Some("id"), Some("name"))
            .await;

        assert!(!telemetry.crash.is_collection_enabled());
    }

    #[tokio::test]
    async fn facades_are_usable_across_tasks() {
        let crash = Arc::new(MemoryBackend::new());
        let telemetry = Telemetry::new(crash.clone(), Arc::new(MemoryBackend::new()));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let t = telemetry.clone();
                tokio::spawn(async move {
                    t.crash.set_custom_key("last_task", &i).await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let last = crash.key("last_task").unwrap();
        assert!(["0", "1", "2", "3"].contains(&last.as_str()));
    }
}
