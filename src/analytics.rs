//! Usage analytics facade.

use std::sync::Arc;
use tracing::debug;

use crate::backend::AnalyticsBackend;
use crate::best_effort::attempt;
use crate::value::Params;

/// Best-effort facade over an analytics backend.
#[derive(Clone)]
pub struct AnalyticsLogger {
    backend: Arc<dyn AnalyticsBackend>,
}

impl std::fmt::Debug for AnalyticsLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsLogger").finish_non_exhaustive()
    }
}

impl AnalyticsLogger {
    pub fn new(backend: Arc<dyn AnalyticsBackend>) -> Self {
        Self { backend }
    }

    /// Forwards a named usage event.
    pub async fn log_event(&self, name: &str, parameters: Option<&Params>) {
        if attempt("analytics.log_event", self.backend.log_event(name, parameters))
            .await
            .is_some()
        {
            debug!(name, "analytics event forwarded");
        }
    }

    /// Forwards a screen-view notification.
    pub async fn log_screen_view(&self, screen_name: &str, screen_class: Option<&str>) {
        attempt(
            "analytics.log_screen_view",
            self.backend.log_screen_view(screen_name, screen_class),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Call, FailureMode, MemoryBackend};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn log_event_forwards_name_and_params() {
        let backend = Arc::new(MemoryBackend::new());
        let analytics = AnalyticsLogger::new(backend.clone());
        let mut params = Params::new();
        params.insert("value".into(), 5.into());

        analytics.log_event("counter_incremented", Some(&params)).await;
        analytics.log_event("app_open", None).await;

        assert_eq!(
            backend.calls(),
            vec![
                Call::LogEvent {
                    name: "counter_incremented".into(),
                    parameters: Some(params),
                },
                Call::LogEvent {
                    name: "app_open".into(),
                    parameters: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn log_screen_view_forwards_class() {
        let backend = Arc::new(MemoryBackend::new());
        let analytics = AnalyticsLogger::new(backend.clone());

        analytics.log_screen_view("Home", Some("HomePage")).await;

        assert_eq!(
            backend.calls(),
            vec![Call::LogScreenView {
                screen_name: "Home".into(),
                screen_class: Some("HomePage".into()),
            }]
        );
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        for mode in [FailureMode::Error, FailureMode::Panic] {
            let backend = Arc::new(MemoryBackend::failing(mode));
            let analytics = AnalyticsLogger::new(backend.clone());

            analytics.log_event("x", None).await;
            analytics.log_screen_view("Home", None).await;

            assert!(backend.calls().is_empty());
        }
    }
}
