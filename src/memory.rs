//! In-memory backend that records every call.
//!
//! Implements both [`CrashBackend`] and [`AnalyticsBackend`]. Used as the
//! test double for the facades, and handy for applications that want to
//! inspect what would have been sent.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::backend::{AnalyticsBackend, BackendError, CrashBackend, ErrorRecord};
use crate::value::Params;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SetCustomKey { key: String, value: String },
    SetUserIdentifier(String),
    Log(String),
    RecordError(ErrorRecord),
    SetCollectionEnabled(bool),
    LogEvent { name: String, parameters: Option<Params> },
    LogScreenView { screen_name: String, screen_class: Option<String> },
}

/// How the backend reacts to calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Every call succeeds.
    #[default]
    Healthy,
    /// Every call returns [`BackendError::Unavailable`] without recording.
    Error,
    /// Every call panics.
    Panic,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    keys: BTreeMap<String, String>,
    user_id: Option<String>,
    collection_enabled: bool,
    failure: FailureMode,
    fail_on: Option<&'static str>,
}

/// Recording backend with a last-write-wins key store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that fails every call in the given way.
    pub fn failing(mode: FailureMode) -> Self {
        let backend = Self::default();
        backend.set_failure_mode(mode);
        backend
    }

    pub fn set_failure_mode(&self, mode: FailureMode) {
        self.state.lock().failure = mode;
    }

    /// Returns every recorded call, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Returns a snapshot of the context key store.
    pub fn keys(&self) -> BTreeMap<String, String> {
        self.state.lock().keys.clone()
    }

    pub fn key(&self, key: &str) -> Option<String> {
        self.state.lock().keys.get(key).cloned()
    }

    pub fn user_id(&self) -> Option<String> {
        self.state.lock().user_id.clone()
    }

    /// Returns the recorded `set_custom_key` calls as (key, value) pairs.
    pub fn key_sets(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::SetCustomKey { key, value } => Some((key.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn logs(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Log(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::RecordError(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    /// Makes every call to the named operation return
    /// [`BackendError::Rejected`], leaving other operations healthy.
    pub fn fail_on(&self, op: &'static str) {
        self.state.lock().fail_on = Some(op);
    }

    /// Undoes [`fail_on`](Self::fail_on).
    pub fn clear_failure(&self) {
        self.state.lock().fail_on = None;
    }

    /// Applies `apply` to the state unless the failure mode says otherwise.
    fn with_state<T>(&self, op: &str, apply: impl FnOnce(&mut State) -> T) -> Result<T, BackendError> {
        let mut state = self.state.lock();
        if state.fail_on == Some(op) {
            return Err(BackendError::Rejected(format!("{} rejected", op)));
        }
        let failure = state.failure;
        match failure {
            FailureMode::Healthy => Ok(apply(&mut *state)),
            FailureMode::Error => Err(BackendError::Unavailable(format!("{} failed", op))),
            FailureMode::Panic => {
                drop(state);
                panic!("{} panicked", op)
            }
        }
    }
}

#[async_trait]
impl CrashBackend for MemoryBackend {
    async fn set_custom_key(&self, key: &str, value: &str) -> Result<(), BackendError> {
        self.with_state("set_custom_key", |s| {
            s.keys.insert(key.to_string(), value.to_string());
            s.calls.push(Call::SetCustomKey {
                key: key.to_string(),
                value: value.to_string(),
            });
        })
    }

    async fn set_user_identifier(&self, user_id: &str) -> Result<(), BackendError> {
        self.with_state("set_user_identifier", |s| {
            s.user_id = Some(user_id.to_string());
            s.calls.push(Call::SetUserIdentifier(user_id.to_string()));
        })
    }

    fn log(&self, message: &str) -> Result<(), BackendError> {
        self.with_state("log", |s| s.calls.push(Call::Log(message.to_string())))
    }

    async fn record_error(&self, record: &ErrorRecord) -> Result<(), BackendError> {
        self.with_state("record_error", |s| s.calls.push(Call::RecordError(record.clone())))
    }

    fn is_collection_enabled(&self) -> Result<bool, BackendError> {
        self.with_state("is_collection_enabled", |s| s.collection_enabled)
    }

    async fn set_collection_enabled(&self, enabled: bool) -> Result<(), BackendError> {
        self.with_state("set_collection_enabled", |s| {
            s.collection_enabled = enabled;
            s.calls.push(Call::SetCollectionEnabled(enabled));
        })
    }

    /// Panics instead of terminating, so tests can observe it.
    fn crash(&self) -> ! {
        panic!("crash requested")
    }
}

#[async_trait]
impl AnalyticsBackend for MemoryBackend {
    async fn log_event(&self, name: &str, parameters: Option<&Params>) -> Result<(), BackendError> {
        self.with_state("log_event", |s| {
            s.calls.push(Call::LogEvent {
                name: name.to_string(),
                parameters: parameters.cloned(),
            })
        })
    }

    async fn log_screen_view(
        &self,
        screen_name: &str,
        screen_class: Option<&str>,
    ) -> Result<(), BackendError> {
        self.with_state("log_screen_view", |s| {
            s.calls.push(Call::LogScreenView {
                screen_name: screen_name.to_string(),
                screen_class: screen_class.map(str::to_string),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keys_are_last_write_wins() {
        let backend = MemoryBackend::new();

        backend.set_custom_key("k", "one").await.unwrap();
        backend.set_custom_key("k", "two").await.unwrap();

        assert_eq!(backend.key("k").as_deref(), Some("two"));
        assert_eq!(backend.key_sets().len(), 2);
    }

    #[tokio::test]
    async fn error_mode_records_nothing() {
        let backend = MemoryBackend::failing(FailureMode::Error);

        assert!(backend.set_custom_key("k", "v").await.is_err());
        assert!(backend.log("line").is_err());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn fail_on_rejects_only_the_named_operation() {
        let backend = MemoryBackend::new();
        backend.fail_on("log");

        assert!(matches!(backend.log("line"), Err(BackendError::Rejected(_))));
        backend.set_custom_key("k", "v").await.unwrap();

        assert_eq!(backend.calls().len(), 1);
    }

    #[test]
    fn collection_defaults_to_disabled() {
        let backend = MemoryBackend::new();

        assert!(!backend.is_collection_enabled().unwrap());
    }
}
