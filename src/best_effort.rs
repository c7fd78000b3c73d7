//! The single place where backend failures are discarded.
//!
//! Facade operations build a `Result<_, BackendError>` internally and hand it
//! to [`attempt`] (async) or [`attempt_sync`]. Errors and panics raised by
//! the backend stop here: they become a `tracing` diagnostic and the caller
//! gets `None`.

use futures_util::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::warn;

use crate::backend::BackendError;

/// Runs a fallible backend chain, swallowing errors and panics.
pub(crate) async fn attempt<T, F>(operation: &'static str, chain: F) -> Option<T>
where
    F: Future<Output = Result<T, BackendError>>,
{
    let result = match AssertUnwindSafe(chain).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(BackendError::Panicked(panic_message(payload.as_ref()))),
    };
    settle(operation, result)
}

/// Synchronous counterpart of [`attempt`].
pub(crate) fn attempt_sync<T, F>(operation: &'static str, call: F) -> Option<T>
where
    F: FnOnce() -> Result<T, BackendError>,
{
    let result = match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => Err(BackendError::Panicked(panic_message(payload.as_ref()))),
    };
    settle(operation, result)
}

fn settle<T>(operation: &'static str, result: Result<T, BackendError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(operation, %error, "telemetry call failed, continuing");
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exploding_call() -> Result<(), BackendError> {
        panic!("backend exploded")
    }

    fn exploding_query() -> Result<bool, BackendError> {
        panic!("boom")
    }

    #[tokio::test]
    async fn attempt_passes_through_success() {
        let value = attempt("ok", async { Ok::<_, BackendError>(7) }).await;

        assert_eq!(value, Some(7));
    }

    #[tokio::test]
    async fn attempt_swallows_errors() {
        let value: Option<()> = attempt("fails", async {
            Err(BackendError::Unavailable("offline".into()))
        })
        .await;

        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn attempt_swallows_panics() {
        let value = attempt("panics", exploding_call()).await;

        assert_eq!(value, None);
    }

    #[test]
    fn attempt_sync_swallows_panics() {
        let value = attempt_sync("panics", exploding_query);

        assert_eq!(value, None);
    }

    #[test]
    fn panic_message_reads_string_payloads() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");

        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
