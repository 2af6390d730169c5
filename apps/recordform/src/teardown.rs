//! # Teardown Signal
//!
//! One cancellation signal per form session. Every remote call of the
//! session is raced against it; once fired, pending calls are dropped
//! and their results never reach the form.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared, fire-once cancellation signal.
#[derive(Debug, Clone)]
pub struct Teardown {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Teardown {
    fn default() -> Self {
        Self::new()
    }
}

impl Teardown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal. Idempotent.
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has fired.
    pub async fn fired(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a close.
        let _ = rx.wait_for(|fired| *fired).await;
    }

    /// Run `fut` unless the signal fires first.
    pub async fn guard<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.fired() => None,
            output = fut => Some(output),
        }
    }
}
