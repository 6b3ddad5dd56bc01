//! Explicit cancellation for list fetches tied to a selection
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Shared {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Cloneable cancellation signal. Cancelling is permanent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    shared: Arc<Shared>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`CancelToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        loop {
            // register before checking so a concurrent cancel is not missed
            let notified = self.shared.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Runs `fut` unless the token fires first, in which case `None` is returned.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let token = CancelToken::new();
        assert_eq!(token.run(async { 5 }).await, Some(5));
    }

    #[tokio::test]
    async fn cancel_interrupts_pending_work() {
        let token = CancelToken::new();
        let worker = token.clone();
        let handle = tokio::spawn(async move {
            worker
                .run(tokio::time::sleep(Duration::from_secs(60)))
                .await
        });
        tokio::task::yield_now().await;
        token.cancel();
        assert_eq!(handle.await.unwrap(), None);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits() {
        let token = CancelToken::new();
        token.cancel();
        assert_eq!(token.run(async { 1 }).await, None);
    }
}
