//! Cancellation token threaded through every orchestration call

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

/// Token for cancelling an in-flight chat turn
///
/// Cloning shares state. `child_token` produces a token that is cancelled
/// together with its parent but can also be cancelled on its own, which is
/// how the planning call gets a private budget without detaching from the
/// caller's cancellation.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationTokenInner>,
}

struct CancellationTokenInner {
    cancelled: AtomicBool,
    notify: Notify,
    children: Mutex<Vec<CancellationToken>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Create a new cancellation token
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationTokenInner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Check if cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation of this token and every child
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
            let children = std::mem::take(&mut *self.inner.children.lock());
            for child in children {
                child.cancel();
            }
        }
    }

    /// Wait until cancellation is requested
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not missed
        notified.as_mut().enable();

        if self.is_cancelled() {
            return;
        }

        notified.await;
    }

    /// Create a child token that is cancelled when this token is cancelled
    pub fn child_token(&self) -> CancellationToken {
        let child = CancellationToken::new();
        let mut children = self.inner.children.lock();
        if self.is_cancelled() {
            drop(children);
            child.cancel();
        } else {
            children.retain(|c| !c.is_cancelled());
            children.push(child.clone());
        }
        child
    }

    /// Run a future until it completes or this token is cancelled
    ///
    /// Returns `None` when cancellation won the race.
    pub async fn run_until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());

        // Multiple cancels are idempotent
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cloned_token_shares_state() {
        let token1 = CancellationToken::new();
        let token2 = token1.clone();

        token1.cancel();

        assert!(token1.is_cancelled());
        assert!(token2.is_cancelled());
    }

    #[test]
    fn test_child_follows_parent() {
        let parent = CancellationToken::new();
        let child = parent.child_token();

        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_child_cancel_does_not_reach_parent() {
        let parent = CancellationToken::new();
        let child = parent.child_token();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_child_of_cancelled_parent_starts_cancelled() {
        let parent = CancellationToken::new();
        parent.cancel();
        assert!(parent.child_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_future() {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        let handle = tokio::spawn(async move {
            token_clone.cancelled().await;
            "cancelled"
        });

        token.cancel();

        let result = handle.await.unwrap();
        assert_eq!(result, "cancelled");
    }

    #[tokio::test]
    async fn test_run_until_cancelled() {
        let token = CancellationToken::new();
        assert_eq!(token.run_until_cancelled(async { 7 }).await, Some(7));

        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter
                .run_until_cancelled(tokio::time::sleep(Duration::from_secs(30)))
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
        assert_eq!(handle.await.unwrap(), None);
    }
}
