//! Cancellation and deadline propagation for warmup runs.

use std::time::Duration;

use tokio::{sync::watch, time::Instant};

/// Why a [`WarmupContext`] finished before its work completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CancelCause {
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("context canceled")]
    Canceled,
}

/// A cancellable, optionally deadline-bound scope handed to a warmup run.
///
/// Cancellation is driven by a `watch` channel carrying `true` once the scope
/// is cancelled. Contexts are cheap to clone; clones observe the same signal.
#[derive(Debug, Clone)]
pub struct WarmupContext {
    cancel_rx: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

/// Cancels every [`WarmupContext`] derived from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl WarmupContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self::new(rx)
    }

    /// Derive a context from an existing cancellation signal (e.g. process shutdown).
    pub fn new(cancel_rx: watch::Receiver<bool>) -> Self {
        Self {
            cancel_rx,
            deadline: None,
        }
    }

    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self::new(rx), CancelHandle { tx })
    }

    /// Child context that additionally expires after `timeout`. The earlier of
    /// the parent and child deadlines wins.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            cancel_rx: self.cancel_rx.clone(),
            deadline: Some(match self.deadline {
                Some(parent) if parent < deadline => parent,
                _ => deadline,
            }),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Non-blocking check; `None` while the context is still live.
    pub fn err(&self) -> Option<CancelCause> {
        if *self.cancel_rx.borrow() {
            return Some(CancelCause::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelCause::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> CancelCause {
        let mut rx = self.cancel_rx.clone();
        let canceled = async move {
            // A dropped sender can never cancel, so wait forever.
            if rx.wait_for(|canceled| *canceled).await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = canceled => CancelCause::Canceled,
                _ = tokio::time::sleep_until(deadline) => CancelCause::DeadlineExceeded,
            },
            None => {
                canceled.await;
                CancelCause::Canceled
            }
        }
    }
}
