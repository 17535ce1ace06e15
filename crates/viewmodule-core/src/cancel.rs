#![forbid(unsafe_code)]

//! Cooperative cancellation scopes for async commands.
//!
//! A [`CancelSource`] is owned by exactly one command. Each run of the command
//! receives a [`CancelToken`] cloned from the current source; the token is a
//! read-only view that the running action polls (`is_cancelled`, `check`) or
//! awaits (`cancelled`, `sleep`). Requesting cancellation only marks the
//! scope: the action decides where it stops.
//!
//! After every run the owning command disposes its source and installs a
//! fresh one, so a late `cancel()` aimed at a finished run can never leak into
//! the next one.
//!
//! # Example
//!
//! ```
//! use viewmodule_core::cancel::CancelSource;
//!
//! let source = CancelSource::new();
//! let token = source.token();
//! assert!(!token.is_cancelled());
//!
//! source.cancel();
//! assert!(token.is_cancelled());
//! assert!(token.check().is_err());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Notify;

// ─── Scope ID generation ─────────────────────────────────────────────────────

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

fn next_scope_id() -> u64 {
    NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)
}

// ─── Metrics counters ────────────────────────────────────────────────────────

static CANCELLATIONS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Total number of scopes cancelled in this process (for diagnostics).
#[must_use]
pub fn cancellations_total() -> u64 {
    CANCELLATIONS_TOTAL.load(Ordering::Relaxed)
}

// ─── Cancelled ───────────────────────────────────────────────────────────────

/// The cancellation signal. Not a fault: commands treat it as a normal exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

// ─── Shared state ────────────────────────────────────────────────────────────

#[derive(Debug)]
struct ScopeInner {
    id: u64,
    cancelled: AtomicBool,
    notify: Notify,
}

// ─── CancelToken ─────────────────────────────────────────────────────────────

/// Read-only handle observing one cancellation scope.
///
/// Cheaply cloneable. Check it at natural yield points.
#[derive(Clone, Debug)]
pub struct CancelToken {
    inner: Arc<ScopeInner>,
}

impl CancelToken {
    /// Identifier of the scope this token observes.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    ///
    /// ```ignore
    /// token.check()?;
    /// ```
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once cancellation is requested. Resolves immediately if it
    /// already was.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not lost.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    /// Wait for `duration` unless cancelled first.
    ///
    /// Requires a tokio runtime with the time driver enabled.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        tokio::select! {
            biased;
            () = self.cancelled() => Err(Cancelled),
            () = tokio::time::sleep(duration) => Ok(()),
        }
    }

    /// Run `fut` to completion unless cancelled first.
    pub async fn run_until_cancelled<F: std::future::Future>(
        &self,
        fut: F,
    ) -> Result<F::Output, Cancelled> {
        tokio::select! {
            biased;
            () = self.cancelled() => Err(Cancelled),
            out = fut => Ok(out),
        }
    }
}

// ─── CancelSource ────────────────────────────────────────────────────────────

/// Owning handle of a cancellation scope.
///
/// Dropping the source does **not** cancel outstanding tokens; cancellation is
/// always explicit.
#[derive(Debug)]
pub struct CancelSource {
    inner: Arc<ScopeInner>,
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                id: next_scope_id(),
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// A token observing this scope.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        CancelToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let was_cancelled = self.inner.cancelled.swap(true, Ordering::Release);
        if !was_cancelled {
            CANCELLATIONS_TOTAL.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(message = "cancel.request", scope_id = self.inner.id);
            self.inner.notify.notify_waiters();
        }
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// End this scope. Tokens already handed out keep their current state but
    /// can no longer be cancelled through this source.
    pub fn dispose(self) {
        tracing::trace!(
            message = "cancel.dispose",
            scope_id = self.inner.id,
            cancelled = self.is_cancelled()
        );
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
