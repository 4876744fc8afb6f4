//! Scoped compensation
//!
//! A [`Compensation`] owns an async cleanup action that must run exactly
//! once when the scope that created it ends, on every exit path:
//!
//! - normal completion or an error: [`Compensation::run`] spawns the action
//!   and waits for it, so the caller sees the outcome only after cleanup was
//!   attempted, and dropping the caller mid-cleanup does not abort it;
//! - cancellation (the enclosing future is dropped): `Drop` hands the action
//!   to the current Tokio runtime so it still executes.
//!
//! Ownership can be handed off with [`Compensation::disarm`], after which
//! nothing runs.

use std::future::Future;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

/// Cleanup action bound to a scope
#[must_use = "dropping a Compensation immediately schedules its cleanup"]
pub struct Compensation {
    label: &'static str,
    action: Option<BoxFuture<'static, ()>>,
}

impl Compensation {
    /// Arm a compensation that will run `action`
    pub fn new<F>(label: &'static str, action: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            label,
            action: Some(action.boxed()),
        }
    }

    /// Whether the action is still pending
    pub fn is_armed(&self) -> bool {
        self.action.is_some()
    }

    /// Run the action now and wait for it
    ///
    /// The action runs as its own task: if this future is dropped while
    /// waiting, the cleanup still completes.
    pub async fn run(mut self) {
        let Some(action) = self.action.take() else {
            return;
        };
        tracing::debug!(label = self.label, "Running compensation");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                if let Err(e) = handle.spawn(action).await {
                    tracing::error!(label = self.label, error = %e, "Compensation task failed");
                }
            }
            Err(_) => action.await,
        }
    }

    /// Give up ownership without running the action
    pub fn disarm(mut self) {
        if self.action.take().is_some() {
            tracing::debug!(label = self.label, "Compensation disarmed");
        }
    }
}

impl Drop for Compensation {
    fn drop(&mut self) {
        let Some(action) = self.action.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(
                    label = self.label,
                    "Scope exited before cleanup; running compensation in background"
                );
                let _ = handle.spawn(action);
            }
            Err(_) => {
                tracing::error!(
                    label = self.label,
                    "No async runtime available; compensation skipped"
                );
            }
        }
    }
}

/// Await `work`, then run `compensation`, then return `work`'s output
///
/// If the returned future is dropped before `work` finishes, the
/// compensation still runs (see [`Compensation`]).
pub async fn with_compensation<T, W>(compensation: Compensation, work: W) -> T
where
    W: Future<Output = T>,
{
    let output = work.await;
    compensation.run().await;
    output
}
