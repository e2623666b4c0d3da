//! CallReply: single-resolution result of one dispatched call.
//!
//! A [`CallReply`] is a cloneable handle to a slot that resolves exactly once
//! to either a value or a [`DispatchError`]. The dispatch pipeline resolves it
//! from whatever thread or task completes the call; proxy methods block on
//! [`wait`](CallReply::wait) until then. Sinks reuse the same primitive for
//! their shutdown signal, where the registry's health fan-out rides the
//! observer list.
//!
//! Three consumption styles are supported:
//! - blocking join: [`wait`](CallReply::wait) /
//!   [`wait_timeout`](CallReply::wait_timeout)
//! - observer registration: [`on_resolve`](CallReply::on_resolve), fired at
//!   most once per observer
//! - async: `CallReply` implements [`Future`] for callers already running on
//!   a runtime

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use crate::error::DispatchError;

/// Outcome carried by a resolved reply.
pub type CallOutcome<T> = Result<T, DispatchError>;

type Observer<T> = Box<dyn FnOnce(&CallOutcome<T>) + Send>;

enum ReplyState<T> {
    Pending {
        observers: Vec<Observer<T>>,
        wakers: Vec<Waker>,
    },
    Resolved(CallOutcome<T>),
}

struct ReplyShared<T> {
    state: Mutex<ReplyState<T>>,
    resolved: Condvar,
}

/// The bounded join gave up before the reply resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("timed out waiting for reply resolution")]
pub struct WaitTimedOut;

/// Cloneable handle to a single-resolution call outcome.
///
/// All clones observe the same slot. The first [`resolve`](CallReply::resolve)
/// wins; every later resolution attempt is a no-op. Waiters, observers, and
/// async consumers all see the winning outcome.
pub struct CallReply<T> {
    shared: Arc<ReplyShared<T>>,
}

impl<T> Clone for CallReply<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for CallReply<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.lock_state() {
            ReplyState::Pending { observers, .. } => format!("pending({} observers)", observers.len()),
            ReplyState::Resolved(Ok(_)) => "resolved(ok)".to_string(),
            ReplyState::Resolved(Err(e)) => format!("resolved(err: {})", e),
        };
        f.debug_struct("CallReply").field("state", &state).finish()
    }
}

impl<T: Clone + Send + 'static> CallReply<T> {
    /// Create an unresolved reply.
    pub fn pending() -> Self {
        Self {
            shared: Arc::new(ReplyShared {
                state: Mutex::new(ReplyState::Pending {
                    observers: Vec::new(),
                    wakers: Vec::new(),
                }),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Create a reply already resolved to a value.
    pub fn resolved(value: T) -> Self {
        Self::from_outcome(Ok(value))
    }

    /// Create a reply already resolved to a failure.
    pub fn failed(error: DispatchError) -> Self {
        Self::from_outcome(Err(error))
    }

    fn from_outcome(outcome: CallOutcome<T>) -> Self {
        Self {
            shared: Arc::new(ReplyShared {
                state: Mutex::new(ReplyState::Resolved(outcome)),
                resolved: Condvar::new(),
            }),
        }
    }

    /// Resolve the reply. The first resolution wins.
    ///
    /// Returns whether this call performed the resolution. Registered
    /// observers are drained and invoked exactly once each, outside the
    /// internal lock; blocked waiters and async consumers are woken.
    ///
    /// A panicking observer is caught and logged so it cannot starve the
    /// remaining observers or unwind into the resolver.
    pub fn resolve(&self, outcome: CallOutcome<T>) -> bool {
        let (observers, wakers, snapshot) = {
            let mut state = self.lock_state();
            match &mut *state {
                ReplyState::Resolved(_) => return false,
                ReplyState::Pending { observers, wakers } => {
                    let observers = std::mem::take(observers);
                    let wakers = std::mem::take(wakers);
                    let snapshot = outcome.clone();
                    *state = ReplyState::Resolved(outcome);
                    (observers, wakers, snapshot)
                }
            }
        };

        self.shared.resolved.notify_all();
        for observer in observers {
            fire_observer(observer, &snapshot);
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Block the calling thread until the reply resolves.
    pub fn wait(&self) -> CallOutcome<T> {
        let mut state = self.lock_state();
        loop {
            match &*state {
                ReplyState::Resolved(outcome) => return outcome.clone(),
                ReplyState::Pending { .. } => {
                    state = self
                        .shared
                        .resolved
                        .wait(state)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
            }
        }
    }

    /// Block until the reply resolves or `timeout` elapses.
    ///
    /// A bounded join: an upstream timeout or cancellation can always unblock
    /// a waiting thread by resolving the reply, and a caller unwilling to
    /// wait forever gets [`WaitTimedOut`] back instead.
    ///
    /// # Errors
    ///
    /// Returns [`WaitTimedOut`] if the reply is still pending after `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<CallOutcome<T>, WaitTimedOut> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock_state();
        loop {
            match &*state {
                ReplyState::Resolved(outcome) => return Ok(outcome.clone()),
                ReplyState::Pending { .. } => {
                    let remaining = deadline
                        .checked_duration_since(Instant::now())
                        .ok_or(WaitTimedOut)?;
                    let (guard, result) = self
                        .shared
                        .resolved
                        .wait_timeout(state, remaining)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                    state = guard;
                    if result.timed_out() && !matches!(&*state, ReplyState::Resolved(_)) {
                        return Err(WaitTimedOut);
                    }
                }
            }
        }
    }

    /// Non-blocking probe: the outcome if resolved, `None` otherwise.
    pub fn try_peek(&self) -> Option<CallOutcome<T>> {
        match &*self.lock_state() {
            ReplyState::Resolved(outcome) => Some(outcome.clone()),
            ReplyState::Pending { .. } => None,
        }
    }

    /// Whether the reply has resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.lock_state(), ReplyState::Resolved(_))
    }

    /// Register an observer invoked exactly once with the outcome.
    ///
    /// If the reply is already resolved the observer fires immediately on the
    /// calling thread; otherwise it fires on the resolving thread. Observers
    /// are best-effort: panics are caught and logged.
    pub fn on_resolve<F>(&self, observer: F)
    where
        F: FnOnce(&CallOutcome<T>) + Send + 'static,
    {
        let mut observer: Option<Observer<T>> = Some(Box::new(observer));
        let immediate = {
            let mut state = self.lock_state();
            match &mut *state {
                ReplyState::Pending { observers, .. } => {
                    if let Some(observer) = observer.take() {
                        observers.push(observer);
                    }
                    None
                }
                ReplyState::Resolved(outcome) => Some(outcome.clone()),
            }
        };
        if let (Some(outcome), Some(observer)) = (immediate, observer.take()) {
            fire_observer(observer, &outcome);
        }
    }
}

impl<T> CallReply<T> {
    fn lock_state(&self) -> MutexGuard<'_, ReplyState<T>> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn fire_observer<T>(observer: Observer<T>, outcome: &CallOutcome<T>) {
    if catch_unwind(AssertUnwindSafe(|| observer(outcome))).is_err() {
        tracing::warn!("reply observer panicked; continuing with remaining observers");
    }
}

impl<T: Clone + Send + 'static> Future for CallReply<T> {
    type Output = CallOutcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.lock_state();
        match &mut *state {
            ReplyState::Resolved(outcome) => Poll::Ready(outcome.clone()),
            ReplyState::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}
