//! Handles to requests that are still in flight.
//!
//! A [`PendingOperation`] is created together with its [`Completer`]. Whoever
//! drives the request keeps the completer and settles it exactly once; the
//! operation is handed out to callers, who may clone it, await it, or attach
//! completion listeners to it.
//!
//! Listeners are executed directly by whoever settles the operation, without
//! any dispatch through a runtime or a thread pool. A listener attached after
//! the operation has settled runs immediately on the attaching thread.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use tracing::error;

use crate::errors::AsyncOperationError;

/// The result a [`PendingOperation`] settles with.
pub type Outcome<T, E> = Result<T, AsyncOperationError<E>>;

type Listener<T, E> = Box<dyn FnOnce(&Outcome<T, E>) + Send>;

enum State<T, E> {
    Pending(Waiting<T, E>),
    Done(Arc<Outcome<T, E>>),
}

/// Everything registered on an operation that has not settled yet.
struct Waiting<T, E> {
    listeners: Vec<Listener<T, E>>,
    /// Wakers of live [`WaitForOutcome`] futures, keyed by their id.
    /// A future removes its entry when dropped.
    waiters: Vec<(u64, Waker)>,
    next_waiter_id: u64,
}

impl<T, E> Default for Waiting<T, E> {
    fn default() -> Self {
        Self {
            listeners: Vec::new(),
            waiters: Vec::new(),
            next_waiter_id: 0,
        }
    }
}

/// Creates a new, unsettled operation and the completer that settles it.
pub fn pending_operation<T, E>() -> (Completer<T, E>, PendingOperation<T, E>) {
    let state = Arc::new(Mutex::new(State::Pending(Waiting::default())));
    let completer = Completer {
        state: Some(state.clone()),
    };
    (completer, PendingOperation { state })
}

/// A handle to an operation that will complete exactly once, either
/// successfully or with an error.
///
/// Cloning the handle is cheap; all clones observe the same outcome.
pub struct PendingOperation<T, E> {
    state: Arc<Mutex<State<T, E>>>,
}

impl<T, E> Clone for PendingOperation<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T, E> fmt::Debug for PendingOperation<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingOperation")
            .field("done", &self.is_done())
            .finish()
    }
}

impl<T, E> PendingOperation<T, E> {
    /// Returns true once the operation has settled.
    pub fn is_done(&self) -> bool {
        matches!(*self.state.lock().unwrap(), State::Done(_))
    }

    /// Registers a listener that is called with the outcome once the operation
    /// settles.
    ///
    /// The listener runs on the thread that settles the operation, inside the
    /// call to [`Completer::complete`]. If the operation has already settled,
    /// it runs right away on the current thread, before this method returns.
    /// Listeners must not block. A panicking listener is logged and does not
    /// prevent the remaining listeners from running.
    pub fn add_completion_listener<F>(&self, listener: F)
    where
        F: FnOnce(&Outcome<T, E>) + Send + 'static,
    {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            match &mut *state {
                State::Pending(waiting) => {
                    waiting.listeners.push(Box::new(listener));
                    return;
                }
                State::Done(outcome) => outcome.clone(),
            }
        };
        listener(&outcome);
    }

    /// Waits for the operation to settle and returns its outcome.
    ///
    /// Waiting does not consume the outcome; any number of clones of this
    /// handle can wait for it and each will get its own copy. Dropping the
    /// returned future before it resolves leaves nothing registered on the
    /// operation.
    pub fn result(&self) -> WaitForOutcome<T, E> {
        WaitForOutcome {
            state: self.state.clone(),
            waiter_id: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn waiter_count(&self) -> usize {
        match &*self.state.lock().unwrap() {
            State::Pending(waiting) => waiting.waiters.len(),
            State::Done(_) => 0,
        }
    }
}

impl<T, E> PendingOperation<T, E>
where
    T: Clone,
    E: Clone,
{
    /// Returns the outcome if the operation has already settled.
    pub fn try_result(&self) -> Option<Outcome<T, E>> {
        match &*self.state.lock().unwrap() {
            State::Pending(_) => None,
            State::Done(outcome) => Some((**outcome).clone()),
        }
    }
}

impl<T, E> IntoFuture for PendingOperation<T, E>
where
    T: Clone,
    E: Clone,
{
    type Output = Outcome<T, E>;
    type IntoFuture = WaitForOutcome<T, E>;

    fn into_future(self) -> Self::IntoFuture {
        self.result()
    }
}

/// Future returned by [`PendingOperation::result`].
#[must_use = "futures do nothing unless polled"]
pub struct WaitForOutcome<T, E> {
    state: Arc<Mutex<State<T, E>>>,
    waiter_id: Option<u64>,
}

impl<T, E> fmt::Debug for WaitForOutcome<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitForOutcome")
            .field("waiter_id", &self.waiter_id)
            .finish_non_exhaustive()
    }
}

impl<T, E> Future for WaitForOutcome<T, E>
where
    T: Clone,
    E: Clone,
{
    type Output = Outcome<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let mut state = this.state.lock().unwrap();
        match &mut *state {
            State::Done(outcome) => {
                this.waiter_id = None;
                Poll::Ready((**outcome).clone())
            }
            State::Pending(waiting) => {
                match this.waiter_id {
                    Some(id) => {
                        if let Some((_, waker)) =
                            waiting.waiters.iter_mut().find(|(waiter, _)| *waiter == id)
                        {
                            if !waker.will_wake(cx.waker()) {
                                *waker = cx.waker().clone();
                            }
                        }
                    }
                    None => {
                        let id = waiting.next_waiter_id;
                        waiting.next_waiter_id += 1;
                        waiting.waiters.push((id, cx.waker().clone()));
                        this.waiter_id = Some(id);
                    }
                }
                Poll::Pending
            }
        }
    }
}

impl<T, E> Drop for WaitForOutcome<T, E> {
    fn drop(&mut self) {
        let Some(id) = self.waiter_id.take() else {
            return;
        };
        if let Ok(mut state) = self.state.lock() {
            if let State::Pending(waiting) = &mut *state {
                waiting.waiters.retain(|(waiter, _)| *waiter != id);
            }
        }
    }
}

/// The producing half of a [`PendingOperation`].
///
/// Dropping a completer without calling [`Completer::complete`] settles the
/// operation with [`AsyncOperationError::Abandoned`], so that listeners are
/// always called exactly once.
pub struct Completer<T, E> {
    state: Option<Arc<Mutex<State<T, E>>>>,
}

impl<T, E> fmt::Debug for Completer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer").finish_non_exhaustive()
    }
}

impl<T, E> Completer<T, E> {
    /// Settles the operation with the result of the underlying request and
    /// runs all registered listeners on the current thread.
    pub fn complete(mut self, result: Result<T, E>) {
        self.settle(result.map_err(AsyncOperationError::Failed));
    }

    /// Settles the operation successfully.
    pub fn succeed(self, value: T) {
        self.complete(Ok(value));
    }

    /// Settles the operation with an error.
    pub fn fail(self, error: E) {
        self.complete(Err(error));
    }

    fn settle(&mut self, outcome: Outcome<T, E>) {
        let Some(state) = self.state.take() else {
            return;
        };
        let outcome = Arc::new(outcome);
        let waiting = {
            let mut state = state.lock().unwrap();
            match std::mem::replace(&mut *state, State::Done(outcome.clone())) {
                State::Pending(waiting) => waiting,
                // A completer is the only thing that moves the state out of Pending.
                State::Done(_) => unreachable!("operation settled twice"),
            }
        };
        // Waiters read the outcome from the settled state, so they are woken
        // first and never depend on a listener finishing.
        for (_, waker) in waiting.waiters {
            waker.wake();
        }
        // Listeners are called without holding the lock, so that they are free
        // to attach further listeners or inspect the operation.
        for listener in waiting.listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(&outcome))).is_err() {
                error!("Completion listener panicked, continuing with the remaining listeners");
            }
        }
    }
}

impl<T, E> Drop for Completer<T, E> {
    fn drop(&mut self) {
        self.settle(Err(AsyncOperationError::Abandoned));
    }
}
