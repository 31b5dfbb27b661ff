//! Fire-and-forget writes that still react to failure.

use std::fmt::Display;

use tracing::debug;

use crate::pending::PendingOperation;
use crate::session::AsyncSession;

/// Starts executing `statement` and calls `on_failure` if it does not succeed.
///
/// Returns as soon as the request has been handed to the session. The
/// returned operation is the one produced by the session: awaiting it or
/// attaching further listeners to it observes the request's own outcome,
/// regardless of the failure action.
///
/// When the request fails (including timeouts and errors reported by the
/// server), the error is logged at debug level and `on_failure` is called
/// once, on the thread that settles the operation. It is never called on
/// success. `on_failure` is not given the error; it should not block.
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use scylla::client::session::Session;
/// # use scylla_sessions::{execute_async_with_on_failure, BoundStatement};
/// # async fn check_only_compiles(session: Arc<Session>) -> Result<(), Box<dyn std::error::Error>> {
/// let prepared = session
///     .prepare("INSERT INTO ks.trace (agent, id, payload) VALUES (?, ?, ?)")
///     .await?;
/// let write = execute_async_with_on_failure(
///     &session,
///     BoundStatement::new(prepared, ("agent-1", 17_i32, "payload")),
///     || eprintln!("trace write failed, scheduling a rewrite"),
/// );
/// // The caller may still wait for the write itself.
/// write.await?;
/// # Ok(())
/// # }
/// ```
pub fn execute_async_with_on_failure<S, St, F>(
    session: &S,
    statement: St,
    on_failure: F,
) -> PendingOperation<S::Output, S::Error>
where
    S: AsyncSession<St> + ?Sized,
    S::Error: Display,
    F: FnOnce() + Send + 'static,
{
    let operation = session.execute_async(statement);
    operation.add_completion_listener(move |outcome| {
        if let Err(err) = outcome {
            debug!("Asynchronous request failed: {}", err);
            on_failure();
        }
    });
    operation
}
