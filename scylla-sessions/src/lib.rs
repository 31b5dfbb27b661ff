//! Session helpers for applications built on the [Scylla Rust driver](scylla).
//!
//! Two independent utilities are provided:
//!
//! ### Schema bootstrap
//! [`ensure_keyspace`] and [`create_table_with_time_series_compaction`] make
//! keyspace and table creation safe to repeat on every startup. Tables are
//! created with time window compaction, or with date tiered compaction on
//! clusters that reject the former as an unsupported configuration.
//!
//! ```rust,no_run
//! # use scylla::client::session::Session;
//! # use scylla_sessions::{create_table_with_time_series_compaction, ensure_keyspace};
//! # async fn check_only_compiles(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
//! ensure_keyspace(session, "monitoring").await?;
//! create_table_with_time_series_compaction(
//!     session,
//!     "create table if not exists monitoring.gauge_value (gauge_name varchar, \
//!      capture_time timestamp, value double, primary key (gauge_name, capture_time))",
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Writes with a failure action
//! [`execute_async_with_on_failure`] starts a write without waiting for it and
//! runs a caller supplied action if the write fails. The returned
//! [`PendingOperation`] can still be awaited by the caller.
//!
//! Both utilities are generic over the [`SchemaSession`] and [`AsyncSession`]
//! traits, implemented for the driver's
//! [`Session`](scylla::client::session::Session).

pub mod errors;
pub mod notify;
pub mod pending;
pub mod schema;
pub mod session;

mod utils;

pub use errors::{AsyncOperationError, ConfigurationRejection};
pub use notify::execute_async_with_on_failure;
pub use pending::{pending_operation, Completer, Outcome, PendingOperation, WaitForOutcome};
pub use schema::{
    create_table_with_compaction, create_table_with_time_series_compaction, ensure_keyspace,
    ensure_keyspace_with, CompactionStrategy, Replication,
};
pub use session::{AsyncSession, BoundStatement, SchemaSession};
