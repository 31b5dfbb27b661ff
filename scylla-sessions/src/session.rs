//! The two session primitives this crate is built on, and their
//! implementations for the driver's [`Session`].

use std::sync::Arc;

use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::errors::ExecutionError;
use scylla::response::query_result::QueryResult;
use scylla::serialize::row::SerializeRow;
use scylla::statement::prepared::PreparedStatement;

use crate::errors::ConfigurationRejection;
use crate::pending::{pending_operation, PendingOperation};

/// A session capable of executing schema statements one at a time.
///
/// `execute` returns once the database has answered; its error is returned
/// to the caller untouched by this crate.
#[async_trait]
pub trait SchemaSession: Send + Sync {
    /// Error returned by the session.
    type Error: ConfigurationRejection + std::error::Error + Send + Sync + 'static;

    /// Executes a single unprepared statement without bound values.
    async fn execute(&self, cql: &str) -> Result<(), Self::Error>;
}

#[async_trait]
impl SchemaSession for Session {
    type Error = ExecutionError;

    async fn execute(&self, cql: &str) -> Result<(), ExecutionError> {
        self.query_unpaged(cql, ()).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: SchemaSession + ?Sized> SchemaSession for Arc<S> {
    type Error = S::Error;

    async fn execute(&self, cql: &str) -> Result<(), S::Error> {
        (**self).execute(cql).await
    }
}

/// A session capable of starting a request without waiting for it.
///
/// `execute_async` must return immediately. The returned operation is settled
/// by whatever executes the request on the session's behalf.
pub trait AsyncSession<S> {
    /// Value the request produces on success.
    type Output;

    /// Error the request produces on failure.
    type Error;

    /// Starts executing `statement` and returns a handle to it.
    fn execute_async(&self, statement: S) -> PendingOperation<Self::Output, Self::Error>;
}

/// A prepared statement together with the values bound to it.
#[derive(Debug, Clone)]
pub struct BoundStatement<V> {
    prepared: PreparedStatement,
    values: V,
}

impl<V: SerializeRow> BoundStatement<V> {
    /// Binds `values` to `prepared`.
    pub fn new(prepared: PreparedStatement, values: V) -> Self {
        Self { prepared, values }
    }

    /// The statement the values are bound to.
    pub fn prepared(&self) -> &PreparedStatement {
        &self.prepared
    }

    /// The bound values.
    pub fn values(&self) -> &V {
        &self.values
    }
}

/// Requests are spawned on the current Tokio runtime, so this must be
/// called from within one.
impl<V> AsyncSession<BoundStatement<V>> for Arc<Session>
where
    V: SerializeRow + Send + Sync + 'static,
{
    type Output = QueryResult;
    type Error = ExecutionError;

    fn execute_async(
        &self,
        statement: BoundStatement<V>,
    ) -> PendingOperation<QueryResult, ExecutionError> {
        let (completer, operation) = pending_operation();
        let session = Arc::clone(self);
        let BoundStatement { prepared, values } = statement;
        tokio::spawn(async move {
            let result = session.execute_unpaged(&prepared, values).await;
            completer.complete(result);
        });
        operation
    }
}
