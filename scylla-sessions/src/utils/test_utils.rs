use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::ConfigurationRejection;
use crate::pending::{pending_operation, Completer, PendingOperation};
use crate::session::{AsyncSession, SchemaSession};

pub(crate) fn setup_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(tracing_subscriber::fmt::TestWriter::new())
        .try_init();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum FakeSchemaError {
    #[error("Invalid configuration: {0}")]
    ConfigurationRejected(String),
    #[error("Syntax error")]
    Syntax,
    #[error("Cluster unavailable")]
    Unavailable,
}

impl ConfigurationRejection for FakeSchemaError {
    fn is_configuration_rejection(&self) -> bool {
        matches!(self, FakeSchemaError::ConfigurationRejected(_))
    }
}

type Responder = Box<dyn Fn(&str) -> Result<(), FakeSchemaError> + Send + Sync>;

/// Answers every statement with the responder and records what was executed.
pub(crate) struct FakeSchemaSession {
    responder: Responder,
    executed: Mutex<Vec<String>>,
}

impl FakeSchemaSession {
    pub(crate) fn new(
        responder: impl Fn(&str) -> Result<(), FakeSchemaError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn accepting_everything() -> Self {
        Self::new(|_| Ok(()))
    }

    pub(crate) fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchemaSession for FakeSchemaSession {
    type Error = FakeSchemaError;

    async fn execute(&self, cql: &str) -> Result<(), FakeSchemaError> {
        self.executed.lock().unwrap().push(cql.to_string());
        (self.responder)(cql)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum FakeWriteError {
    #[error("Write timeout")]
    Timeout,
    #[error("Server error: {0}")]
    Server(String),
}

/// Never completes anything on its own; the test settles each request
/// through the completer it takes out of the session.
#[derive(Default)]
pub(crate) struct ControlledAsyncSession {
    in_flight: Mutex<Vec<(String, Completer<u64, FakeWriteError>)>>,
}

impl ControlledAsyncSession {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    pub(crate) fn in_flight_count(&self) -> usize {
        self.in_flight.lock().unwrap().len()
    }

    /// Takes the completer of the oldest request still in flight.
    pub(crate) fn take_oldest(&self) -> (String, Completer<u64, FakeWriteError>) {
        self.in_flight.lock().unwrap().remove(0)
    }
}

impl AsyncSession<String> for ControlledAsyncSession {
    type Output = u64;
    type Error = FakeWriteError;

    fn execute_async(&self, statement: String) -> PendingOperation<u64, FakeWriteError> {
        let (completer, operation) = pending_operation();
        self.in_flight.lock().unwrap().push((statement, completer));
        operation
    }
}
