use std::future::Future;
use std::time::Duration;
use std::{error::Error, fmt};

use tracing::warn;

use crate::parsers::NodeParseError;
use crate::store::{NodeStore, StoreError, StoreResult};

pub mod load;
pub mod nodes;

pub use load::{LoadReport, NodeLoadRequest};
pub use nodes::ContextReport;

#[derive(Debug)]
pub enum ControlError {
    Parse(NodeParseError),
    Store(StoreError),
    /// The operation missed its deadline and was cancelled. Safe to retry.
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    InvalidRequest(String),
}

impl ControlError {
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Store(err) => err.is_retriable(),
            Self::Parse(_) | Self::InvalidRequest(_) => false,
        }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Timeout { operation, after } => {
                write!(f, "{operation} timed out after {}ms", after.as_millis())
            }
            Self::InvalidRequest(message) => write!(f, "Invalid request: {message}"),
        }
    }
}

impl Error for ControlError {}

impl From<NodeParseError> for ControlError {
    fn from(err: NodeParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<StoreError> for ControlError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// Entry point for node operations: a store plus an optional deadline that
/// applies to every backend call.
pub struct KgControlPlane<S: NodeStore> {
    store: S,
    operation_timeout: Option<Duration>,
}

impl<S: NodeStore> Clone for KgControlPlane<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            operation_timeout: self.operation_timeout,
        }
    }
}

impl<S: NodeStore> KgControlPlane<S> {
    pub const fn new(store: S) -> Self {
        Self {
            store,
            operation_timeout: None,
        }
    }

    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    /// Runs a store call under the configured deadline. On expiry the call
    /// is dropped, which cancels any in-flight request.
    pub(crate) async fn run<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = StoreResult<T>> + Send,
    ) -> Result<T, ControlError> {
        let Some(after) = self.operation_timeout else {
            return Ok(call.await?);
        };
        match tokio::time::timeout(after, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(
                    operation,
                    backend = self.store.backend_name(),
                    timeout_ms = after.as_millis(),
                    "store operation timed out"
                );
                Err(ControlError::Timeout { operation, after })
            }
        }
    }
}
