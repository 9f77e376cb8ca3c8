//! Node store interface and backends.
//!
//! `NodeStore` is the typed seam between the control plane and a graph
//! database. Every operation maps to one backend request (update and delete
//! may look the node up first); stores keep no cache and no cursor state.

use std::future::Future;
use std::{error::Error, fmt};

use kg_store::{DeleteReport, KnowledgeGraphNode, NodeFilter, NodePatch, NodeValidationError};

pub mod dgraph;
pub mod surreal;

pub use dgraph::{DgraphNodeStore, DgraphSettings, GraphqlNodeSummary};
pub use surreal::{SurrealNodeStore, SurrealSettings};

#[derive(Debug)]
pub enum StoreError {
    /// The node failed local validation; nothing was sent to the backend.
    Validation(String),
    DuplicateKey(String),
    NotFound(String),
    /// The backend rejected the schema definition.
    Schema(String),
    /// The backend could not be reached. Safe to retry.
    Unavailable(String),
    /// The backend rejected a request or returned an unreadable reply.
    Backend(String),
    Surreal(Box<surrealdb::Error>),
}

impl StoreError {
    /// Whether the same request may succeed if sent again.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(message) => write!(f, "Invalid node: {message}"),
            Self::DuplicateKey(node_id) => write!(f, "Node already exists: {node_id}"),
            Self::NotFound(node_id) => write!(f, "Node not found: {node_id}"),
            Self::Schema(message) => write!(f, "Schema rejected: {message}"),
            Self::Unavailable(message) => write!(f, "Backend unavailable: {message}"),
            Self::Backend(message) => write!(f, "Backend error: {message}"),
            Self::Surreal(err) => write!(f, "SurrealDB error: {err}"),
        }
    }
}

impl Error for StoreError {}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        use surrealdb::error::Api;

        match err {
            surrealdb::Error::Api(
                ref api @ (Api::Ws(_) | Api::Http(_) | Api::ConnectionUninitialised),
            ) => Self::Unavailable(api.to_string()),
            other => Self::Surreal(Box::new(other)),
        }
    }
}

impl From<NodeValidationError> for StoreError {
    fn from(err: NodeValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Typed access to knowledge graph nodes held by a graph backend.
///
/// Implementations are cheap handles over a shared connection; clone them
/// freely across tasks.
pub trait NodeStore: Clone + Send + Sync + 'static {
    /// Short backend label used in logs and health output.
    fn backend_name(&self) -> &'static str;

    /// Provisions node fields and indexes. Safe to call repeatedly.
    ///
    /// # Errors
    /// Returns `StoreError::Schema` if the backend rejects the definition.
    fn setup_schema(&self) -> impl Future<Output = StoreResult<()>> + Send;

    /// Inserts a node and returns the backend-assigned identifier.
    ///
    /// # Errors
    /// Returns `StoreError::Validation` before any backend call when the node
    /// is incomplete, and `StoreError::DuplicateKey` when `node_id` exists.
    fn create_node(
        &self,
        node: KnowledgeGraphNode,
    ) -> impl Future<Output = StoreResult<String>> + Send;

    /// Fetches a node by its natural key.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend request fails.
    fn get_node(
        &self,
        node_id: &str,
    ) -> impl Future<Output = StoreResult<Option<KnowledgeGraphNode>>> + Send;

    /// Applies the supplied patch fields and returns the stored node.
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if no node has this `node_id`.
    fn update_node(
        &self,
        node_id: &str,
        patch: NodePatch,
    ) -> impl Future<Output = StoreResult<KnowledgeGraphNode>> + Send;

    /// Overwrites every field of an existing node with `node`. Optional
    /// fields absent from `node` are cleared.
    ///
    /// # Errors
    /// Returns `StoreError::Validation` for an incomplete node and
    /// `StoreError::NotFound` if no node has this `node_id`.
    fn replace_node(
        &self,
        node: KnowledgeGraphNode,
    ) -> impl Future<Output = StoreResult<KnowledgeGraphNode>> + Send;

    /// Removes a node. A missing key reports zero deletions.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend request fails.
    fn delete_node(&self, node_id: &str) -> impl Future<Output = StoreResult<DeleteReport>> + Send;

    /// Returns every node matching the filter, in no particular order.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend request fails.
    fn query_nodes(
        &self,
        filter: NodeFilter,
    ) -> impl Future<Output = StoreResult<Vec<KnowledgeGraphNode>>> + Send;

    /// Deletes every node while keeping the schema.
    ///
    /// # Errors
    /// Returns `StoreError` if the backend request fails.
    fn drop_all(&self) -> impl Future<Output = StoreResult<()>> + Send;
}

fn ensure_node_id(node_id: &str) -> StoreResult<()> {
    if node_id.trim().is_empty() {
        return Err(StoreError::Validation("node_id is required".to_string()));
    }
    Ok(())
}
