use kg_store::{DeleteReport, KnowledgeGraphNode, NodeFilter, NodePatch};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compose;
use crate::store::{NodeStore, StoreError};

use super::{ControlError, KgControlPlane};

/// Composed context text and the number of nodes it was built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextReport {
    pub node_count: usize,
    pub context: String,
}

impl<S: NodeStore> KgControlPlane<S> {
    /// Provisions the backend schema.
    ///
    /// # Errors
    /// Returns `ControlError` if the backend rejects the schema or times out.
    pub async fn setup_schema(&self) -> Result<(), ControlError> {
        self.run("setup_schema", self.store.setup_schema()).await
    }

    /// Creates a node and returns its backend identifier.
    ///
    /// # Errors
    /// Returns `ControlError` if validation fails, the key exists, or the store call fails.
    pub async fn create_node(&self, node: KnowledgeGraphNode) -> Result<String, ControlError> {
        self.run("create_node", self.store.create_node(node)).await
    }

    /// Fetches a node by `node_id`.
    ///
    /// # Errors
    /// Returns `ControlError` if the store call fails.
    pub async fn get_node(&self, node_id: &str) -> Result<Option<KnowledgeGraphNode>, ControlError> {
        self.run("get_node", self.store.get_node(node_id)).await
    }

    /// Fetches a node, treating absence as `StoreError::NotFound`.
    ///
    /// # Errors
    /// Returns `ControlError` if the node is missing or the store call fails.
    pub async fn require_node(&self, node_id: &str) -> Result<KnowledgeGraphNode, ControlError> {
        self.get_node(node_id)
            .await?
            .ok_or_else(|| ControlError::Store(StoreError::NotFound(node_id.to_string())))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    /// Returns `ControlError` if the node is missing or the store call fails.
    pub async fn update_node(
        &self,
        node_id: &str,
        patch: NodePatch,
    ) -> Result<KnowledgeGraphNode, ControlError> {
        self.run("update_node", self.store.update_node(node_id, patch))
            .await
    }

    /// Overwrites a stored node with `node`, clearing optional fields it omits.
    ///
    /// # Errors
    /// Returns `ControlError` if the node is missing or the store call fails.
    pub async fn replace_node(&self, node: KnowledgeGraphNode) -> Result<KnowledgeGraphNode, ControlError> {
        self.run("replace_node", self.store.replace_node(node)).await
    }

    /// Deletes a node by `node_id`.
    ///
    /// # Errors
    /// Returns `ControlError` if the store call fails.
    pub async fn delete_node(&self, node_id: &str) -> Result<DeleteReport, ControlError> {
        self.run("delete_node", self.store.delete_node(node_id)).await
    }

    /// Lists nodes matching a filter.
    ///
    /// # Errors
    /// Returns `ControlError` if the store call fails.
    pub async fn query_nodes(&self, filter: NodeFilter) -> Result<Vec<KnowledgeGraphNode>, ControlError> {
        self.run("query_nodes", self.store.query_nodes(filter)).await
    }

    /// Lists every node, sorted by `node_id`.
    ///
    /// # Errors
    /// Returns `ControlError` if the store call fails.
    pub async fn list_nodes(&self) -> Result<Vec<KnowledgeGraphNode>, ControlError> {
        let mut nodes = self.query_nodes(NodeFilter::All).await?;
        nodes.sort_by(|left, right| left.node_id.cmp(&right.node_id));
        Ok(nodes)
    }

    /// Removes every node. Callers gate this behind an explicit opt-in.
    ///
    /// # Errors
    /// Returns `ControlError` if the store call fails.
    pub async fn drop_all_nodes(&self) -> Result<(), ControlError> {
        self.run("drop_all", self.store.drop_all()).await
    }

    /// Composes context from the nodes matching `filter`.
    ///
    /// # Errors
    /// Returns `ControlError` if the store call fails.
    pub async fn compose_context(&self, filter: NodeFilter) -> Result<ContextReport, ControlError> {
        let nodes = self.query_nodes(filter).await?;
        let node_count = nodes.len();
        let context = compose::compose_context(nodes);
        info!(node_count, "composed context");
        Ok(ContextReport {
            node_count,
            context,
        })
    }
}
