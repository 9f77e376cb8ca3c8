use kg_core::store::NodeStore;
use kg_store::{KnowledgeGraphNode, NodeFilter, NodePatch};
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ErrorCode},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{KgMcp, helpers};

/// Parameters for creating a node.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateNodeParams {
    pub node_id: String,
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
    pub metadata: Option<String>,
    pub relationships: Option<String>,
    #[serde(default)]
    pub semantic_tags: Vec<String>,
    pub composition_rules: Option<String>,
    pub section_type: Option<String>,
    pub importance: Option<String>,
}

impl From<CreateNodeParams> for KnowledgeGraphNode {
    fn from(params: CreateNodeParams) -> Self {
        Self {
            node_id: params.node_id,
            title: params.title,
            content: params.content,
            metadata: params.metadata.unwrap_or_default(),
            relationships: params.relationships.unwrap_or_default(),
            semantic_tags: params.semantic_tags.into_iter().collect(),
            composition_rules: params.composition_rules.unwrap_or_default(),
            section_type: params.section_type,
            importance: params.importance,
        }
    }
}

/// Parameters naming a single node.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct NodeIdParams {
    pub node_id: String,
}

/// Parameters for a partial node update. Omitted fields keep their values.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UpdateNodeParams {
    pub node_id: String,
    pub title: Option<String>,
    pub content: Option<Vec<String>>,
    pub metadata: Option<String>,
    pub relationships: Option<String>,
    pub semantic_tags: Option<Vec<String>>,
    pub composition_rules: Option<String>,
    pub section_type: Option<String>,
    pub importance: Option<String>,
}

impl UpdateNodeParams {
    fn into_parts(self) -> (String, NodePatch) {
        let patch = NodePatch {
            title: self.title,
            content: self.content,
            metadata: self.metadata,
            relationships: self.relationships,
            semantic_tags: self.semantic_tags.map(|tags| tags.into_iter().collect()),
            composition_rules: self.composition_rules,
            section_type: self.section_type,
            importance: self.importance,
        };
        (self.node_id, patch)
    }
}

/// Parameters for filtering nodes.
///
/// Shortcut fields and `filter` are combined with AND. With nothing set,
/// every node matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct QueryNodesParams {
    /// Filter tree, e.g. `{"or":[{"eq":{"field":"importance","value":"core"}},{"any_of_text":{"text":"workflow"}}]}`.
    pub filter: Option<serde_json::Value>,
    pub node_id: Option<String>,
    pub semantic_tag: Option<String>,
    pub section_type: Option<String>,
    pub importance: Option<String>,
    /// Matches nodes whose title shares any term with this text.
    pub title_text: Option<String>,
}

impl QueryNodesParams {
    pub(crate) fn into_filter(self) -> Result<NodeFilter, ErrorData> {
        let mut parts = Vec::new();
        if let Some(raw) = self.filter {
            let filter: NodeFilter = serde_json::from_value(raw).map_err(|err| {
                helpers::mcp_err(ErrorCode::INVALID_PARAMS, format!("invalid filter: {err}"))
            })?;
            parts.push(filter);
        }
        parts.extend(self.node_id.map(NodeFilter::node_id));
        parts.extend(self.semantic_tag.map(NodeFilter::tag));
        parts.extend(self.section_type.map(NodeFilter::section_type));
        parts.extend(self.importance.map(NodeFilter::importance));
        parts.extend(self.title_text.map(NodeFilter::title_any_of));
        Ok(match parts.len() {
            0 => NodeFilter::All,
            1 => parts.pop().unwrap_or_default(),
            _ => NodeFilter::And(parts),
        })
    }
}

/// Parameters for removing every node.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DropAllParams {
    /// Must be `true`.
    pub confirm: bool,
}

#[tool_router(router = tool_router_nodes, vis = "pub")]
impl<S: NodeStore> KgMcp<S> {
    #[tool(description = "Provision node fields and indexes in the backend. Safe to repeat.")]
    async fn setup_schema(&self) -> Result<CallToolResult, ErrorData> {
        self.control().setup_schema().await.map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }

    #[tool(description = "Create a knowledge graph node. Fails if node_id already exists.")]
    async fn create_node(
        &self,
        Parameters(params): Parameters<CreateNodeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let node = KnowledgeGraphNode::from(params);
        let node_id = node.node_id.clone();
        let uid = self
            .control()
            .create_node(node)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(json!({
            "node_id": node_id,
            "uid": uid,
        }))?]))
    }

    #[tool(description = "Fetch a node by node_id.")]
    async fn get_node(
        &self,
        Parameters(params): Parameters<NodeIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let node = self
            .control()
            .require_node(&params.node_id)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(node)?]))
    }

    #[tool(description = "Update the supplied fields of a node. node_id cannot change.")]
    async fn update_node(
        &self,
        Parameters(params): Parameters<UpdateNodeParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let (node_id, patch) = params.into_parts();
        let node = self
            .control()
            .update_node(&node_id, patch)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(node)?]))
    }

    #[tool(description = "Delete a node by node_id. Reports deleted_count 0 for unknown ids.")]
    async fn delete_node(
        &self,
        Parameters(params): Parameters<NodeIdParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let report = self
            .control()
            .delete_node(&params.node_id)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }

    #[tool(description = "Query nodes by tag, section type, importance, node_id, title text, or a filter tree.")]
    async fn query_nodes(
        &self,
        Parameters(params): Parameters<QueryNodesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let filter = params.into_filter()?;
        let nodes = self
            .control()
            .query_nodes(filter)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(nodes)?]))
    }

    #[tool(description = "List every node, sorted by node_id.")]
    async fn list_nodes(&self) -> Result<CallToolResult, ErrorData> {
        let nodes = self.control().list_nodes().await.map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(nodes)?]))
    }

    #[tool(description = "Delete every node. Only available when the server runs in test mode.")]
    async fn drop_all_nodes(
        &self,
        Parameters(params): Parameters<DropAllParams>,
    ) -> Result<CallToolResult, ErrorData> {
        if !self.options().allow_drop_all {
            warn!("refused drop_all_nodes outside test mode");
            return Err(helpers::mcp_err(
                ErrorCode::INVALID_REQUEST,
                "drop_all_nodes is disabled; start the server in test mode to enable it",
            ));
        }
        if !params.confirm {
            return Err(helpers::mcp_err(
                ErrorCode::INVALID_PARAMS,
                "confirm must be true",
            ));
        }
        self.control().drop_all_nodes().await.map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}
