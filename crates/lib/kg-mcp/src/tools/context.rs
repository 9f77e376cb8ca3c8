use kg_core::store::NodeStore;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ErrorCode},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::tools::nodes::QueryNodesParams;
use crate::{KgMcp, helpers};

/// Payload listing the MCP commands.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HelpCommands {
    pub commands: Vec<String>,
}

impl Default for HelpCommands {
    fn default() -> Self {
        Self {
            commands: vec![
                "help - List MCP commands and what they do.".to_string(),
                "node_format_help - Describes the node file format accepted by load_nodes."
                    .to_string(),
                "init_context - Compose the context of every stored node, highest priority first."
                    .to_string(),
                "greet - Returns a greeting to the given name.".to_string(),
                "setup_schema - Provision node fields and indexes in the backend.".to_string(),
                "create_node / get_node / update_node / delete_node - Manage single nodes by node_id."
                    .to_string(),
                "query_nodes - Filter nodes by tag, section type, importance, node_id, or title text."
                    .to_string(),
                "list_nodes - List every node.".to_string(),
                "load_nodes - Load a node JSON file inline or from a server path.".to_string(),
                "drop_all_nodes - Delete every node (test mode only).".to_string(),
            ],
        }
    }
}

const NODE_FORMAT_HELP: &str = r#"
Node files are JSON: either {"nodes": [ ... ]} or a bare array of node records.

Record fields:
    - id (alias node_id, nodeId): required, unique within the file and the store.
    - title: required, non-empty.
    - content: array of lines (order is kept) or a single string split on newlines.
    - metadata, relationships, composition_rules: objects or strings, stored as opaque text.
    - semantic_tags: array of strings; duplicates collapse.
    - section_type, importance: optional; taken from metadata.section_type / metadata.importance when absent.

Composition (init_context):
    - composition_rules.priority: high 3, medium 2, anything else 1.
    - importance: foundational or core 3, operational 2, anything else 1.
    - Nodes sort by priority, then importance, both descending, then node_id.

A file with any invalid record is rejected before anything is written.
"#;

#[tool_router(router = tool_router_context, vis = "pub")]
impl<S: NodeStore> KgMcp<S> {
    #[tool(description = "List the MCP commands to get context with how this MCP server works.")]
    async fn help(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::json(HelpCommands::default())?]))
    }

    #[tool(description = "Describes the node file format accepted by load_nodes and how init_context orders nodes.")]
    async fn node_format_help(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text(NODE_FORMAT_HELP)]))
    }

    #[tool(description = "Initialize the conversation with the composed context of stored nodes. Optional filters narrow the node set.")]
    async fn init_context(
        &self,
        Parameters(params): Parameters<QueryNodesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let filter = params.into_filter()?;
        let report = self
            .control()
            .compose_context(filter)
            .await
            .map_err(helpers::map_err)?;
        if report.node_count == 0 {
            return Err(helpers::mcp_err(
                ErrorCode::RESOURCE_NOT_FOUND,
                "no knowledge graph nodes found; load nodes with load_nodes first",
            ));
        }
        Ok(CallToolResult::success(vec![Content::text(report.context)]))
    }
}
