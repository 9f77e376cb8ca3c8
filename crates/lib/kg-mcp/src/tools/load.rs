use kg_core::control::NodeLoadRequest;
use kg_core::store::NodeStore;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{KgMcp, helpers};

/// Parameters for loading a node file.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LoadNodesParams {
    /// Inline node file contents.
    pub json: Option<String>,
    /// Path to a node file readable by the server.
    pub json_path: Option<String>,
    /// Overwrite existing nodes instead of skipping them.
    pub replace_existing: Option<bool>,
}

#[tool_router(router = tool_router_load, vis = "pub")]
impl<S: NodeStore> KgMcp<S> {
    #[tool(description = "Load nodes from a node JSON file. Provide json or json_path. Existing nodes are skipped unless replace_existing is true.")]
    async fn load_nodes(
        &self,
        Parameters(params): Parameters<LoadNodesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let report = self
            .control()
            .load_nodes(NodeLoadRequest {
                json: params.json,
                json_path: params.json_path,
                replace_existing: params.replace_existing.unwrap_or(false),
            })
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(report)?]))
    }
}
