//! MCP server implementation for the context engine.
//!
//! This crate wires the node control plane into rmcp tool handlers and
//! exposes node CRUD, loading, and context composition to MCP clients.

mod helpers;
mod tools;
pub mod server;

use kg_core::control::KgControlPlane;
use kg_core::store::NodeStore;
use rmcp::{
    ErrorData,
    ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars,
    tool,
    tool_handler,
    tool_router,
};
use serde::{Deserialize, Serialize};

pub use tools::context::HelpCommands;
pub use tools::nodes::{CreateNodeParams, NodeIdParams, QueryNodesParams, UpdateNodeParams};

const SERVER_INSTRUCTIONS: &str = r"The context engine stores documentation units (knowledge graph nodes) in a graph database and composes them into session context.

Workflow:
1. Call `init_context` to receive the composed context of every stored node.
2. Manage nodes:
   - `create_node`, `get_node`, `update_node`, `delete_node`.
   - `query_nodes` filters by `semantic_tag`, `section_type`, `importance`, `node_id`, or title text.
   - `list_nodes` returns every node.
3. Bulk-load a node file with `load_nodes` (inline `json` or a server-side `json_path`).

Notes:
- `node_id` is the natural key and cannot change after creation.
- `metadata`, `relationships`, and `composition_rules` are stored as opaque text.
- Use `help` and `node_format_help` for details.
- `health` returns `ok`.";

/// Runtime switches for the MCP surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct McpOptions {
    /// Enables `drop_all_nodes`. Only meant for test deployments.
    pub allow_drop_all: bool,
}

/// MCP server wrapper around the node control plane and tool routers.
#[derive(Clone)]
pub struct KgMcp<S: NodeStore> {
    tool_router: ToolRouter<Self>,
    control: KgControlPlane<S>,
    options: McpOptions,
}

impl<S: NodeStore> KgMcp<S> {
    /// Creates a new server with default options.
    #[must_use]
    pub fn new(control: KgControlPlane<S>) -> Self {
        Self::with_options(control, McpOptions::default())
    }

    #[must_use]
    pub fn with_options(control: KgControlPlane<S>, options: McpOptions) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_nodes()
            + Self::tool_router_load()
            + Self::tool_router_context();
        Self {
            tool_router,
            control,
            options,
        }
    }

    pub(crate) const fn control(&self) -> &KgControlPlane<S> {
        &self.control
    }

    #[must_use]
    pub const fn options(&self) -> McpOptions {
        self.options
    }
}

/// Parameters for the greeting tool.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GreetParams {
    pub name: String,
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl<S: NodeStore> KgMcp<S> {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }

    #[tool(description = "Returns a greeting to the given name.")]
    async fn greet(
        &self,
        Parameters(params): Parameters<GreetParams>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Hello, {}!",
            params.name
        ))]))
    }
}

#[tool_handler]
impl<S: NodeStore> ServerHandler for KgMcp<S> {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
