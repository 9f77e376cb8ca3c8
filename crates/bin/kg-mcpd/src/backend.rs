//! Builds the configured node store and hands it to the MCP transports.

use kg_core::control::{KgControlPlane, NodeLoadRequest};
use kg_core::store::{DgraphNodeStore, NodeStore, SurrealNodeStore};
use kg_mcp::McpOptions;
use kg_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing::{info, warn};

use crate::config::{BackendKind, KgConfig};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Connects the backend named in `config` and serves until the transports exit.
///
/// # Errors
/// Returns connection, schema, seed, or transport failures.
pub async fn run(config: KgConfig) -> Result<(), BoxError> {
    match config.backend {
        BackendKind::Surreal => {
            let store = SurrealNodeStore::connect(&config.surreal).await?;
            serve(store, &config).await
        }
        BackendKind::Dgraph => {
            let store = DgraphNodeStore::new(&config.dgraph)?;
            if config.setup_schema && config.dgraph_graphql_schema {
                store.setup_graphql_schema(None).await?;
                info!(url = %config.dgraph.url, "installed Dgraph GraphQL schema");
            }
            serve(store, &config).await
        }
    }
}

async fn serve<S: NodeStore>(store: S, config: &KgConfig) -> Result<(), BoxError> {
    let control = KgControlPlane::new(store).with_operation_timeout(config.operation_timeout);
    let backend = control.store().backend_name();

    if config.setup_schema {
        control.setup_schema().await?;
        info!(backend, "node schema ready");
    }

    if let Some(path) = &config.seed_path {
        let report = control
            .load_nodes(NodeLoadRequest::from_path(path.as_str()))
            .await?;
        info!(
            path = %path,
            parsed = report.parsed,
            created = report.created,
            skipped = report.skipped,
            "seeded nodes"
        );
    }

    if config.test_mode {
        warn!("test mode enabled; drop_all_nodes is exposed");
    }
    let options = McpOptions {
        allow_drop_all: config.test_mode,
    };
    let http = McpHttpServerConfig::new(config.mcp_http_addr);

    match (config.enable_stdio, config.mcp_serve) {
        (true, true) => {
            let http_control = control.clone();
            let http_task = tokio::spawn(async move {
                serve_streamable_http(http_control, options, http).await
            });
            let result = serve_stdio(control, options).await;
            http_task.abort();
            result
        }
        (true, false) => serve_stdio(control, options).await,
        (false, _) => serve_streamable_http(control, options, http).await,
    }
}
