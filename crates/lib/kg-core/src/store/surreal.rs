use std::sync::Arc;

use kg_store::filter::text_terms;
use kg_store::schema::{self, FIELD_TITLE, NODE_FIELDS, TABLE_NODE};
use kg_store::{DeleteReport, ExactField, FilterShape, KnowledgeGraphNode, NodeFilter, NodePatch};
use serde::Deserialize;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, RecordId, Surreal};
use tracing::{debug, info};

use super::{NodeStore, StoreError, StoreResult, ensure_node_id};

/// Connection settings for a `SurrealDB` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurrealSettings {
    /// Engine address, e.g. `mem://`, `ws://localhost:8000`.
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl SurrealSettings {
    /// In-memory engine, used for tests and zero-config runs.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: "context_engine".to_string(),
            database: "nodes".to_string(),
            username: None,
            password: None,
        }
    }
}

/// Node store backed by a `SurrealDB` table.
pub struct SurrealNodeStore<C: Connection> {
    db: Arc<Surreal<C>>,
}

impl<C: Connection> Clone for SurrealNodeStore<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl SurrealNodeStore<Any> {
    /// Opens a connection, signs in when credentials are given, and selects
    /// the namespace and database.
    ///
    /// # Errors
    /// Returns `StoreError::Unavailable` if the endpoint cannot be reached,
    /// or `StoreError::Surreal` if sign-in or selection fails.
    pub async fn connect(settings: &SurrealSettings) -> StoreResult<Self> {
        let db = any::connect(settings.endpoint.as_str())
            .await
            .map_err(|err| StoreError::Unavailable(format!("{}: {err}", settings.endpoint)))?;
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            db.signin(Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await?;
        }
        db.use_ns(settings.namespace.as_str())
            .use_db(settings.database.as_str())
            .await?;
        info!(
            endpoint = %settings.endpoint,
            namespace = %settings.namespace,
            database = %settings.database,
            "connected to SurrealDB"
        );
        Ok(Self::new(db))
    }
}

impl<C: Connection> SurrealNodeStore<C> {
    #[must_use]
    pub fn new(db: Surreal<C>) -> Self {
        Self { db: Arc::new(db) }
    }

    #[must_use]
    pub const fn from_arc(db: Arc<Surreal<C>>) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn db(&self) -> &Surreal<C> {
        &self.db
    }

    async fn exists(&self, node_id: &str) -> StoreResult<bool> {
        let query = format!("SELECT node_id FROM {TABLE_NODE} WHERE node_id = $node_id LIMIT 1;");
        let mut response = self
            .db
            .query(query)
            .bind(("node_id", node_id.to_string()))
            .await?;
        let rows: Vec<NodeIdRow> = response.take(0)?;
        Ok(!rows.is_empty())
    }
}

impl<C: Connection> NodeStore for SurrealNodeStore<C> {
    fn backend_name(&self) -> &'static str {
        "surrealdb"
    }

    async fn setup_schema(&self) -> StoreResult<()> {
        let response = self
            .db
            .query(schema::surreal_schema())
            .await
            .map_err(|err| StoreError::Schema(err.to_string()))?;
        response
            .check()
            .map_err(|err| StoreError::Schema(err.to_string()))?;
        info!(table = TABLE_NODE, "node schema ready");
        Ok(())
    }

    async fn create_node(&self, node: KnowledgeGraphNode) -> StoreResult<String> {
        node.validate()?;
        if self.exists(&node.node_id).await? {
            return Err(StoreError::DuplicateKey(node.node_id));
        }
        let node_id = node.node_id.clone();
        let query = format!("CREATE {TABLE_NODE} CONTENT $node RETURN id;");
        let mut response = self.db.query(query).bind(("node", node)).await?;
        // A concurrent insert that passes the pre-check still hits the unique index.
        let rows: Vec<CreatedRow> = response
            .take(0)
            .map_err(|err| map_write_err(err, &node_id))?;
        let row = rows.into_iter().next().ok_or_else(|| {
            StoreError::Backend(format!("no record returned when creating {node_id}"))
        })?;
        let uid = row.id.to_string();
        debug!(node_id = %node_id, uid = %uid, "created node");
        Ok(uid)
    }

    async fn get_node(&self, node_id: &str) -> StoreResult<Option<KnowledgeGraphNode>> {
        ensure_node_id(node_id)?;
        let query = format!(
            "SELECT {} FROM {TABLE_NODE} WHERE node_id = $node_id LIMIT 1;",
            projection()
        );
        let mut response = self
            .db
            .query(query)
            .bind(("node_id", node_id.to_string()))
            .await?;
        let records: Vec<KnowledgeGraphNode> = response.take(0)?;
        Ok(records.into_iter().next())
    }

    async fn update_node(&self, node_id: &str, patch: NodePatch) -> StoreResult<KnowledgeGraphNode> {
        ensure_node_id(node_id)?;
        patch.validate()?;
        if patch.is_empty() {
            return self
                .get_node(node_id)
                .await?
                .ok_or_else(|| StoreError::NotFound(node_id.to_string()));
        }
        let query = format!(
            "UPDATE {TABLE_NODE} MERGE $patch WHERE node_id = $node_id RETURN {};",
            projection()
        );
        let mut response = self
            .db
            .query(query)
            .bind(("patch", patch))
            .bind(("node_id", node_id.to_string()))
            .await?;
        let records: Vec<KnowledgeGraphNode> = response.take(0)?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(node_id.to_string()))
    }

    async fn replace_node(&self, node: KnowledgeGraphNode) -> StoreResult<KnowledgeGraphNode> {
        node.validate()?;
        let node_id = node.node_id.clone();
        let query = format!(
            "UPDATE {TABLE_NODE} CONTENT $node WHERE node_id = $node_id RETURN {};",
            projection()
        );
        let mut response = self
            .db
            .query(query)
            .bind(("node", node))
            .bind(("node_id", node_id.clone()))
            .await?;
        let records: Vec<KnowledgeGraphNode> = response.take(0)?;
        let stored = records
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(node_id.clone()))?;
        debug!(node_id = %node_id, "replaced node");
        Ok(stored)
    }

    async fn delete_node(&self, node_id: &str) -> StoreResult<DeleteReport> {
        ensure_node_id(node_id)?;
        let query = format!("DELETE {TABLE_NODE} WHERE node_id = $node_id RETURN BEFORE;");
        let mut response = self
            .db
            .query(query)
            .bind(("node_id", node_id.to_string()))
            .await?;
        let rows: Vec<NodeIdRow> = response.take(0)?;
        debug!(node_id, deleted = rows.len(), "deleted node");
        Ok(DeleteReport {
            deleted_count: rows.len(),
        })
    }

    async fn query_nodes(&self, filter: NodeFilter) -> StoreResult<Vec<KnowledgeGraphNode>> {
        let predicate = match filter.shape() {
            FilterShape::MatchNone => return Ok(Vec::new()),
            FilterShape::MatchAll => None,
            FilterShape::Predicate(predicate) => Some(predicate),
        };
        let mut query_text = format!("SELECT {} FROM {TABLE_NODE}", projection());
        let mut params = Vec::new();
        if let Some(predicate) = &predicate {
            query_text.push_str(" WHERE ");
            query_text.push_str(&render_where(predicate, &mut params));
        }
        query_text.push(';');

        let mut query = self.db.query(query_text);
        for (index, value) in params.into_iter().enumerate() {
            query = query.bind((format!("p{index}"), value));
        }
        let mut response = query.await?;
        let records: Vec<KnowledgeGraphNode> = response.take(0)?;
        Ok(records)
    }

    async fn drop_all(&self) -> StoreResult<()> {
        let response = self.db.query(format!("DELETE {TABLE_NODE};")).await?;
        response.check()?;
        info!(table = TABLE_NODE, "dropped all nodes");
        Ok(())
    }
}

#[derive(Deserialize)]
struct CreatedRow {
    id: RecordId,
}

#[derive(Deserialize)]
struct NodeIdRow {
    #[allow(dead_code)]
    node_id: String,
}

fn projection() -> String {
    NODE_FIELDS
        .iter()
        .map(|field| field.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders a normalized filter as a `SurrealQL` condition, pushing bound
/// values into `params` as `$p0`, `$p1`, ...
fn render_where(filter: &NodeFilter, params: &mut Vec<String>) -> String {
    match filter {
        NodeFilter::All => "true".to_string(),
        NodeFilter::Eq { field, value } => {
            let name = push_param(params, value);
            match field {
                ExactField::SemanticTags => format!("{} CONTAINS {name}", field.predicate()),
                ExactField::NodeId | ExactField::SectionType | ExactField::Importance => {
                    format!("{} = {name}", field.predicate())
                }
            }
        }
        NodeFilter::AnyOfText { text } => {
            // One `@@` per term: a multi-term match requires every term.
            let matches: Vec<String> = text_terms(text)
                .iter()
                .map(|term| format!("{FIELD_TITLE} @@ {}", push_param(params, term)))
                .collect();
            if matches.is_empty() {
                "false".to_string()
            } else {
                format!("({})", matches.join(" OR "))
            }
        }
        NodeFilter::And(children) => render_group(children, " AND ", params),
        NodeFilter::Or(children) => render_group(children, " OR ", params),
    }
}

fn render_group(children: &[NodeFilter], joiner: &str, params: &mut Vec<String>) -> String {
    let parts: Vec<String> = children
        .iter()
        .map(|child| render_where(child, params))
        .collect();
    format!("({})", parts.join(joiner))
}

fn push_param(params: &mut Vec<String>, value: &str) -> String {
    let name = format!("$p{}", params.len());
    params.push(value.to_string());
    name
}

fn map_write_err(err: surrealdb::Error, node_id: &str) -> StoreError {
    use surrealdb::error::{Api, Db};

    match err {
        surrealdb::Error::Db(Db::IndexExists { .. }) => StoreError::DuplicateKey(node_id.to_string()),
        // Remote engines only carry the rendered message.
        surrealdb::Error::Api(Api::Query(ref message)) if message.contains("already contains") => {
            StoreError::DuplicateKey(node_id.to_string())
        }
        other => StoreError::from(other),
    }
}
