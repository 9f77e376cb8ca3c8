//! Dgraph backend speaking DQL over the HTTP API.
//!
//! Requests go to `/alter` (schema, drop), `/mutate?commitNow=true`, and
//! `/query`. The ordered `content` list is stored as JSON text since Dgraph
//! list predicates are unordered.
//!
//! The GraphQL surface (`/admin/schema`, `/graphql`) works on the
//! `KnowledgeGraphNode` GraphQL type, whose predicates are separate from the
//! DQL ones used by `NodeStore`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use kg_store::schema::{
    self, DGRAPH_NODE_TYPE, FIELD_IMPORTANCE, FIELD_SECTION_TYPE, FIELD_SEMANTIC_TAGS, GRAPHQL_SDL,
    NODE_FIELDS,
};
use kg_store::{DeleteReport, FilterShape, KnowledgeGraphNode, NodeFilter, NodePatch};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use super::{NodeStore, StoreError, StoreResult, ensure_node_id};

/// Connection settings for a Dgraph alpha HTTP endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DgraphSettings {
    /// Base URL, e.g. `http://localhost:8080`.
    pub url: String,
    pub request_timeout: Option<Duration>,
}

impl DgraphSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout: None,
        }
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

const TXN_ABORTED: &str = "Transaction has been aborted";

const ADD_NODE_MUTATION: &str = r"mutation CreateNode($input: [AddKnowledgeGraphNodeInput!]!) {
  addKnowledgeGraphNode(input: $input) {
    knowledgeGraphNode {
      nodeId
      title
      semanticTags
    }
  }
}";

const NODES_BY_TAG_QUERY: &str = r"query GetNodesByTag($tag: String!) {
  queryKnowledgeGraphNode(filter: { semanticTags: { eq: $tag } }) {
    nodeId
    title
    content
    metadata
    relationships
    semanticTags
    compositionRules
    sectionType
    importance
  }
}";

/// Node fields echoed back by the GraphQL add mutation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlNodeSummary {
    pub node_id: String,
    pub title: String,
    #[serde(default)]
    pub semantic_tags: BTreeSet<String>,
}

/// Node store backed by Dgraph.
#[derive(Clone)]
pub struct DgraphNodeStore {
    client: Client,
    base_url: Arc<str>,
}

impl DgraphNodeStore {
    /// Builds a store with its own HTTP client.
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the HTTP client cannot be built.
    pub fn new(settings: &DgraphSettings) -> StoreResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| StoreError::Backend(format!("failed to build HTTP client: {err}")))?;
        Ok(Self::with_client(client, &settings.url))
    }

    /// Wraps an existing HTTP client.
    #[must_use]
    pub fn with_client(client: Client, url: &str) -> Self {
        Self {
            client,
            base_url: Arc::from(url.trim_end_matches('/')),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Installs the GraphQL schema through `/admin/schema`. Defaults to the
    /// node type SDL when `sdl` is `None`.
    ///
    /// # Errors
    /// Returns `StoreError::Schema` if Dgraph does not acknowledge the schema.
    pub async fn setup_graphql_schema(&self, sdl: Option<&str>) -> StoreResult<()> {
        let request = self
            .client
            .post(self.endpoint("admin/schema"))
            .header(CONTENT_TYPE, "text/plain")
            .body(sdl.unwrap_or(GRAPHQL_SDL).to_string());
        let reply: AckData = self.send(request).await.map_err(into_schema_err)?;
        if reply.code.as_deref() != Some("Success") {
            return Err(StoreError::Schema(format!(
                "GraphQL schema not acknowledged: {}",
                reply.message.unwrap_or_default()
            )));
        }
        info!(url = %self.base_url, "GraphQL schema ready");
        Ok(())
    }

    /// Runs a GraphQL operation against `/graphql` and decodes its `data`.
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the reply carries `errors` or cannot
    /// be decoded, and `StoreError::Unavailable` if Dgraph cannot be reached.
    pub async fn graphql_query<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<Value>,
    ) -> StoreResult<T> {
        let mut payload = Map::new();
        payload.insert("query".to_string(), Value::String(query.to_string()));
        if let Some(variables) = variables {
            payload.insert("variables".to_string(), variables);
        }
        let request = self
            .client
            .post(self.endpoint("graphql"))
            .json(&Value::Object(payload));
        self.send(request).await
    }

    /// Creates a node through the GraphQL `addKnowledgeGraphNode` mutation.
    ///
    /// # Errors
    /// Returns `StoreError::Validation` for an incomplete node,
    /// `StoreError::DuplicateKey` if `nodeId` is taken, or any
    /// `graphql_query` error.
    pub async fn create_node_graphql(&self, node: &KnowledgeGraphNode) -> StoreResult<GraphqlNodeSummary> {
        node.validate()?;
        let mut input = Map::new();
        input.insert("nodeId".to_string(), Value::String(node.node_id.clone()));
        input.insert("title".to_string(), Value::String(node.title.clone()));
        input.insert("content".to_string(), json!(node.content));
        input.insert("metadata".to_string(), Value::String(node.metadata.clone()));
        input.insert(
            "relationships".to_string(),
            Value::String(node.relationships.clone()),
        );
        input.insert("semanticTags".to_string(), json!(node.semantic_tags));
        input.insert(
            "compositionRules".to_string(),
            Value::String(node.composition_rules.clone()),
        );
        if let Some(section_type) = &node.section_type {
            input.insert("sectionType".to_string(), Value::String(section_type.clone()));
        }
        if let Some(importance) = &node.importance {
            input.insert("importance".to_string(), Value::String(importance.clone()));
        }

        let data: AddNodeData = self
            .graphql_query(ADD_NODE_MUTATION, Some(json!({ "input": [Value::Object(input)] })))
            .await
            .map_err(|err| match err {
                StoreError::Backend(message) if message.contains("already exists") => {
                    StoreError::DuplicateKey(node.node_id.clone())
                }
                other => other,
            })?;
        let summary = data
            .add_knowledge_graph_node
            .and_then(|payload| payload.knowledge_graph_node.into_iter().next())
            .ok_or_else(|| {
                StoreError::Backend(format!("no node returned when creating {}", node.node_id))
            })?;
        debug!(node_id = %summary.node_id, "created node through GraphQL");
        Ok(summary)
    }

    /// Lists GraphQL nodes carrying `tag`. Content order follows Dgraph's
    /// list order, which is not guaranteed.
    ///
    /// # Errors
    /// Returns any `graphql_query` error.
    pub async fn get_nodes_by_tag_graphql(&self, tag: &str) -> StoreResult<Vec<KnowledgeGraphNode>> {
        let data: TagQueryData = self
            .graphql_query(NODES_BY_TAG_QUERY, Some(json!({ "tag": tag })))
            .await?;
        Ok(data
            .query_knowledge_graph_node
            .into_iter()
            .map(GraphqlNode::into_node)
            .collect())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn alter(&self, body: String) -> StoreResult<()> {
        let request = self
            .client
            .post(self.endpoint("alter"))
            .header(CONTENT_TYPE, "application/dql")
            .body(body);
        let _: AckData = self.send(request).await?;
        Ok(())
    }

    async fn mutate(&self, body: &Value) -> StoreResult<MutationData> {
        let request = self
            .client
            .post(self.endpoint("mutate?commitNow=true"))
            .json(body);
        self.send(request).await
    }

    async fn run_query(&self, query: String, variables: Map<String, Value>) -> StoreResult<Vec<DgraphRow>> {
        let request = self.client.post(self.endpoint("query")).json(&json!({
            "query": query,
            "variables": variables,
        }));
        let data: QueryData = self.send(request).await?;
        Ok(data.nodes)
    }

    async fn lookup(&self, node_id: &str) -> StoreResult<Vec<DgraphRow>> {
        let query = format!(
            "query q($id: string) {{ nodes(func: eq(node_id, $id)) @filter(type({DGRAPH_NODE_TYPE})) {{ {} }} }}",
            selection()
        );
        let mut variables = Map::new();
        variables.insert("$id".to_string(), Value::String(node_id.to_string()));
        self.run_query(query, variables).await
    }

    /// Writes `node` over the existing `uid`, first deleting every value of
    /// the `clear` predicates. List predicates accumulate on set, so a
    /// replaced tag set must be cleared.
    async fn write_node(&self, uid: &str, node: &KnowledgeGraphNode, clear: &[&str]) -> StoreResult<()> {
        let mut set = node_to_row(node)?;
        set.insert("uid".to_string(), Value::String(uid.to_string()));
        let mut body = Map::new();
        if !clear.is_empty() {
            let mut delete = Map::new();
            delete.insert("uid".to_string(), Value::String(uid.to_string()));
            for predicate in clear {
                delete.insert((*predicate).to_string(), Value::Null);
            }
            body.insert("delete".to_string(), json!([Value::Object(delete)]));
        }
        body.insert("set".to_string(), json!([Value::Object(set)]));
        self.mutate(&Value::Object(body)).await?;
        Ok(())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> StoreResult<T> {
        let response = request.send().await.map_err(map_transport_err)?;
        let status = response.status();
        let body = response.text().await.map_err(map_transport_err)?;
        if status.is_server_error() {
            return Err(StoreError::Unavailable(format!("{status}: {body}")));
        }
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|err| {
            StoreError::Backend(format!("unreadable reply ({status}): {err}"))
        })?;
        if !envelope.errors.is_empty() {
            let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
            let message = messages.join("; ");
            // Aborted transactions lost a conflict and can be retried as-is.
            if message.contains(TXN_ABORTED) {
                return Err(StoreError::Unavailable(message));
            }
            return Err(StoreError::Backend(message));
        }
        if !status.is_success() {
            return Err(StoreError::Backend(format!("{status}: {body}")));
        }
        envelope
            .data
            .ok_or_else(|| StoreError::Backend("reply carried no data".to_string()))
    }
}

impl NodeStore for DgraphNodeStore {
    fn backend_name(&self) -> &'static str {
        "dgraph"
    }

    async fn setup_schema(&self) -> StoreResult<()> {
        self.alter(schema::dql_schema()).await.map_err(into_schema_err)?;
        info!(url = %self.base_url, "node schema ready");
        Ok(())
    }

    async fn create_node(&self, node: KnowledgeGraphNode) -> StoreResult<String> {
        node.validate()?;
        let node_id = node.node_id.clone();
        let mut row = node_to_row(&node)?;
        row.insert("uid".to_string(), Value::String("_:node".to_string()));
        row.insert(
            "dgraph.type".to_string(),
            Value::String(DGRAPH_NODE_TYPE.to_string()),
        );
        // Conditional upsert: the set only applies when no node carries this key.
        let body = json!({
            "query": format!(
                "{{ existing as var(func: eq(node_id, {})) }}",
                dql_string(&node_id)
            ),
            "mutations": [{
                "cond": "@if(eq(len(existing), 0))",
                "set": [Value::Object(row)],
            }],
        });
        let data = self.mutate(&body).await?;
        let uid = data
            .uids
            .get("node")
            .cloned()
            .ok_or_else(|| StoreError::DuplicateKey(node_id.clone()))?;
        debug!(node_id = %node_id, uid = %uid, "created node");
        Ok(uid)
    }

    async fn get_node(&self, node_id: &str) -> StoreResult<Option<KnowledgeGraphNode>> {
        ensure_node_id(node_id)?;
        self.lookup(node_id)
            .await?
            .into_iter()
            .next()
            .map(DgraphRow::into_node)
            .transpose()
    }

    async fn update_node(&self, node_id: &str, patch: NodePatch) -> StoreResult<KnowledgeGraphNode> {
        ensure_node_id(node_id)?;
        patch.validate()?;
        let row = self
            .lookup(node_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(node_id.to_string()))?;
        let uid = row.uid.clone();
        let mut node = row.into_node()?;
        if patch.is_empty() {
            return Ok(node);
        }
        let mut clear = Vec::new();
        if patch.semantic_tags.is_some() {
            clear.push(FIELD_SEMANTIC_TAGS);
        }
        node.apply(patch);
        self.write_node(&uid, &node, &clear).await?;
        debug!(node_id, uid = %uid, "updated node");
        Ok(node)
    }

    async fn replace_node(&self, node: KnowledgeGraphNode) -> StoreResult<KnowledgeGraphNode> {
        node.validate()?;
        let row = self
            .lookup(&node.node_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(node.node_id.clone()))?;
        let mut clear = vec![FIELD_SEMANTIC_TAGS];
        if node.section_type.is_none() {
            clear.push(FIELD_SECTION_TYPE);
        }
        if node.importance.is_none() {
            clear.push(FIELD_IMPORTANCE);
        }
        self.write_node(&row.uid, &node, &clear).await?;
        debug!(node_id = %node.node_id, uid = %row.uid, "replaced node");
        Ok(node)
    }

    async fn delete_node(&self, node_id: &str) -> StoreResult<DeleteReport> {
        ensure_node_id(node_id)?;
        let rows = self.lookup(node_id).await?;
        if rows.is_empty() {
            return Ok(DeleteReport::default());
        }
        let targets: Vec<Value> = rows.iter().map(|row| json!({ "uid": row.uid })).collect();
        self.mutate(&json!({ "delete": targets })).await?;
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
        let (query, variables) = build_query(predicate.as_ref());
        self.run_query(query, variables)
            .await?
            .into_iter()
            .map(DgraphRow::into_node)
            .collect()
    }

    async fn drop_all(&self) -> StoreResult<()> {
        self.alter(json!({ "drop_op": "DATA" }).to_string()).await?;
        info!(url = %self.base_url, "dropped all nodes");
        Ok(())
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ErrorMessage>,
}

#[derive(Deserialize)]
struct ErrorMessage {
    message: String,
}

#[derive(Deserialize)]
struct AckData {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Deserialize)]
struct MutationData {
    #[serde(default)]
    uids: HashMap<String, String>,
}

#[derive(Deserialize)]
struct QueryData {
    #[serde(default)]
    nodes: Vec<DgraphRow>,
}

#[derive(Deserialize)]
struct DgraphRow {
    uid: String,
    node_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    metadata: String,
    #[serde(default)]
    relationships: String,
    #[serde(default)]
    semantic_tags: BTreeSet<String>,
    #[serde(default)]
    composition_rules: String,
    section_type: Option<String>,
    importance: Option<String>,
}

impl DgraphRow {
    fn into_node(self) -> StoreResult<KnowledgeGraphNode> {
        let content = match self.content.as_deref() {
            None | Some("") => Vec::new(),
            Some(raw) => serde_json::from_str(raw).map_err(|err| {
                StoreError::Backend(format!("node {} has unreadable content: {err}", self.node_id))
            })?,
        };
        Ok(KnowledgeGraphNode {
            node_id: self.node_id,
            title: self.title,
            content,
            metadata: self.metadata,
            relationships: self.relationships,
            semantic_tags: self.semantic_tags,
            composition_rules: self.composition_rules,
            section_type: self.section_type,
            importance: self.importance,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddNodeData {
    add_knowledge_graph_node: Option<AddNodePayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddNodePayload {
    #[serde(default)]
    knowledge_graph_node: Vec<GraphqlNodeSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TagQueryData {
    #[serde(default)]
    query_knowledge_graph_node: Vec<GraphqlNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlNode {
    node_id: String,
    title: String,
    #[serde(default)]
    content: Vec<String>,
    metadata: Option<String>,
    relationships: Option<String>,
    #[serde(default)]
    semantic_tags: BTreeSet<String>,
    composition_rules: Option<String>,
    section_type: Option<String>,
    importance: Option<String>,
}

impl GraphqlNode {
    fn into_node(self) -> KnowledgeGraphNode {
        KnowledgeGraphNode {
            node_id: self.node_id,
            title: self.title,
            content: self.content,
            metadata: self.metadata.unwrap_or_default(),
            relationships: self.relationships.unwrap_or_default(),
            semantic_tags: self.semantic_tags,
            composition_rules: self.composition_rules.unwrap_or_default(),
            section_type: self.section_type,
            importance: self.importance,
        }
    }
}

fn node_to_row(node: &KnowledgeGraphNode) -> StoreResult<Map<String, Value>> {
    let content = serde_json::to_string(&node.content)
        .map_err(|err| StoreError::Backend(format!("failed to encode content: {err}")))?;
    let mut row = Map::new();
    row.insert("node_id".to_string(), Value::String(node.node_id.clone()));
    row.insert("title".to_string(), Value::String(node.title.clone()));
    row.insert("content".to_string(), Value::String(content));
    row.insert("metadata".to_string(), Value::String(node.metadata.clone()));
    row.insert(
        "relationships".to_string(),
        Value::String(node.relationships.clone()),
    );
    row.insert(
        "semantic_tags".to_string(),
        Value::Array(
            node.semantic_tags
                .iter()
                .cloned()
                .map(Value::String)
                .collect(),
        ),
    );
    row.insert(
        "composition_rules".to_string(),
        Value::String(node.composition_rules.clone()),
    );
    if let Some(section_type) = &node.section_type {
        row.insert("section_type".to_string(), Value::String(section_type.clone()));
    }
    if let Some(importance) = &node.importance {
        row.insert("importance".to_string(), Value::String(importance.clone()));
    }
    Ok(row)
}

fn selection() -> String {
    let mut fields = vec!["uid"];
    fields.extend(NODE_FIELDS.iter().map(|field| field.name));
    fields.join(" ")
}

/// Builds a parameterized DQL query listing nodes that match `predicate`.
fn build_query(predicate: Option<&NodeFilter>) -> (String, Map<String, Value>) {
    let mut params = Vec::new();
    let filter = predicate
        .map(|predicate| format!(" @filter({})", render_filter(predicate, &mut params)))
        .unwrap_or_default();
    let declarations: Vec<String> = (0..params.len())
        .map(|index| format!("$p{index}: string"))
        .collect();
    let header = if declarations.is_empty() {
        String::new()
    } else {
        format!("query q({}) ", declarations.join(", "))
    };
    let query = format!(
        "{header}{{ nodes(func: type({DGRAPH_NODE_TYPE})){filter} {{ {} }} }}",
        selection()
    );
    let variables = params
        .into_iter()
        .enumerate()
        .map(|(index, value)| (format!("$p{index}"), Value::String(value)))
        .collect();
    (query, variables)
}

fn render_filter(filter: &NodeFilter, params: &mut Vec<String>) -> String {
    match filter {
        NodeFilter::All => "has(node_id)".to_string(),
        NodeFilter::Eq { field, value } => {
            let name = push_param(params, value);
            format!("eq({}, {name})", field.predicate())
        }
        NodeFilter::AnyOfText { text } => {
            let name = push_param(params, text);
            format!("anyoftext(title, {name})")
        }
        NodeFilter::And(children) => render_group(children, " AND ", params),
        NodeFilter::Or(children) => render_group(children, " OR ", params),
    }
}

fn render_group(children: &[NodeFilter], joiner: &str, params: &mut Vec<String>) -> String {
    let parts: Vec<String> = children
        .iter()
        .map(|child| render_filter(child, params))
        .collect();
    format!("({})", parts.join(joiner))
}

fn push_param(params: &mut Vec<String>, value: &str) -> String {
    let name = format!("$p{}", params.len());
    params.push(value.to_string());
    name
}

/// Quotes a value as a DQL string literal.
fn dql_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn map_transport_err(err: reqwest::Error) -> StoreError {
    if err.is_connect() || err.is_timeout() {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

fn into_schema_err(err: StoreError) -> StoreError {
    match err {
        StoreError::Backend(message) => StoreError::Schema(message),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_all_query_has_no_filter_or_variables() {
        let (query, variables) = build_query(None);
        assert!(query.starts_with("{ nodes(func: type(KnowledgeGraphNode)) { uid node_id title"));
        assert!(variables.is_empty());
    }

    #[test]
    fn composite_filter_renders_parameterized_dql() {
        let filter = NodeFilter::and([
            NodeFilter::tag("demo"),
            NodeFilter::or([NodeFilter::section_type("intro"), NodeFilter::title_any_of("getting started")]),
        ]);
        let (query, variables) = build_query(Some(&filter));
        assert!(query.starts_with("query q($p0: string, $p1: string, $p2: string)"));
        assert!(query.contains(
            "@filter((eq(semantic_tags, $p0) AND (eq(section_type, $p1) OR anyoftext(title, $p2))))"
        ));
        assert_eq!(variables.get("$p0"), Some(&Value::String("demo".to_string())));
        assert_eq!(
            variables.get("$p2"),
            Some(&Value::String("getting started".to_string()))
        );
    }

    #[test]
    fn dql_strings_are_escaped() {
        assert_eq!(dql_string(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn rows_restore_ordered_content() {
        let row = DgraphRow {
            uid: "0x1".to_string(),
            node_id: "a".to_string(),
            title: "A".to_string(),
            content: Some(r#"["second","first"]"#.to_string()),
            metadata: String::new(),
            relationships: String::new(),
            semantic_tags: BTreeSet::new(),
            composition_rules: String::new(),
            section_type: None,
            importance: None,
        };
        let node = row.into_node().expect("row should convert");
        assert_eq!(node.content, vec!["second", "first"]);
    }

    #[test]
    fn rows_with_corrupt_content_are_backend_errors() {
        let row = DgraphRow {
            uid: "0x1".to_string(),
            node_id: "a".to_string(),
            title: "A".to_string(),
            content: Some("not json".to_string()),
            metadata: String::new(),
            relationships: String::new(),
            semantic_tags: BTreeSet::new(),
            composition_rules: String::new(),
            section_type: None,
            importance: None,
        };
        assert!(matches!(row.into_node(), Err(StoreError::Backend(_))));
    }
}
