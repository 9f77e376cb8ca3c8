use kg_core::store::{DgraphNodeStore, DgraphSettings, NodeStore, StoreError};
use kg_store::{KnowledgeGraphNode, NodeFilter, NodePatch};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> DgraphNodeStore {
    DgraphNodeStore::new(&DgraphSettings::new(server.uri())).expect("client should build")
}

fn success() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "data": { "code": "Success", "message": "Done" }
    }))
}

fn row(uid: &str, node_id: &str, tags: &[&str]) -> Value {
    json!({
        "uid": uid,
        "node_id": node_id,
        "title": "Example Node",
        "content": "[\"First line\",\"Second line\"]",
        "metadata": "",
        "relationships": "",
        "semantic_tags": tags,
        "composition_rules": "",
        "section_type": "introduction"
    })
}

fn query_reply(rows: Vec<Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": { "nodes": rows } }))
}

async fn mount_lookup(server: &MockServer, rows: Vec<Value>) {
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(query_reply(rows))
        .mount(server)
        .await;
}

#[tokio::test]
async fn setup_schema_posts_dql_to_alter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alter"))
        .and(body_string_contains("<node_id>: string @index(exact) @upsert ."))
        .and(body_string_contains("<title>: string @index(exact, fulltext) ."))
        .and(body_string_contains("type <KnowledgeGraphNode>"))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server).setup_schema().await.expect("schema should be accepted");
}

#[tokio::test]
async fn rejected_schema_is_a_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "line 1: invalid tokenizer" }],
            "data": null
        })))
        .mount(&server)
        .await;

    let err = store_for(&server).setup_schema().await.expect_err("schema should fail");
    assert!(matches!(err, StoreError::Schema(ref message) if message.contains("invalid tokenizer")));
}

#[tokio::test]
async fn create_node_runs_conditional_upsert() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mutate"))
        .and(query_param("commitNow", "true"))
        .and(body_string_contains("@if(eq(len(existing), 0))"))
        .and(body_string_contains("eq(node_id, \\\"example.node.1\\\")"))
        .and(body_partial_json(json!({
            "mutations": [{
                "set": [{
                    "uid": "_:node",
                    "dgraph.type": "KnowledgeGraphNode",
                    "node_id": "example.node.1",
                    "content": "[\"First line\",\"Second line\"]",
                    "semantic_tags": ["demo", "example"]
                }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "code": "Success", "message": "Done", "uids": { "node": "0x2a" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let node = KnowledgeGraphNode::new("example.node.1", "Example Node")
        .with_content(["First line", "Second line"])
        .with_tags(["example", "demo"]);
    let uid = store_for(&server).create_node(node).await.expect("create should succeed");
    assert_eq!(uid, "0x2a");
}

#[tokio::test]
async fn create_node_without_assigned_uid_is_duplicate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mutate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "code": "Success", "message": "Done", "uids": {} }
        })))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .create_node(KnowledgeGraphNode::new("dup", "Dup"))
        .await
        .expect_err("create should fail");
    assert!(matches!(err, StoreError::DuplicateKey(ref id) if id == "dup"));
}

#[tokio::test]
async fn invalid_node_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(success())
        .expect(0)
        .mount(&server)
        .await;

    let err = store_for(&server)
        .create_node(KnowledgeGraphNode::new("", "Title"))
        .await
        .expect_err("create should fail");
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn get_node_decodes_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_partial_json(json!({ "variables": { "$id": "example.node.1" } })))
        .respond_with(query_reply(vec![row("0x1", "example.node.1", &["demo"])]))
        .expect(1)
        .mount(&server)
        .await;

    let node = store_for(&server)
        .get_node("example.node.1")
        .await
        .expect("get should succeed")
        .expect("node should exist");
    assert_eq!(node.content, vec!["First line", "Second line"]);
    assert_eq!(node.section_type.as_deref(), Some("introduction"));
    assert_eq!(node.importance, None);
    assert!(node.semantic_tags.contains("demo"));
}

#[tokio::test]
async fn get_node_absent_is_none() {
    let server = MockServer::start().await;
    mount_lookup(&server, Vec::new()).await;
    let node = store_for(&server).get_node("ghost").await.expect("get should succeed");
    assert_eq!(node, None);
}

#[tokio::test]
async fn query_nodes_binds_filter_values() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_string_contains("@filter((eq(semantic_tags, $p0) AND anyoftext(title, $p1)))"))
        .and(body_partial_json(json!({ "variables": { "$p0": "demo", "$p1": "example" } })))
        .respond_with(query_reply(vec![row("0x1", "a", &["demo"]), row("0x2", "b", &["demo"])]))
        .expect(1)
        .mount(&server)
        .await;

    let nodes = store_for(&server)
        .query_nodes(NodeFilter::and([NodeFilter::tag("demo"), NodeFilter::title_any_of("example")]))
        .await
        .expect("query should succeed");
    assert_eq!(nodes.len(), 2);
}

#[tokio::test]
async fn match_none_filter_skips_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(query_reply(Vec::new()))
        .expect(0)
        .mount(&server)
        .await;

    let nodes = store_for(&server)
        .query_nodes(NodeFilter::Or(Vec::new()))
        .await
        .expect("query should succeed");
    assert!(nodes.is_empty());
}

#[tokio::test]
async fn update_node_replaces_tags_and_keeps_other_fields() {
    let server = MockServer::start().await;
    mount_lookup(&server, vec![row("0x7", "a", &["old"])]).await;
    Mock::given(method("POST"))
        .and(path("/mutate"))
        .and(body_partial_json(json!({
            "delete": [{ "uid": "0x7", "semantic_tags": null }],
            "set": [{
                "uid": "0x7",
                "node_id": "a",
                "title": "Example Node",
                "semantic_tags": ["new"],
                "section_type": "introduction"
            }]
        })))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    let node = store_for(&server)
        .update_node("a", NodePatch::default().with_tags(["new"]))
        .await
        .expect("update should succeed");
    assert_eq!(node.title, "Example Node");
    assert_eq!(node.content, vec!["First line", "Second line"]);
    assert!(node.semantic_tags.contains("new"));
    assert!(!node.semantic_tags.contains("old"));
}

#[tokio::test]
async fn replace_node_clears_omitted_predicates() {
    let server = MockServer::start().await;
    mount_lookup(&server, vec![row("0x7", "a", &["old"])]).await;
    Mock::given(method("POST"))
        .and(path("/mutate"))
        .and(body_partial_json(json!({
            "delete": [{
                "uid": "0x7",
                "semantic_tags": null,
                "section_type": null,
                "importance": null
            }],
            "set": [{ "uid": "0x7", "node_id": "a", "title": "New", "content": "[]" }]
        })))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    let node = store_for(&server)
        .replace_node(KnowledgeGraphNode::new("a", "New"))
        .await
        .expect("replace should succeed");
    assert_eq!(node, KnowledgeGraphNode::new("a", "New"));
}

#[tokio::test]
async fn update_of_missing_node_is_not_found() {
    let server = MockServer::start().await;
    mount_lookup(&server, Vec::new()).await;
    let err = store_for(&server)
        .update_node("ghost", NodePatch::default().with_title("X"))
        .await
        .expect_err("update should fail");
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn delete_node_counts_removed_uids() {
    let server = MockServer::start().await;
    mount_lookup(&server, vec![row("0x9", "a", &[])]).await;
    Mock::given(method("POST"))
        .and(path("/mutate"))
        .and(body_partial_json(json!({ "delete": [{ "uid": "0x9" }] })))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    let report = store_for(&server).delete_node("a").await.expect("delete should succeed");
    assert_eq!(report.deleted_count, 1);
}

#[tokio::test]
async fn delete_of_unknown_node_sends_no_mutation() {
    let server = MockServer::start().await;
    mount_lookup(&server, Vec::new()).await;
    Mock::given(method("POST"))
        .and(path("/mutate"))
        .respond_with(success())
        .expect(0)
        .mount(&server)
        .await;

    let report = store_for(&server).delete_node("ghost").await.expect("delete should succeed");
    assert_eq!(report.deleted_count, 0);
}

#[tokio::test]
async fn drop_all_drops_data_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alter"))
        .and(body_partial_json(json!({ "drop_op": "DATA" })))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server).drop_all().await.expect("drop should succeed");
}

#[tokio::test]
async fn graphql_schema_posts_sdl_to_admin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/schema"))
        .and(body_string_contains("nodeId: String! @id @search(by: [exact])"))
        .respond_with(success())
        .expect(1)
        .mount(&server)
        .await;

    store_for(&server)
        .setup_graphql_schema(None)
        .await
        .expect("schema should be accepted");
}

#[tokio::test]
async fn graphql_create_posts_add_mutation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("addKnowledgeGraphNode(input: $input)"))
        .and(body_partial_json(json!({
            "variables": { "input": [{
                "nodeId": "example-node",
                "title": "Example Node",
                "content": ["First line", "Second line"],
                "semanticTags": ["demo"],
                "sectionType": "introduction"
            }] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "addKnowledgeGraphNode": { "knowledgeGraphNode": [
                { "nodeId": "example-node", "title": "Example Node", "semanticTags": ["demo"] }
            ] } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut node = KnowledgeGraphNode::new("example-node", "Example Node");
    node.content = vec!["First line".to_string(), "Second line".to_string()];
    node.semantic_tags.insert("demo".to_string());
    node.section_type = Some("introduction".to_string());

    let created = store_for(&server)
        .create_node_graphql(&node)
        .await
        .expect("create should succeed");
    assert_eq!(created.node_id, "example-node");
    assert_eq!(created.title, "Example Node");
    assert!(created.semantic_tags.contains("demo"));
}

#[tokio::test]
async fn graphql_create_of_taken_id_is_duplicate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "couldn't rewrite mutation addKnowledgeGraphNode because id a already exists for field nodeId inside type KnowledgeGraphNode" }],
            "data": { "addKnowledgeGraphNode": null }
        })))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .create_node_graphql(&KnowledgeGraphNode::new("a", "A"))
        .await
        .expect_err("create should fail");
    assert!(matches!(err, StoreError::DuplicateKey(ref id) if id == "a"));
}

#[tokio::test]
async fn graphql_tag_query_decodes_nodes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("semanticTags: { eq: $tag }"))
        .and(body_partial_json(json!({ "variables": { "tag": "demo" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "queryKnowledgeGraphNode": [{
                "nodeId": "a",
                "title": "A",
                "content": ["only line"],
                "metadata": null,
                "semanticTags": ["demo", "intro"],
                "importance": "core"
            }] }
        })))
        .mount(&server)
        .await;

    let nodes = store_for(&server)
        .get_nodes_by_tag_graphql("demo")
        .await
        .expect("query should succeed");
    assert_eq!(nodes.len(), 1);
    let node = &nodes[0];
    assert_eq!(node.node_id, "a");
    assert_eq!(node.content, vec!["only line".to_string()]);
    assert_eq!(node.metadata, "");
    assert!(node.semantic_tags.contains("intro"));
    assert_eq!(node.importance.as_deref(), Some("core"));
    assert!(node.section_type.is_none());
}

#[tokio::test]
async fn graphql_errors_are_backend_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "Cannot query field \"bogus\" on type \"Query\"." }]
        })))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .graphql_query::<Value>("{ bogus }", None)
        .await
        .expect_err("query should fail");
    assert!(matches!(err, StoreError::Backend(ref message) if message.contains("bogus")));
    assert!(!err.is_retriable());
}

#[tokio::test]
async fn server_errors_are_retriable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("alpha not ready"))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .query_nodes(NodeFilter::All)
        .await
        .expect_err("query should fail");
    assert!(matches!(err, StoreError::Unavailable(_)));
    assert!(err.is_retriable());
}

#[tokio::test]
async fn client_errors_are_backend_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .query_nodes(NodeFilter::All)
        .await
        .expect_err("query should fail");
    assert!(matches!(err, StoreError::Backend(_)));
    assert!(!err.is_retriable());
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("listener should have an address");
    drop(listener);

    let store = DgraphNodeStore::new(&DgraphSettings::new(format!("http://{addr}")))
        .expect("client should build");
    let err = store
        .get_node("a")
        .await
        .expect_err("request should fail");
    assert!(matches!(err, StoreError::Unavailable(_)));
}

#[tokio::test]
async fn aborted_transactions_are_retriable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mutate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "message": "Transaction has been aborted. Please retry", "extensions": { "code": "Error" } }],
            "data": null
        })))
        .mount(&server)
        .await;
    mount_lookup(&server, vec![row("0x7", "a", &["demo"])]).await;

    let err = store_for(&server)
        .update_node("a", NodePatch::default().with_title("B"))
        .await
        .expect_err("update should fail");
    assert!(matches!(err, StoreError::Unavailable(ref message) if message.contains("aborted")));
    assert!(err.is_retriable());
}
