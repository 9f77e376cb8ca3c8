use std::collections::HashSet;
use std::path::Path;
use std::{error::Error, fmt};

use kg_store::KnowledgeGraphNode;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug)]
pub enum NodeParseError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// A record is malformed or misses a required field.
    InvalidRecord { index: usize, reason: String },
    DuplicateId { index: usize, node_id: String },
    Task(String),
}

impl fmt::Display for NodeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "Node file error: {err}"),
            Self::Json(err) => write!(f, "Node JSON error: {err}"),
            Self::InvalidRecord { index, reason } => write!(f, "Node record {index}: {reason}"),
            Self::DuplicateId { index, node_id } => {
                write!(f, "Node record {index}: duplicate id {node_id}")
            }
            Self::Task(message) => write!(f, "Node parse task failed: {message}"),
        }
    }
}

impl Error for NodeParseError {}

impl From<std::io::Error> for NodeParseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for NodeParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<tokio::task::JoinError> for NodeParseError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// Parser for node source files.
///
/// Accepts `{"nodes": [...]}` or a bare array of records. Object-valued
/// `metadata`, `relationships`, and `composition_rules` are kept as compact
/// JSON text.
pub struct NodeJsonParser;

impl NodeJsonParser {
    /// Parses and validates every record; one bad record rejects the input.
    ///
    /// # Errors
    /// Returns `NodeParseError` if the JSON is malformed, a record is
    /// invalid, or two records share an id.
    pub fn parse(json: &str) -> Result<Vec<KnowledgeGraphNode>, NodeParseError> {
        let records = match serde_json::from_str::<Document>(json)? {
            Document::Wrapped { nodes } | Document::Bare(nodes) => nodes,
        };
        let mut seen = HashSet::with_capacity(records.len());
        let mut nodes = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let node = parse_record(index, record)?;
            if !seen.insert(node.node_id.clone()) {
                return Err(NodeParseError::DuplicateId {
                    index,
                    node_id: node.node_id,
                });
            }
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Parses on a blocking task.
    ///
    /// # Errors
    /// Returns `NodeParseError` if parsing fails or the task panics.
    pub async fn parse_async(json: String) -> Result<Vec<KnowledgeGraphNode>, NodeParseError> {
        tokio::task::spawn_blocking(move || Self::parse(&json)).await?
    }

    /// Reads and parses a node file.
    ///
    /// # Errors
    /// Returns `NodeParseError` if the file cannot be read or parsed.
    pub async fn parse_file(
        path: impl AsRef<Path>,
    ) -> Result<Vec<KnowledgeGraphNode>, NodeParseError> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::parse_async(json).await
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Wrapped { nodes: Vec<Value> },
    Bare(Vec<Value>),
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(alias = "node_id", alias = "nodeId")]
    id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    content: RawContent,
    #[serde(default)]
    metadata: Value,
    #[serde(default)]
    relationships: Value,
    #[serde(default, alias = "semanticTags")]
    semantic_tags: Vec<String>,
    #[serde(default, alias = "compositionRules")]
    composition_rules: Value,
    #[serde(default, alias = "sectionType")]
    section_type: Option<String>,
    #[serde(default)]
    importance: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawContent {
    Lines(Vec<String>),
    Text(String),
}

impl Default for RawContent {
    fn default() -> Self {
        Self::Lines(Vec::new())
    }
}

fn parse_record(index: usize, record: Value) -> Result<KnowledgeGraphNode, NodeParseError> {
    let raw: RawNode = serde_json::from_value(record).map_err(|err| {
        NodeParseError::InvalidRecord {
            index,
            reason: err.to_string(),
        }
    })?;
    let content = match raw.content {
        RawContent::Lines(lines) => lines,
        RawContent::Text(text) => text.lines().map(str::to_string).collect(),
    };
    let section_type = raw
        .section_type
        .or_else(|| metadata_key(&raw.metadata, "section_type"));
    let importance = raw
        .importance
        .or_else(|| metadata_key(&raw.metadata, "importance"));

    let node = KnowledgeGraphNode {
        node_id: raw.id.unwrap_or_default(),
        title: raw.title.unwrap_or_default(),
        content,
        metadata: opaque_text(&raw.metadata),
        relationships: opaque_text(&raw.relationships),
        semantic_tags: raw.semantic_tags.into_iter().collect(),
        composition_rules: opaque_text(&raw.composition_rules),
        section_type,
        importance,
    };
    node.validate()
        .map_err(|err| NodeParseError::InvalidRecord {
            index,
            reason: err.to_string(),
        })?;
    Ok(node)
}

fn metadata_key(metadata: &Value, key: &str) -> Option<String> {
    metadata.get(key).and_then(Value::as_str).map(str::to_string)
}

fn opaque_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
