//! Backend schema definitions.
//!
//! `NODE_FIELDS` is the single description of the node entity and its
//! indexes; the `SurrealDB` and Dgraph schema texts are rendered from it so
//! both backends provision the same index contract.

use std::fmt::Write as _;

pub const TABLE_NODE: &str = "kg_node";
pub const DGRAPH_NODE_TYPE: &str = "KnowledgeGraphNode";
pub const TITLE_ANALYZER: &str = "kg_title_analyzer";

pub const FIELD_NODE_ID: &str = "node_id";
pub const FIELD_TITLE: &str = "title";
pub const FIELD_CONTENT: &str = "content";
pub const FIELD_METADATA: &str = "metadata";
pub const FIELD_RELATIONSHIPS: &str = "relationships";
pub const FIELD_SEMANTIC_TAGS: &str = "semantic_tags";
pub const FIELD_COMPOSITION_RULES: &str = "composition_rules";
pub const FIELD_SECTION_TYPE: &str = "section_type";
pub const FIELD_IMPORTANCE: &str = "importance";

/// Value shape of a stored field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    OptionalText,
    /// Ordered list; order is significant.
    TextList,
    /// Unordered multi-valued field.
    TextSet,
}

/// Index kinds a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// Natural key: unique, conflict-checked on write.
    Identity,
    Exact,
    FullText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub indexes: &'static [IndexKind],
}

impl FieldSpec {
    #[must_use]
    pub fn has_index(&self, kind: IndexKind) -> bool {
        self.indexes.contains(&kind)
    }
}

pub const NODE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: FIELD_NODE_ID,
        kind: FieldKind::Text,
        indexes: &[IndexKind::Identity, IndexKind::Exact],
    },
    FieldSpec {
        name: FIELD_TITLE,
        kind: FieldKind::Text,
        indexes: &[IndexKind::FullText, IndexKind::Exact],
    },
    FieldSpec {
        name: FIELD_CONTENT,
        kind: FieldKind::TextList,
        indexes: &[],
    },
    FieldSpec {
        name: FIELD_METADATA,
        kind: FieldKind::Text,
        indexes: &[],
    },
    FieldSpec {
        name: FIELD_RELATIONSHIPS,
        kind: FieldKind::Text,
        indexes: &[],
    },
    FieldSpec {
        name: FIELD_SEMANTIC_TAGS,
        kind: FieldKind::TextSet,
        indexes: &[IndexKind::Exact],
    },
    FieldSpec {
        name: FIELD_COMPOSITION_RULES,
        kind: FieldKind::Text,
        indexes: &[],
    },
    FieldSpec {
        name: FIELD_SECTION_TYPE,
        kind: FieldKind::OptionalText,
        indexes: &[IndexKind::Exact],
    },
    FieldSpec {
        name: FIELD_IMPORTANCE,
        kind: FieldKind::OptionalText,
        indexes: &[IndexKind::Exact],
    },
];

/// `SurrealQL` statements provisioning the node table. Every statement is
/// `IF NOT EXISTS`, so the script is safe to run repeatedly.
#[must_use]
pub fn surreal_schema() -> String {
    let mut out = String::new();
    let _ = writeln!(out, "DEFINE TABLE IF NOT EXISTS {TABLE_NODE} SCHEMAFULL;");
    let _ = writeln!(
        out,
        "DEFINE ANALYZER IF NOT EXISTS {TITLE_ANALYZER} TOKENIZERS blank, punct FILTERS lowercase;"
    );
    for field in NODE_FIELDS {
        let ty = match field.kind {
            FieldKind::Text => "string",
            FieldKind::OptionalText => "option<string>",
            FieldKind::TextList | FieldKind::TextSet => "array<string>",
        };
        let _ = writeln!(
            out,
            "DEFINE FIELD IF NOT EXISTS {name} ON TABLE {TABLE_NODE} TYPE {ty};",
            name = field.name
        );
    }
    for field in NODE_FIELDS {
        let name = field.name;
        if field.has_index(IndexKind::Identity) {
            let _ = writeln!(
                out,
                "DEFINE INDEX IF NOT EXISTS {TABLE_NODE}_{name}_unique ON TABLE {TABLE_NODE} FIELDS {name} UNIQUE;"
            );
        } else if field.has_index(IndexKind::Exact) {
            let _ = writeln!(
                out,
                "DEFINE INDEX IF NOT EXISTS {TABLE_NODE}_{name}_exact ON TABLE {TABLE_NODE} FIELDS {name};"
            );
        }
        if field.has_index(IndexKind::FullText) {
            let _ = writeln!(
                out,
                "DEFINE INDEX IF NOT EXISTS {TABLE_NODE}_{name}_search ON TABLE {TABLE_NODE} FIELDS {name} SEARCH ANALYZER {TITLE_ANALYZER} BM25;"
            );
        }
    }
    out
}

/// DQL schema for the Dgraph `/alter` endpoint.
///
/// Ordered lists are stored as JSON text because Dgraph list predicates
/// are unordered sets.
#[must_use]
pub fn dql_schema() -> String {
    let mut out = String::new();
    for field in NODE_FIELDS {
        let ty = match field.kind {
            FieldKind::Text | FieldKind::OptionalText | FieldKind::TextList => "string",
            FieldKind::TextSet => "[string]",
        };
        let mut tokenizers = Vec::new();
        if field.has_index(IndexKind::Exact) || field.has_index(IndexKind::Identity) {
            tokenizers.push("exact");
        }
        if field.has_index(IndexKind::FullText) {
            tokenizers.push("fulltext");
        }
        let _ = write!(out, "<{}>: {ty}", field.name);
        if !tokenizers.is_empty() {
            let _ = write!(out, " @index({})", tokenizers.join(", "));
        }
        if field.has_index(IndexKind::Identity) {
            out.push_str(" @upsert");
        }
        out.push_str(" .\n");
    }
    let _ = writeln!(out, "\ntype <{DGRAPH_NODE_TYPE}> {{");
    for field in NODE_FIELDS {
        let _ = writeln!(out, "    {}", field.name);
    }
    out.push_str("}\n");
    out
}

/// GraphQL SDL for Dgraph's `/admin/schema` endpoint.
pub const GRAPHQL_SDL: &str = r"type KnowledgeGraphNode {
  nodeId: String! @id @search(by: [exact])
  title: String! @search(by: [fulltext, exact])
  content: [String!]!
  metadata: String
  relationships: String
  semanticTags: [String!]! @search(by: [exact])
  compositionRules: String
  sectionType: String @search(by: [exact])
  importance: String @search(by: [exact])
}
";
