use std::collections::BTreeSet;
use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

/// A documentation unit stored in the knowledge graph.
///
/// `metadata`, `relationships`, and `composition_rules` are opaque text; the
/// store persists them verbatim and never parses them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnowledgeGraphNode {
    pub node_id: String,
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub relationships: String,
    #[serde(default)]
    pub semantic_tags: BTreeSet<String>,
    #[serde(default)]
    pub composition_rules: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,
}

impl KnowledgeGraphNode {
    pub fn new(node_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            title: title.into(),
            content: Vec::new(),
            metadata: String::new(),
            relationships: String::new(),
            semantic_tags: BTreeSet::new(),
            composition_rules: String::new(),
            section_type: None,
            importance: None,
        }
    }

    #[must_use]
    pub fn with_content<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content = lines.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.semantic_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: impl Into<String>) -> Self {
        self.metadata = metadata.into();
        self
    }

    #[must_use]
    pub fn with_relationships(mut self, relationships: impl Into<String>) -> Self {
        self.relationships = relationships.into();
        self
    }

    #[must_use]
    pub fn with_composition_rules(mut self, rules: impl Into<String>) -> Self {
        self.composition_rules = rules.into();
        self
    }

    #[must_use]
    pub fn with_section_type(mut self, section_type: impl Into<String>) -> Self {
        self.section_type = Some(section_type.into());
        self
    }

    #[must_use]
    pub fn with_importance(mut self, importance: impl Into<String>) -> Self {
        self.importance = Some(importance.into());
        self
    }

    /// Checks the fields every stored node must carry.
    ///
    /// # Errors
    /// Returns `NodeValidationError` when `node_id` or `title` is blank.
    pub fn validate(&self) -> Result<(), NodeValidationError> {
        ensure_present(&self.node_id, "node_id")?;
        ensure_present(&self.title, "title")?;
        Ok(())
    }

    /// Applies the supplied patch fields, leaving everything else untouched.
    pub fn apply(&mut self, patch: NodePatch) {
        let NodePatch {
            title,
            content,
            metadata,
            relationships,
            semantic_tags,
            composition_rules,
            section_type,
            importance,
        } = patch;

        if let Some(title) = title {
            self.title = title;
        }
        if let Some(content) = content {
            self.content = content;
        }
        if let Some(metadata) = metadata {
            self.metadata = metadata;
        }
        if let Some(relationships) = relationships {
            self.relationships = relationships;
        }
        if let Some(semantic_tags) = semantic_tags {
            self.semantic_tags = semantic_tags;
        }
        if let Some(composition_rules) = composition_rules {
            self.composition_rules = composition_rules;
        }
        if section_type.is_some() {
            self.section_type = section_type;
        }
        if importance.is_some() {
            self.importance = importance;
        }
    }

    /// Content lines joined with newlines.
    #[must_use]
    pub fn content_text(&self) -> String {
        self.content.join("\n")
    }

    /// Content rendered as a markdown section headed by the title.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut lines = Vec::with_capacity(self.content.len() + 2);
        lines.push(format!("# {}", self.title));
        lines.push(String::new());
        lines.extend(self.content.iter().cloned());
        lines.join("\n")
    }
}

/// Partial update for a stored node. `node_id` cannot be patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_tags: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composition_rules: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<String>,
}

impl NodePatch {
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_content<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content = Some(lines.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.semantic_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_section_type(mut self, section_type: impl Into<String>) -> Self {
        self.section_type = Some(section_type.into());
        self
    }

    #[must_use]
    pub fn with_importance(mut self, importance: impl Into<String>) -> Self {
        self.importance = Some(importance.into());
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.metadata.is_none()
            && self.relationships.is_none()
            && self.semantic_tags.is_none()
            && self.composition_rules.is_none()
            && self.section_type.is_none()
            && self.importance.is_none()
    }

    /// Rejects a supplied-but-blank title.
    ///
    /// # Errors
    /// Returns `NodeValidationError` when `title` is present and blank.
    pub fn validate(&self) -> Result<(), NodeValidationError> {
        if let Some(title) = self.title.as_deref() {
            ensure_present(title, "title")?;
        }
        Ok(())
    }
}

/// Result of deleting nodes by `node_id`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted_count: usize,
}

/// A node failed local validation before reaching a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeValidationError {
    MissingField(&'static str),
}

impl fmt::Display for NodeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
        }
    }
}

impl Error for NodeValidationError {}

fn ensure_present(value: &str, field: &'static str) -> Result<(), NodeValidationError> {
    if value.trim().is_empty() {
        return Err(NodeValidationError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KnowledgeGraphNode {
        KnowledgeGraphNode::new("example.node.1", "Example Node")
            .with_content(["First line", "Second line"])
            .with_tags(["example", "demo"])
            .with_section_type("introduction")
    }

    #[test]
    fn validate_rejects_blank_required_fields() {
        let node = KnowledgeGraphNode::new("  ", "Title");
        assert_eq!(
            node.validate(),
            Err(NodeValidationError::MissingField("node_id"))
        );

        let node = KnowledgeGraphNode::new("id", "");
        assert_eq!(node.validate(), Err(NodeValidationError::MissingField("title")));

        assert!(sample().validate().is_ok());
    }

    #[test]
    fn apply_only_touches_supplied_fields() {
        let mut node = sample();
        let before = node.clone();
        node.apply(NodePatch::default().with_title("X"));

        assert_eq!(node.title, "X");
        assert_eq!(node.node_id, before.node_id);
        assert_eq!(node.content, before.content);
        assert_eq!(node.semantic_tags, before.semantic_tags);
        assert_eq!(node.section_type, before.section_type);
    }

    #[test]
    fn patch_with_blank_title_is_invalid() {
        let patch = NodePatch::default().with_title(" ");
        assert!(patch.validate().is_err());
        assert!(NodePatch::default().validate().is_ok());
        assert!(NodePatch::default().is_empty());
    }

    #[test]
    fn duplicate_tags_collapse() {
        let node = KnowledgeGraphNode::new("a", "A").with_tags(["x", "y", "x"]);
        assert_eq!(node.semantic_tags.len(), 2);
    }

    #[test]
    fn markdown_rendering_prefixes_title() {
        let node = sample();
        assert_eq!(node.content_text(), "First line\nSecond line");
        assert_eq!(
            node.to_markdown(),
            "# Example Node\n\nFirst line\nSecond line"
        );
    }
}
