//! Composable node filters.
//!
//! A `NodeFilter` is backend-neutral. Backends first reduce it with
//! [`NodeFilter::shape`] and then render the remaining predicate tree into
//! their own query language.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::KnowledgeGraphNode;
use crate::schema::{FIELD_IMPORTANCE, FIELD_NODE_ID, FIELD_SECTION_TYPE, FIELD_SEMANTIC_TAGS};

/// Fields that carry an exact-match index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExactField {
    NodeId,
    SemanticTags,
    SectionType,
    Importance,
}

impl ExactField {
    /// Storage predicate name for this field.
    #[must_use]
    pub const fn predicate(self) -> &'static str {
        match self {
            Self::NodeId => FIELD_NODE_ID,
            Self::SemanticTags => FIELD_SEMANTIC_TAGS,
            Self::SectionType => FIELD_SECTION_TYPE,
            Self::Importance => FIELD_IMPORTANCE,
        }
    }

    /// Whether the field holds several values per node.
    #[must_use]
    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Self::SemanticTags)
    }
}

/// Predicate over indexed node fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NodeFilter {
    /// Every node.
    #[default]
    All,
    /// Exact equality; on `semantic_tags` it means "contains".
    Eq { field: ExactField, value: String },
    /// Title shares at least one term with `text`.
    AnyOfText { text: String },
    And(Vec<NodeFilter>),
    Or(Vec<NodeFilter>),
}

/// Normalized form of a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterShape {
    MatchAll,
    MatchNone,
    /// A predicate tree free of `All` and of empty or single-child groups.
    Predicate(NodeFilter),
}

impl NodeFilter {
    pub fn node_id(value: impl Into<String>) -> Self {
        Self::eq(ExactField::NodeId, value)
    }

    pub fn tag(value: impl Into<String>) -> Self {
        Self::eq(ExactField::SemanticTags, value)
    }

    pub fn section_type(value: impl Into<String>) -> Self {
        Self::eq(ExactField::SectionType, value)
    }

    pub fn importance(value: impl Into<String>) -> Self {
        Self::eq(ExactField::Importance, value)
    }

    pub fn eq(field: ExactField, value: impl Into<String>) -> Self {
        Self::Eq {
            field,
            value: value.into(),
        }
    }

    pub fn title_any_of(text: impl Into<String>) -> Self {
        Self::AnyOfText { text: text.into() }
    }

    pub fn and(filters: impl IntoIterator<Item = Self>) -> Self {
        Self::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(filters.into_iter().collect())
    }

    /// Reduces the filter so backends never see trivially true or false groups.
    #[must_use]
    pub fn shape(self) -> FilterShape {
        match self {
            Self::All => FilterShape::MatchAll,
            Self::Eq { .. } => FilterShape::Predicate(self),
            Self::AnyOfText { text } => {
                if text_terms(&text).is_empty() {
                    FilterShape::MatchNone
                } else {
                    FilterShape::Predicate(Self::AnyOfText { text })
                }
            }
            Self::And(children) => {
                let mut kept = Vec::with_capacity(children.len());
                for child in children {
                    match child.shape() {
                        FilterShape::MatchAll => {}
                        FilterShape::MatchNone => return FilterShape::MatchNone,
                        FilterShape::Predicate(predicate) => kept.push(predicate),
                    }
                }
                collapse(kept, FilterShape::MatchAll, Self::And)
            }
            Self::Or(children) => {
                let mut kept = Vec::with_capacity(children.len());
                for child in children {
                    match child.shape() {
                        FilterShape::MatchAll => return FilterShape::MatchAll,
                        FilterShape::MatchNone => {}
                        FilterShape::Predicate(predicate) => kept.push(predicate),
                    }
                }
                collapse(kept, FilterShape::MatchNone, Self::Or)
            }
        }
    }

    /// Evaluates the filter against an in-memory node.
    ///
    /// Title matching uses [`text_terms`], which approximates but does not
    /// reproduce a backend's full-text analyzer.
    #[must_use]
    pub fn matches(&self, node: &KnowledgeGraphNode) -> bool {
        match self {
            Self::All => true,
            Self::Eq { field, value } => match field {
                ExactField::NodeId => node.node_id == *value,
                ExactField::SemanticTags => node.semantic_tags.contains(value),
                ExactField::SectionType => node.section_type.as_deref() == Some(value.as_str()),
                ExactField::Importance => node.importance.as_deref() == Some(value.as_str()),
            },
            Self::AnyOfText { text } => {
                let wanted = text_terms(text);
                let title = text_terms(&node.title);
                !wanted.is_disjoint(&title)
            }
            Self::And(children) => children.iter().all(|child| child.matches(node)),
            Self::Or(children) => children.iter().any(|child| child.matches(node)),
        }
    }
}

fn collapse(
    mut kept: Vec<NodeFilter>,
    empty: FilterShape,
    wrap: fn(Vec<NodeFilter>) -> NodeFilter,
) -> FilterShape {
    match kept.len() {
        0 => empty,
        1 => kept.pop().map_or(empty, FilterShape::Predicate),
        _ => FilterShape::Predicate(wrap(kept)),
    }
}

/// Lowercased alphanumeric terms of `text`.
#[must_use]
pub fn text_terms(text: &str) -> BTreeSet<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}
