//! Context composition over a set of nodes.
//!
//! Nodes are ordered by composition priority, then importance, both
//! descending, with `node_id` breaking ties so output is stable across
//! backends that return rows in arbitrary order.

use std::cmp::Reverse;

use kg_store::KnowledgeGraphNode;
use serde_json::Value;

/// Score of `composition_rules.priority`: high 3, medium 2, anything else 1.
#[must_use]
pub fn priority_score(node: &KnowledgeGraphNode) -> u8 {
    let priority = json_key(&node.composition_rules, "priority");
    match priority.as_deref().map(str::to_lowercase).as_deref() {
        Some("high") => 3,
        Some("medium") => 2,
        _ => 1,
    }
}

/// Score of the node importance: foundational and core 3, operational 2,
/// anything else 1. Falls back to `metadata.importance`.
#[must_use]
pub fn importance_score(node: &KnowledgeGraphNode) -> u8 {
    let importance = node
        .importance
        .clone()
        .or_else(|| json_key(&node.metadata, "importance"));
    match importance.as_deref().map(str::to_lowercase).as_deref() {
        Some("foundational" | "core") => 3,
        Some("operational") => 2,
        _ => 1,
    }
}

/// Sorts nodes into composition order.
pub fn sort_for_composition(nodes: &mut [KnowledgeGraphNode]) {
    nodes.sort_by(|left, right| {
        let left_key = (Reverse(priority_score(left)), Reverse(importance_score(left)));
        let right_key = (Reverse(priority_score(right)), Reverse(importance_score(right)));
        left_key
            .cmp(&right_key)
            .then_with(|| left.node_id.cmp(&right.node_id))
    });
}

/// Joins the content of every node in composition order, leaving a blank
/// line after each node.
#[must_use]
pub fn compose_context(mut nodes: Vec<KnowledgeGraphNode>) -> String {
    sort_for_composition(&mut nodes);
    let mut parts = Vec::new();
    for node in nodes {
        parts.extend(node.content);
        parts.push(String::new());
    }
    parts.join("\n")
}

fn json_key(raw: &str, key: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, priority: Option<&str>, importance: Option<&str>) -> KnowledgeGraphNode {
        let mut node = KnowledgeGraphNode::new(id, id).with_content([format!("{id} body")]);
        if let Some(priority) = priority {
            node = node.with_composition_rules(format!(r#"{{"priority":"{priority}"}}"#));
        }
        if let Some(importance) = importance {
            node = node.with_importance(importance);
        }
        node
    }

    #[test]
    fn scores_follow_priority_and_importance_tables() {
        assert_eq!(priority_score(&node("a", Some("HIGH"), None)), 3);
        assert_eq!(priority_score(&node("a", Some("medium"), None)), 2);
        assert_eq!(priority_score(&node("a", Some("low"), None)), 1);
        assert_eq!(priority_score(&node("a", None, None)), 1);
        assert_eq!(importance_score(&node("a", None, Some("core"))), 3);
        assert_eq!(importance_score(&node("a", None, Some("operational"))), 2);
        assert_eq!(importance_score(&node("a", None, None)), 1);
    }

    #[test]
    fn importance_falls_back_to_metadata() {
        let node = KnowledgeGraphNode::new("a", "A").with_metadata(r#"{"importance":"foundational"}"#);
        assert_eq!(importance_score(&node), 3);
    }

    #[test]
    fn composition_orders_by_priority_then_importance_then_id() {
        let nodes = vec![
            node("c", Some("low"), Some("core")),
            node("b", Some("high"), Some("supporting")),
            node("a", Some("high"), Some("foundational")),
            node("d", Some("low"), Some("core")),
        ];
        assert_eq!(
            compose_context(nodes),
            "a body\n\nb body\n\nc body\n\nd body\n"
        );
    }

    #[test]
    fn empty_input_composes_to_empty_text() {
        assert_eq!(compose_context(Vec::new()), "");
    }
}
