//! Parsers for node source inputs.
//!
//! Each parser turns an external node format into validated
//! `KnowledgeGraphNode` values before anything reaches a store.

pub mod node_json;

pub use node_json::{NodeJsonParser, NodeParseError};
