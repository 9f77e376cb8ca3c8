//! Storage models and schema helpers for the context engine.
//!
//! This crate defines the knowledge graph node model shared by the loader,
//! the control plane, and every storage backend, together with the filter
//! language and the backend schema definitions.

pub mod filter;
pub mod models;
pub mod schema;

pub use filter::{ExactField, FilterShape, NodeFilter};
pub use models::*;
