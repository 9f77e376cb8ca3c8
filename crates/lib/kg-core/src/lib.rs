//! Core services for the context engine.
//!
//! This crate owns the node stores (`SurrealDB` and Dgraph backends), the
//! node file loader, and the control plane that layers deadlines, bulk
//! loading, and context composition over a store.

pub mod compose;
pub mod control;
pub mod parsers;
pub mod store;
