//! MCP tool modules.
//!
//! Tools are grouped by domain: node access, bulk loading, and context
//! composition with its help output.

pub mod context;
pub mod load;
pub mod nodes;
