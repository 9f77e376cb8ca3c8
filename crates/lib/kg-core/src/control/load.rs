use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::parsers::NodeJsonParser;
use crate::store::{NodeStore, StoreError};

use super::{ControlError, KgControlPlane};

/// Input payload for loading nodes from a node file.
///
/// Exactly one of `json` and `json_path` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeLoadRequest {
    pub json: Option<String>,
    pub json_path: Option<String>,
    /// Overwrite nodes that already exist instead of skipping them.
    #[serde(default)]
    pub replace_existing: bool,
}

impl NodeLoadRequest {
    pub fn from_json(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
            ..Self::default()
        }
    }

    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            json_path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn replacing(mut self, replace_existing: bool) -> Self {
        self.replace_existing = replace_existing;
        self
    }
}

/// Summary of a load operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadReport {
    pub parsed: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl<S: NodeStore> KgControlPlane<S> {
    /// Parses a node file and writes every node.
    ///
    /// Parsing finishes before the first write, so a bad record leaves the
    /// store untouched.
    ///
    /// # Errors
    /// Returns `ControlError` if the request is malformed, parsing fails, or
    /// a store write fails.
    pub async fn load_nodes(&self, request: NodeLoadRequest) -> Result<LoadReport, ControlError> {
        let NodeLoadRequest {
            json,
            json_path,
            replace_existing,
        } = request;

        let nodes = match (json, json_path) {
            (Some(json), None) => NodeJsonParser::parse_async(json).await?,
            (None, Some(path)) => NodeJsonParser::parse_file(&path).await?,
            (Some(_), Some(_)) => {
                return Err(ControlError::InvalidRequest(
                    "provide either json or json_path, not both".to_string(),
                ));
            }
            (None, None) => {
                return Err(ControlError::InvalidRequest(
                    "json or json_path is required".to_string(),
                ));
            }
        };

        let mut report = LoadReport {
            parsed: nodes.len(),
            ..LoadReport::default()
        };
        for node in nodes {
            let node_id = node.node_id.clone();
            let replacement = replace_existing.then(|| node.clone());
            match self.create_node(node).await {
                Ok(_) => report.created += 1,
                Err(ControlError::Store(StoreError::DuplicateKey(_))) => match replacement {
                    Some(replacement) => {
                        self.replace_node(replacement).await?;
                        report.updated += 1;
                    }
                    None => {
                        debug!(node_id = %node_id, "node exists; skipped");
                        report.skipped += 1;
                    }
                },
                Err(err) => return Err(err),
            }
        }
        info!(
            parsed = report.parsed,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "loaded nodes"
        );
        Ok(report)
    }
}
