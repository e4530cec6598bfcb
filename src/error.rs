//! Application-wide error types.
//!
//! Every variant is fatal at startup: the resolver runs once before the
//! broker's listeners open and never retries.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("malformed assigned name '{name}': {reason}")]
    MalformedName { name: String, reason: String },

    #[error(
        "cluster mismatch: volume belongs to cluster '{found}', expected '{expected}'"
    )]
    ClusterMismatch { expected: String, found: String },

    #[error(
        "identity conflict: volume holds node_id {found}, but this node resolved to node_id {expected}"
    )]
    IdentityConflict { expected: u32, found: u32 },

    #[error("voter set inconsistency for node_id {node_id}: {reason} (voters: [{voters}])")]
    VoterSetInconsistency {
        node_id: u32,
        reason: String,
        voters: String,
    },

    #[error("persistence error at {}: {reason}", .path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("launch error: {0}")]
    Launch(String),
}

impl AppError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AppError::Persistence {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
