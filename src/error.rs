use crate::scene::NodeId;
use std::io;
use thiserror::Error;

/// Rejected controller configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// NaN or infinite value
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    /// Durations, radii, frequencies and similar must not be negative
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    /// Scale factors must stay strictly positive
    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f32 },
}

/// Construction-time failures of the animation core
///
/// Nothing in the per-frame path returns these; `update` always degrades to
/// leaving joints untouched instead.
#[derive(Error, Debug)]
pub enum AnimError {
    /// Node id outside the scene graph
    #[error("unknown scene node {0:?}")]
    UnknownNode(NodeId),

    /// Two controllers claimed the same node channel
    #[error("{channel} of node {node:?} is already driven by '{holder}', cannot hand it to '{claimant}'")]
    OwnershipConflict {
        node: NodeId,
        channel: &'static str,
        holder: String,
        claimant: String,
    },

    /// Skeleton joint whose parent role was not built before it
    #[error("joint '{joint}' is listed before its parent '{parent}'")]
    MissingParent { joint: String, parent: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnimError>;
