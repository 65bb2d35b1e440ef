//! Error types for scriptorium operations.

use thiserror::Error;

use crate::reference::ParseRefError;

/// Errors that abort the current operation.
///
/// Validation findings and policy outcomes (budget violations, hash
/// mismatches) are ordinary values and never surface through this type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    RefParse(#[from] ParseRefError),

    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Step {step} references unknown key {key:?}")]
    UnknownKey { step: String, key: String },

    #[error("Unknown artifact: {0}")]
    UnknownArtifact(String),

    #[error("Unknown run: {0}")]
    UnknownRun(String),

    #[error("No plugin registered under {0:?}")]
    MissingPlugin(String),

    #[error("Plugin {plugin} failed: {message}")]
    Plugin { plugin: String, message: String },

    #[error("Tool {plugin} returned status {status:?}: {message}")]
    Tool {
        plugin: String,
        status: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, Error>;
