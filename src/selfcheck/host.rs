//! Collaborators the executor drives: artifact store, format plugins and tools.
//!
//! Implementations live outside this crate (a content-addressed blob store,
//! a plugin process host). The executor treats every call as atomic and
//! passes errors through unchanged.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ExportMode;
use crate::error::{Error, Result};

/// Content-addressed artifact storage.
pub trait ArtifactStore {
    /// Write the artifact to `dest`.
    fn export(&self, artifact_id: &str, mode: ExportMode, dest: &Path) -> Result<()>;

    /// Fetch a blob by its SHA-256 hex digest.
    fn retrieve(&self, content_hash: &str) -> Result<Vec<u8>>;
}

/// A format converter to and from IR.
pub trait FormatPlugin {
    /// Convert `source` to an IR snapshot inside `output_dir`; returns its path.
    fn extract_ir(&self, source: &Path, output_dir: &Path) -> Result<PathBuf>;

    /// Convert an IR snapshot to native format inside `output_dir`; returns its path.
    fn emit_native(&self, ir: &Path, output_dir: &Path) -> Result<PathBuf>;
}

/// Resolves plugins by name.
pub trait PluginHost {
    /// `None` when no plugin of that name can convert formats.
    fn format_plugin(&self, name: &str) -> Option<&dyn FormatPlugin>;

    /// Invoke a tool plugin and wait for it to finish.
    fn run_tool(&self, plugin: &str, request: &ToolRequest) -> Result<ToolResponse>;
}

/// Request sent to a tool plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub command: String,
    pub args: ToolArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolArgs {
    pub profile: String,
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
}

/// A tool plugin's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".into(),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// A host with no plugins: conversions use their fallbacks and tool runs fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlugins;

impl PluginHost for NoPlugins {
    fn format_plugin(&self, _name: &str) -> Option<&dyn FormatPlugin> {
        None
    }

    fn run_tool(&self, plugin: &str, _request: &ToolRequest) -> Result<ToolResponse> {
        Err(Error::MissingPlugin(plugin.to_string()))
    }
}
