//! Records of externally supplied artifacts and tool runs.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What the plan may reference besides its own step outputs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub artifacts: Vec<ArtifactRecord>,
    #[serde(default)]
    pub runs: Vec<RunRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: String,
    pub content_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    pub transcript_hash: String,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(mut self, id: impl Into<String>, content_hash: impl Into<String>) -> Self {
        self.artifacts.push(ArtifactRecord {
            id: id.into(),
            content_hash: content_hash.into(),
        });
        self
    }

    pub fn with_run(mut self, id: impl Into<String>, transcript_hash: impl Into<String>) -> Self {
        self.runs.push(RunRecord {
            id: id.into(),
            transcript_hash: transcript_hash.into(),
        });
        self
    }

    pub fn artifact(&self, id: &str) -> Result<&ArtifactRecord> {
        self.artifacts
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::UnknownArtifact(id.to_string()))
    }

    pub fn run(&self, id: &str) -> Result<&RunRecord> {
        self.runs
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::UnknownRun(id.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
