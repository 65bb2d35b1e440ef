//! Plan documents: a linear list of steps followed by a list of checks.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::loss::{LossBudget, LossClass};

/// How the artifact store materializes an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportMode {
    /// The stored bytes, unchanged.
    #[default]
    Identity,
    /// A representation derived from the stored bytes.
    Derived,
}

/// One pipeline step. Each step writes exactly one session key, `output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    /// Materialize a manifest artifact.
    Export {
        id: String,
        artifact: String,
        #[serde(default)]
        mode: ExportMode,
        output: String,
    },
    /// Run a tool plugin over session inputs. Also writes
    /// `<output>.transcript` when the tool leaves a transcript.
    RunTool {
        id: String,
        plugin: String,
        #[serde(default)]
        profile: String,
        #[serde(default)]
        inputs: Vec<String>,
        output: String,
    },
    /// Convert a native artifact to IR.
    ExtractIr {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plugin: Option<String>,
        input: String,
        output: String,
    },
    /// Convert IR back to a native format.
    EmitNative {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plugin: Option<String>,
        input: String,
        output: String,
    },
    /// Compare two IR outputs and write the comparison record.
    CompareIr {
        id: String,
        left: String,
        right: String,
        output: String,
    },
}

impl Step {
    pub fn id(&self) -> &str {
        match self {
            Step::Export { id, .. }
            | Step::RunTool { id, .. }
            | Step::ExtractIr { id, .. }
            | Step::EmitNative { id, .. }
            | Step::CompareIr { id, .. } => id,
        }
    }

    /// Session key the step writes.
    pub fn output(&self) -> &str {
        match self {
            Step::Export { output, .. }
            | Step::RunTool { output, .. }
            | Step::ExtractIr { output, .. }
            | Step::EmitNative { output, .. }
            | Step::CompareIr { output, .. } => output,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Step::Export { .. } => "EXPORT",
            Step::RunTool { .. } => "RUN_TOOL",
            Step::ExtractIr { .. } => "EXTRACT_IR",
            Step::EmitNative { .. } => "EMIT_NATIVE",
            Step::CompareIr { .. } => "COMPARE_IR",
        }
    }
}

/// Where a check reads its bytes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A manifest artifact, fetched from the store by content hash.
    Artifact(String),
    /// A manifest run's transcript, fetched from the store by hash.
    Run(String),
    /// A file written by a step under this session key.
    Output(String),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Artifact(id) => write!(f, "artifact:{id}"),
            Source::Run(id) => write!(f, "run:{id}"),
            Source::Output(key) => write!(f, "output:{key}"),
        }
    }
}

/// A check over step outputs and manifest records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Check {
    /// Byte blobs hash identically.
    ByteEqual { expected: Source, actual: Source },
    /// Tool transcripts hash identically.
    TranscriptEqual { expected: Source, actual: Source },
    /// IR snapshots are structurally identical (formatting and key order
    /// ignored).
    IrStructureEqual { expected: Source, actual: Source },
    /// Records the declared bound; does not re-derive the round trip.
    IrRoundtrip {
        input: Source,
        max_loss_class: LossClass,
    },
    /// The snapshot's `loss_class` is within `max_loss_class`, and within
    /// `budget` when one is given.
    IrFidelity {
        input: Source,
        max_loss_class: LossClass,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        budget: Option<LossBudget>,
    },
}

impl Check {
    pub fn kind(&self) -> &'static str {
        match self {
            Check::ByteEqual { .. } => "BYTE_EQUAL",
            Check::TranscriptEqual { .. } => "TRANSCRIPT_EQUAL",
            Check::IrStructureEqual { .. } => "IR_STRUCTURE_EQUAL",
            Check::IrRoundtrip { .. } => "IR_ROUNDTRIP",
            Check::IrFidelity { .. } => "IR_FIDELITY",
        }
    }
}

/// A self-check plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub checks: Vec<Check>,
}

impl Plan {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            steps: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject plans that cannot run: missing ids, or two steps sharing an id
    /// or an output key.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidPlan("plan id is required".into()));
        }
        let mut ids = HashSet::new();
        let mut outputs = HashSet::new();
        for step in &self.steps {
            if step.id().is_empty() {
                return Err(Error::InvalidPlan(format!(
                    "{} step without an id",
                    step.kind()
                )));
            }
            if !ids.insert(step.id()) {
                return Err(Error::InvalidPlan(format!("duplicate step id {:?}", step.id())));
            }
            if !outputs.insert(step.output()) {
                return Err(Error::InvalidPlan(format!(
                    "step {:?} reuses output key {:?}",
                    step.id(),
                    step.output()
                )));
            }
        }
        Ok(())
    }

    /// Export an artifact unchanged and compare it byte-for-byte with the
    /// stored original.
    pub fn identity_bytes(artifact_id: &str) -> Self {
        Plan::new(
            format!("identity-bytes:{artifact_id}"),
            "exported bytes match the stored artifact",
        )
        .step(Step::Export {
            id: "export".into(),
            artifact: artifact_id.into(),
            mode: ExportMode::Identity,
            output: "exported".into(),
        })
        .check(Check::ByteEqual {
            expected: Source::Artifact(artifact_id.into()),
            actual: Source::Output("exported".into()),
        })
    }

    /// Run a tool twice over the same artifact and compare the transcripts.
    pub fn behavior_identity(artifact_id: &str, plugin: &str, profile: &str) -> Self {
        let run = |id: &str, output: &str| Step::RunTool {
            id: id.into(),
            plugin: plugin.into(),
            profile: profile.into(),
            inputs: vec!["input".into()],
            output: output.into(),
        };
        Plan::new(
            format!("behavior-identity:{artifact_id}:{plugin}"),
            "two runs of the same tool produce the same transcript",
        )
        .step(Step::Export {
            id: "export".into(),
            artifact: artifact_id.into(),
            mode: ExportMode::Identity,
            output: "input".into(),
        })
        .step(run("run-1", "run1"))
        .step(run("run-2", "run2"))
        .check(Check::TranscriptEqual {
            expected: Source::Output("run1.transcript".into()),
            actual: Source::Output("run2.transcript".into()),
        })
    }
}
