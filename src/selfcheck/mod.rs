//! Plan-based round-trip verification.
//!
//! A [`Plan`] is a fixed list of steps (export, run a tool, extract IR, emit
//! native, compare IR) followed by a fixed list of checks. There is no
//! branching: steps feed each other through a session key to path map, and
//! checks read from that map or from the [`Manifest`] of stored artifacts.
//!
//! Running a plan yields a [`Report`]. A step that cannot run is an error
//! and stops the plan; a check that does not hold is a failed
//! [`CheckResult`], and the remaining checks still run.
//!
//! # Example
//!
//! ```
//! use std::fs;
//! use std::path::Path;
//!
//! use scriptorium::model::sha256_hex;
//! use scriptorium::selfcheck::{ArtifactStore, ExportMode, Manifest, NoPlugins, Plan, SelfCheck};
//!
//! struct OneFile(Vec<u8>);
//!
//! impl ArtifactStore for OneFile {
//!     fn export(&self, _id: &str, _mode: ExportMode, dest: &Path) -> scriptorium::Result<()> {
//!         Ok(fs::write(dest, &self.0)?)
//!     }
//!     fn retrieve(&self, _hash: &str) -> scriptorium::Result<Vec<u8>> {
//!         Ok(self.0.clone())
//!     }
//! }
//!
//! let store = OneFile(b"<osis/>".to_vec());
//! let manifest = Manifest::new().with_artifact("kjv.osis", sha256_hex(b"<osis/>"));
//! let report = SelfCheck::new(&store, &NoPlugins)
//!     .run(&Plan::identity_bytes("kjv.osis"), &manifest)?;
//! assert!(report.passed());
//! # Ok::<(), scriptorium::Error>(())
//! ```

mod executor;
mod host;
mod manifest;
mod plan;
mod report;

pub use executor::{SelfCheck, SelfCheckConfig};
pub use host::{ArtifactStore, FormatPlugin, NoPlugins, PluginHost, ToolArgs, ToolRequest, ToolResponse};
pub use manifest::{ArtifactRecord, Manifest, RunRecord};
pub use plan::{Check, ExportMode, Plan, Source, Step};
pub use report::{CheckResult, REPORT_VERSION, Report, Status};
