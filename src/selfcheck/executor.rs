//! Plan execution.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::host::{ArtifactStore, PluginHost, ToolArgs, ToolRequest};
use super::manifest::Manifest;
use super::plan::{Check, Plan, Source, Step};
use super::report::{CheckResult, Report};
use crate::error::{Error, Result};
use crate::loss::{LossClass, LossReport};
use crate::model::{Corpus, ModuleType, sha256_hex};

/// Configuration for self-check runs.
#[derive(Debug, Clone)]
pub struct SelfCheckConfig {
    /// Parent of the per-run scratch directory (default: the system temp dir).
    pub temp_root: Option<PathBuf>,
    /// File a tool leaves in its output directory when it records a transcript.
    pub transcript_name: String,
}

impl Default for SelfCheckConfig {
    fn default() -> Self {
        Self {
            temp_root: None,
            transcript_name: "transcript.jsonl".to_string(),
        }
    }
}

/// Runs plans against an artifact store and a plugin host.
///
/// All steps run first, in order; the first failing step aborts the run with
/// its error. Checks then run to completion and each contributes a result.
/// Intermediate files live in a scratch directory that is removed when the
/// run ends, whichever way it ends.
pub struct SelfCheck<'a> {
    store: &'a dyn ArtifactStore,
    host: &'a dyn PluginHost,
    config: SelfCheckConfig,
}

/// Session state shared by steps and checks.
struct Session<'d> {
    dir: &'d Path,
    outputs: BTreeMap<String, PathBuf>,
}

impl<'d> Session<'d> {
    fn new(dir: &'d Path) -> Self {
        Self {
            dir,
            outputs: BTreeMap::new(),
        }
    }

    fn resolve(&self, owner: &str, key: &str) -> Result<&Path> {
        self.outputs
            .get(key)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::UnknownKey {
                step: owner.to_string(),
                key: key.to_string(),
            })
    }

    /// A fresh directory for step number `index`.
    fn step_dir(&self, index: usize, step_id: &str) -> Result<PathBuf> {
        let dir = self.dir.join(format!("{index:02}-{}", file_safe(step_id)));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn insert(&mut self, key: &str, path: PathBuf) {
        self.outputs.insert(key.to_string(), path);
    }
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Hash of a JSON document independent of whitespace and key order.
fn structure_hash(bytes: &[u8]) -> Result<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(sha256_hex(&serde_json::to_vec(&value)?))
}

impl<'a> SelfCheck<'a> {
    pub fn new(store: &'a dyn ArtifactStore, host: &'a dyn PluginHost) -> Self {
        Self {
            store,
            host,
            config: SelfCheckConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SelfCheckConfig) -> Self {
        self.config = config;
        self
    }

    /// Run `plan` and report on its checks.
    ///
    /// An `Err` means a step could not run; failed checks are reported in the
    /// returned [`Report`] instead.
    pub fn run(&self, plan: &Plan, manifest: &Manifest) -> Result<Report> {
        plan.validate()?;
        info!(
            plan = %plan.id,
            steps = plan.steps.len(),
            checks = plan.checks.len(),
            "running self-check plan"
        );

        let workdir = self.scratch_dir()?;
        let mut session = Session::new(workdir.path());

        for (index, step) in plan.steps.iter().enumerate() {
            debug!(plan = %plan.id, step = step.id(), kind = step.kind(), "running step");
            self.run_step(index, step, manifest, &mut session)?;
        }

        let results = plan
            .checks
            .iter()
            .map(|check| self.run_check(check, manifest, &session))
            .collect();
        let report = Report::new(plan.id.clone(), results);

        info!(plan = %plan.id, status = ?report.status, "self-check finished");
        Ok(report)
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("scriptorium-check-");
        let dir = match &self.config.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    // ========================================================================
    // Steps
    // ========================================================================

    fn run_step(
        &self,
        index: usize,
        step: &Step,
        manifest: &Manifest,
        session: &mut Session<'_>,
    ) -> Result<()> {
        match step {
            Step::Export {
                id,
                artifact,
                mode,
                output,
            } => {
                manifest.artifact(artifact)?;
                let dest = session.step_dir(index, id)?.join(file_safe(artifact));
                self.store.export(artifact, *mode, &dest)?;
                session.insert(output, dest);
            }

            Step::RunTool {
                id,
                plugin,
                profile,
                inputs,
                output,
            } => {
                let inputs = inputs
                    .iter()
                    .map(|key| session.resolve(id, key).map(Path::to_path_buf))
                    .collect::<Result<Vec<_>>>()?;
                let output_dir = session.step_dir(index, id)?;
                let request = ToolRequest {
                    command: "run".to_string(),
                    args: ToolArgs {
                        profile: profile.clone(),
                        inputs,
                        output_dir: output_dir.clone(),
                    },
                };

                let response = self.host.run_tool(plugin, &request)?;
                if !response.is_ok() {
                    return Err(Error::Tool {
                        plugin: plugin.clone(),
                        status: response.status,
                        message: response.error.unwrap_or_default(),
                    });
                }

                let transcript = output_dir.join(&self.config.transcript_name);
                if transcript.is_file() {
                    session.insert(&format!("{output}.transcript"), transcript);
                }
                session.insert(output, output_dir);
            }

            Step::ExtractIr {
                id,
                plugin,
                input,
                output,
            } => {
                let source = session.resolve(id, input)?.to_path_buf();
                let dir = session.step_dir(index, id)?;
                let ir = match plugin.as_deref().and_then(|name| self.host.format_plugin(name)) {
                    Some(p) => p.extract_ir(&source, &dir)?,
                    None => {
                        warn!(step = %id, plugin = ?plugin, "no format plugin, writing placeholder IR");
                        placeholder_ir(&source, &dir)?
                    }
                };
                session.insert(output, ir);
            }

            Step::EmitNative {
                id,
                plugin,
                input,
                output,
            } => {
                let ir = session.resolve(id, input)?.to_path_buf();
                let dir = session.step_dir(index, id)?;
                let native = match plugin.as_deref().and_then(|name| self.host.format_plugin(name)) {
                    Some(p) => p.emit_native(&ir, &dir)?,
                    None => {
                        warn!(step = %id, plugin = ?plugin, "no format plugin, passing IR through");
                        let dest = dir.join(ir.file_name().unwrap_or("ir.json".as_ref()));
                        fs::copy(&ir, &dest)?;
                        dest
                    }
                };
                session.insert(output, native);
            }

            Step::CompareIr {
                id,
                left,
                right,
                output,
            } => {
                let left_hash = structure_hash(&fs::read(session.resolve(id, left)?)?)?;
                let right_hash = structure_hash(&fs::read(session.resolve(id, right)?)?)?;
                let matched = left_hash == right_hash;
                debug!(step = %id, matched, "compared IR outputs");

                let record = json!({
                    "left": left,
                    "right": right,
                    "left_hash": left_hash,
                    "right_hash": right_hash,
                    "match": matched,
                });
                let dest = session.step_dir(index, id)?.join("comparison.json");
                fs::write(&dest, serde_json::to_vec_pretty(&record)?)?;
                session.insert(output, dest);
            }
        }
        Ok(())
    }

    // ========================================================================
    // Checks
    // ========================================================================

    fn run_check(&self, check: &Check, manifest: &Manifest, session: &Session<'_>) -> CheckResult {
        let result = self
            .evaluate(check, manifest, session)
            .unwrap_or_else(|e| CheckResult::input_error(check.kind(), e));
        if result.pass {
            debug!(check = check.kind(), "check passed");
        } else {
            warn!(check = check.kind(), details = ?result.details, "check failed");
        }
        result
    }

    fn evaluate(
        &self,
        check: &Check,
        manifest: &Manifest,
        session: &Session<'_>,
    ) -> Result<CheckResult> {
        let kind = check.kind();
        let read = |source: &Source| self.read(kind, source, manifest, session);

        let result = match check {
            Check::ByteEqual { expected, actual } | Check::TranscriptEqual { expected, actual } => {
                let expected_hash = sha256_hex(&read(expected)?);
                let actual_hash = sha256_hex(&read(actual)?);
                CheckResult::hashes(kind, expected_hash, actual_hash)
                    .detail("expected", expected.to_string())
                    .detail("actual", actual.to_string())
            }

            Check::IrStructureEqual { expected, actual } => {
                let expected_hash = structure_hash(&read(expected)?)?;
                let actual_hash = structure_hash(&read(actual)?)?;
                CheckResult::hashes(kind, expected_hash, actual_hash)
                    .detail("expected", expected.to_string())
                    .detail("actual", actual.to_string())
            }

            Check::IrRoundtrip {
                input,
                max_loss_class,
            } => CheckResult::new(kind, true)
                .detail("input", input.to_string())
                .detail("max_loss_class", max_loss_class.as_str()),

            Check::IrFidelity {
                input,
                max_loss_class,
                budget,
            } => {
                let snapshot: serde_json::Value = serde_json::from_slice(&read(input)?)?;
                let class = match snapshot.get("loss_class") {
                    None | Some(serde_json::Value::Null) => LossClass::L0,
                    Some(serde_json::Value::String(s)) => match s.parse::<LossClass>() {
                        Ok(class) => class,
                        Err(e) => return Ok(CheckResult::input_error(kind, e)),
                    },
                    Some(other) => {
                        return Ok(CheckResult::input_error(
                            kind,
                            format!("loss_class is not a string: {other}"),
                        ));
                    }
                };

                let mut result = CheckResult::new(kind, class <= *max_loss_class)
                    .detail("input", input.to_string())
                    .detail("loss_class", class.as_str())
                    .detail("max_loss_class", max_loss_class.as_str());

                if let Some(budget) = budget {
                    let report = match snapshot.get("loss_report") {
                        Some(embedded) if !embedded.is_null() => {
                            serde_json::from_value::<LossReport>(embedded.clone())?
                        }
                        _ => LossReport::default().with_class(class),
                    };
                    let outcome = budget.check(Some(&report));
                    result.pass &= outcome.within_budget;
                    result = result
                        .detail("within_budget", outcome.within_budget)
                        .detail("lost_element_count", outcome.lost_element_count)
                        .detail("violations", outcome.violations);
                }
                result
            }
        };
        Ok(result)
    }

    fn read(
        &self,
        owner: &str,
        source: &Source,
        manifest: &Manifest,
        session: &Session<'_>,
    ) -> Result<Vec<u8>> {
        match source {
            Source::Artifact(id) => self.store.retrieve(&manifest.artifact(id)?.content_hash),
            Source::Run(id) => self.store.retrieve(&manifest.run(id)?.transcript_hash),
            Source::Output(key) => Ok(fs::read(session.resolve(owner, key)?)?),
        }
    }
}

/// Minimal IR for a source no plugin could read: an empty corpus that
/// records the source's hash.
fn placeholder_ir(source: &Path, dir: &Path) -> Result<PathBuf> {
    let bytes = fs::read(source)?;
    let name = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let mut corpus = Corpus::new(name, ModuleType::default(), "").with_title("placeholder");
    corpus.source_hash = Some(sha256_hex(&bytes));

    let path = dir.join("ir.json");
    fs::write(&path, corpus.to_json()?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use crate::selfcheck::host::{FormatPlugin, NoPlugins, ToolResponse};
    use crate::selfcheck::plan::ExportMode;
    use std::cell::Cell;

    /// Store holding one artifact; `corrupt` flips a byte on export.
    struct MemoryStore {
        bytes: Vec<u8>,
        corrupt: bool,
    }

    impl MemoryStore {
        fn new(bytes: &[u8]) -> Self {
            Self {
                bytes: bytes.to_vec(),
                corrupt: false,
            }
        }

        fn hash(&self) -> String {
            sha256_hex(&self.bytes)
        }
    }

    impl ArtifactStore for MemoryStore {
        fn export(&self, _artifact_id: &str, _mode: ExportMode, dest: &Path) -> Result<()> {
            let mut bytes = self.bytes.clone();
            if self.corrupt {
                bytes[0] ^= 0xff;
            }
            fs::write(dest, bytes)?;
            Ok(())
        }

        fn retrieve(&self, content_hash: &str) -> Result<Vec<u8>> {
            if content_hash == self.hash() {
                Ok(self.bytes.clone())
            } else {
                Err(Error::UnknownArtifact(content_hash.to_string()))
            }
        }
    }

    /// Tool that writes a transcript; the text changes per call when `drift` is set.
    struct EchoTool {
        drift: bool,
        calls: Cell<u32>,
    }

    impl PluginHost for EchoTool {
        fn format_plugin(&self, _name: &str) -> Option<&dyn FormatPlugin> {
            None
        }

        fn run_tool(&self, plugin: &str, request: &ToolRequest) -> Result<ToolResponse> {
            if plugin != "echo" {
                return Ok(ToolResponse::failed("unknown tool"));
            }
            let n = self.calls.get() + 1;
            self.calls.set(n);
            let line = if self.drift {
                format!("{{\"call\":{n}}}\n")
            } else {
                "{\"call\":1}\n".to_string()
            };
            fs::write(request.args.output_dir.join("transcript.jsonl"), line)?;
            Ok(ToolResponse::ok())
        }
    }

    fn manifest(store: &MemoryStore) -> Manifest {
        Manifest::new().with_artifact("kjv.osis", store.hash())
    }

    #[test]
    fn test_identity_plan_passes_and_fails() {
        let store = MemoryStore::new(b"<osis>In the beginning</osis>");
        let plan = Plan::identity_bytes("kjv.osis");

        let report = SelfCheck::new(&store, &NoPlugins)
            .run(&plan, &manifest(&store))
            .unwrap();
        assert!(report.passed());

        let corrupted = MemoryStore {
            corrupt: true,
            ..MemoryStore::new(b"<osis>In the beginning</osis>")
        };
        let report = SelfCheck::new(&corrupted, &NoPlugins)
            .run(&plan, &manifest(&corrupted))
            .unwrap();
        assert!(!report.passed());
        let failure = report.failures().next().unwrap();
        assert_ne!(failure.expected_hash, failure.actual_hash);
        assert!(failure.expected_hash.is_some());
    }

    #[test]
    fn test_unknown_key_aborts_plan() {
        let store = MemoryStore::new(b"x");
        let plan = Plan::new("p", "").step(Step::ExtractIr {
            id: "extract".into(),
            plugin: None,
            input: "nowhere".into(),
            output: "ir".into(),
        });
        let err = SelfCheck::new(&store, &NoPlugins)
            .run(&plan, &manifest(&store))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownKey { step, key } if step == "extract" && key == "nowhere"));
    }

    #[test]
    fn test_missing_check_input_is_a_failed_result() {
        let store = MemoryStore::new(b"x");
        let plan = Plan::new("p", "")
            .check(Check::ByteEqual {
                expected: Source::Artifact("kjv.osis".into()),
                actual: Source::Output("never-written".into()),
            })
            .check(Check::ByteEqual {
                expected: Source::Artifact("kjv.osis".into()),
                actual: Source::Artifact("kjv.osis".into()),
            });
        let report = SelfCheck::new(&store, &NoPlugins)
            .run(&plan, &manifest(&store))
            .unwrap();
        assert!(!report.passed());
        assert!(!report.results[0].pass);
        assert!(report.results[0].details.contains_key("error"));
        assert!(report.results[1].pass);
    }

    #[test]
    fn test_behavior_identity_with_tool() {
        let store = MemoryStore::new(b"<osis/>");
        let plan = Plan::behavior_identity("kjv.osis", "echo", "default");

        let stable = EchoTool {
            drift: false,
            calls: Cell::new(0),
        };
        let report = SelfCheck::new(&store, &stable)
            .run(&plan, &manifest(&store))
            .unwrap();
        assert!(report.passed());
        assert_eq!(stable.calls.get(), 2);

        let drifting = EchoTool {
            drift: true,
            calls: Cell::new(0),
        };
        let report = SelfCheck::new(&store, &drifting)
            .run(&plan, &manifest(&store))
            .unwrap();
        assert!(!report.passed());
    }

    #[test]
    fn test_tool_failure_aborts() {
        let store = MemoryStore::new(b"<osis/>");
        let plan = Plan::behavior_identity("kjv.osis", "other", "default");
        let tool = EchoTool {
            drift: false,
            calls: Cell::new(0),
        };
        let err = SelfCheck::new(&store, &tool)
            .run(&plan, &manifest(&store))
            .unwrap_err();
        assert!(matches!(err, Error::Tool { status, .. } if status == "error"));
    }

    #[test]
    fn test_placeholder_pipeline_and_fidelity() {
        let store = MemoryStore::new(b"\\id GEN\n\\c 1\n\\v 1 In the beginning");
        let plan = Plan::new("roundtrip", "")
            .step(Step::Export {
                id: "export".into(),
                artifact: "kjv.osis".into(),
                mode: ExportMode::Identity,
                output: "src".into(),
            })
            .step(Step::ExtractIr {
                id: "extract".into(),
                plugin: Some("usfm".into()),
                input: "src".into(),
                output: "ir".into(),
            })
            .step(Step::EmitNative {
                id: "emit".into(),
                plugin: None,
                input: "ir".into(),
                output: "native".into(),
            })
            .step(Step::CompareIr {
                id: "compare".into(),
                left: "ir".into(),
                right: "native".into(),
                output: "cmp".into(),
            })
            .check(Check::IrStructureEqual {
                expected: Source::Output("ir".into()),
                actual: Source::Output("native".into()),
            })
            .check(Check::IrFidelity {
                input: Source::Output("ir".into()),
                max_loss_class: LossClass::L0,
                budget: None,
            })
            .check(Check::IrRoundtrip {
                input: Source::Output("ir".into()),
                max_loss_class: LossClass::L1,
            })
            .check(Check::IrFidelity {
                input: Source::Output("cmp".into()),
                max_loss_class: LossClass::L0,
                budget: None,
            });

        let report = SelfCheck::new(&store, &NoPlugins)
            .run(&plan, &manifest(&store))
            .unwrap();
        assert!(report.passed(), "{:?}", report.failures().collect::<Vec<_>>());
        assert_eq!(
            report.results[2].details.get("max_loss_class"),
            Some(&Value::from("L1"))
        );
    }

    #[test]
    fn test_scratch_dir_removed() {
        let root = tempfile::tempdir().unwrap();
        let store = MemoryStore::new(b"x");
        let config = SelfCheckConfig {
            temp_root: Some(root.path().to_path_buf()),
            ..Default::default()
        };
        let check = SelfCheck::new(&store, &NoPlugins).with_config(config);

        check
            .run(&Plan::identity_bytes("kjv.osis"), &manifest(&store))
            .unwrap();
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);

        // a failing step cleans up too
        let bad = Plan::identity_bytes("missing");
        assert!(matches!(
            check.run(&bad, &manifest(&store)),
            Err(Error::UnknownArtifact(_))
        ));
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
