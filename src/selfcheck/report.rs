//! Self-check reports.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Value;

pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_type: String,
    pub pass: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hash: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
}

impl CheckResult {
    pub fn new(check_type: impl Into<String>, pass: bool) -> Self {
        Self {
            check_type: check_type.into(),
            pass,
            expected_hash: None,
            actual_hash: None,
            details: BTreeMap::new(),
        }
    }

    /// A hash comparison; passes iff the hashes are equal.
    pub fn hashes(check_type: impl Into<String>, expected: String, actual: String) -> Self {
        let mut result = Self::new(check_type, expected == actual);
        result.expected_hash = Some(expected);
        result.actual_hash = Some(actual);
        result
    }

    /// A check whose inputs could not be read.
    pub fn input_error(check_type: impl Into<String>, error: impl ToString) -> Self {
        Self::new(check_type, false).detail("error", error.to_string())
    }

    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// The result of running a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_version: String,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub plan_id: String,
    pub results: Vec<CheckResult>,
    pub status: Status,
}

impl Report {
    /// Build a report stamped with the current time. The status is `pass`
    /// only when every result passed.
    pub fn new(plan_id: impl Into<String>, results: Vec<CheckResult>) -> Self {
        let status = if results.iter().all(|r| r.pass) {
            Status::Pass
        } else {
            Status::Fail
        };
        Self {
            report_version: REPORT_VERSION.to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            plan_id: plan_id.into(),
            results,
            status,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.pass)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
