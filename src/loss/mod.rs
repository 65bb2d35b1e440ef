//! Fidelity classification and budget enforcement.
//!
//! Every conversion produces a [`LossReport`]: an overall [`LossClass`] plus the
//! individual elements that did not survive. A [`LossBudget`] is the policy
//! gate that decides whether a report is acceptable.
//!
//! # Example
//!
//! ```
//! use scriptorium::loss::{LossBudget, LossClass, LossReport};
//!
//! let report = LossReport::new("osis", "usfm")
//!     .with_class(LossClass::L1)
//!     .add_lost_element("documents[0].spans[3]", "RED_LETTER", "target has no red-letter markup", None);
//!
//! assert!(LossBudget::semantic().is_within_budget(Some(&report)));
//! assert!(!LossBudget::strict().is_within_budget(Some(&report)));
//! ```

mod budget;

pub use budget::{LossBudget, LossBudgetResult};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::Value;

/// Ordered fidelity class, from byte-exact (`L0`) to plain text only (`L4`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum LossClass {
    /// Byte-for-byte identical round trip.
    #[default]
    L0,
    /// All content preserved; some non-semantic formatting differs.
    L1,
    /// Minor structural loss (some markup or addressing dropped).
    L2,
    /// Significant loss (annotations or whole structural layers dropped).
    L3,
    /// Plain text only.
    L4,
}

impl LossClass {
    pub const ALL: [LossClass; 5] = [
        LossClass::L0,
        LossClass::L1,
        LossClass::L2,
        LossClass::L3,
        LossClass::L4,
    ];

    /// Severity, 0 through 4.
    pub fn level(self) -> u8 {
        match self {
            LossClass::L0 => 0,
            LossClass::L1 => 1,
            LossClass::L2 => 2,
            LossClass::L3 => 3,
            LossClass::L4 => 4,
        }
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL.get(level as usize).copied()
    }

    pub fn is_lossless(self) -> bool {
        self == LossClass::L0
    }

    /// All content preserved, even if formatting differs.
    pub fn is_semantically_lossless(self) -> bool {
        self <= LossClass::L1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LossClass::L0 => "L0",
            LossClass::L1 => "L1",
            LossClass::L2 => "L2",
            LossClass::L3 => "L3",
            LossClass::L4 => "L4",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LossClass::L0 => "lossless: byte-identical round trip",
            LossClass::L1 => "semantically lossless: formatting differs",
            LossClass::L2 => "minor loss: some structure or addressing dropped",
            LossClass::L3 => "significant loss: annotations or structural layers dropped",
            LossClass::L4 => "text only: all markup lost",
        }
    }
}

impl fmt::Display for LossClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LossClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L0" => Ok(LossClass::L0),
            "L1" => Ok(LossClass::L1),
            "L2" => Ok(LossClass::L2),
            "L3" => Ok(LossClass::L3),
            "L4" => Ok(LossClass::L4),
            other => Err(format!("unknown loss class {other:?}")),
        }
    }
}

/// One element that did not survive a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostElement {
    /// Dotted path of the element in the source IR.
    pub path: String,
    pub element_type: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_value: Option<Value>,
}

/// What a conversion lost.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LossReport {
    #[serde(default)]
    pub source_format: String,
    #[serde(default)]
    pub target_format: String,
    #[serde(default)]
    pub loss_class: LossClass,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lost_elements: Vec<LostElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl LossReport {
    /// An empty, lossless report.
    pub fn new(source_format: impl Into<String>, target_format: impl Into<String>) -> Self {
        Self {
            source_format: source_format.into(),
            target_format: target_format.into(),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: LossClass) -> Self {
        self.loss_class = class;
        self
    }

    /// Record a lost element (builder form).
    pub fn add_lost_element(
        mut self,
        path: impl Into<String>,
        element_type: impl Into<String>,
        reason: impl Into<String>,
        original_value: Option<Value>,
    ) -> Self {
        self.record_lost_element(path, element_type, reason, original_value);
        self
    }

    /// Record a lost element in place.
    pub fn record_lost_element(
        &mut self,
        path: impl Into<String>,
        element_type: impl Into<String>,
        reason: impl Into<String>,
        original_value: Option<Value>,
    ) {
        self.lost_elements.push(LostElement {
            path: path.into(),
            element_type: element_type.into(),
            reason: reason.into(),
            original_value,
        });
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Raise the class to at least `class`; never lowers it.
    pub fn escalate(&mut self, class: LossClass) {
        self.loss_class = self.loss_class.max(class);
    }

    /// True when anything was recorded as lost, or the class alone signals loss.
    pub fn has_loss(&self) -> bool {
        !self.lost_elements.is_empty() || self.loss_class.level() > 0
    }

    pub fn lossless(&self) -> bool {
        !self.has_loss()
    }

    /// Lost elements not exempted by `allowed` (an empty list exempts nothing).
    pub fn relevant_lost_count(&self, allowed: &[String]) -> usize {
        self.lost_elements
            .iter()
            .filter(|e| !allowed.iter().any(|t| *t == e.element_type))
            .count()
    }
}
