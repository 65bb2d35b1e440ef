//! Loss budgets: the policy gate over loss reports.

use serde::{Deserialize, Serialize};

use super::{LossClass, LossReport};

/// Maximum acceptable loss for a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LossBudget {
    pub max_loss_class: LossClass,
    /// Cap on relevant lost elements; `0` means no cap.
    #[serde(default)]
    pub max_lost_elements: usize,
    /// Element types that do not count against the cap.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_element_types: Vec<String>,
}

/// Outcome of [`LossBudget::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossBudgetResult {
    pub within_budget: bool,
    /// `None` when no report was supplied.
    pub actual_class: Option<LossClass>,
    pub allowed_class: LossClass,
    /// Relevant (non-exempt) lost elements.
    pub lost_element_count: usize,
    pub violations: Vec<String>,
}

impl LossBudget {
    pub fn new(max_loss_class: LossClass) -> Self {
        Self {
            max_loss_class,
            ..Default::default()
        }
    }

    /// Only byte-identical conversions pass.
    pub fn strict() -> Self {
        Self::new(LossClass::L0)
    }

    /// Formatting may change, content may not.
    pub fn semantic() -> Self {
        Self::new(LossClass::L1)
    }

    pub fn with_max_lost_elements(mut self, max: usize) -> Self {
        self.max_lost_elements = max;
        self
    }

    pub fn allow_element_type(mut self, element_type: impl Into<String>) -> Self {
        self.allowed_element_types.push(element_type.into());
        self
    }

    /// Whether `report` fits the budget. A missing report always passes.
    pub fn is_within_budget(&self, report: Option<&LossReport>) -> bool {
        let Some(report) = report else {
            return true;
        };
        if report.loss_class > self.max_loss_class {
            return false;
        }
        if self.max_lost_elements > 0
            && report.relevant_lost_count(&self.allowed_element_types) > self.max_lost_elements
        {
            return false;
        }
        true
    }

    /// Same decision as [`is_within_budget`](Self::is_within_budget), with
    /// every violation spelled out.
    pub fn check(&self, report: Option<&LossReport>) -> LossBudgetResult {
        let Some(report) = report else {
            return LossBudgetResult {
                within_budget: true,
                actual_class: None,
                allowed_class: self.max_loss_class,
                lost_element_count: 0,
                violations: Vec::new(),
            };
        };

        let count = report.relevant_lost_count(&self.allowed_element_types);
        let mut violations = Vec::new();
        if report.loss_class > self.max_loss_class {
            violations.push(format!(
                "loss class {} exceeds maximum {}",
                report.loss_class, self.max_loss_class
            ));
        }
        if self.max_lost_elements > 0 && count > self.max_lost_elements {
            violations.push(format!(
                "{count} lost elements exceed maximum {}",
                self.max_lost_elements
            ));
        }

        LossBudgetResult {
            within_budget: violations.is_empty(),
            actual_class: Some(report.loss_class),
            allowed_class: self.max_loss_class,
            lost_element_count: count,
            violations,
        }
    }
}
