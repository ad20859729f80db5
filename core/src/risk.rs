//! Risk classification: Low/Medium/High buckets and the binary churn
//! decision. Both cut-off sets are configuration.

use crate::{
    error::{ChurnError, ChurnResult},
    types::Probability,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBucket {
    Low,
    Medium,
    High,
}

impl RiskBucket {
    pub fn label(self) -> &'static str {
        match self {
            RiskBucket::Low    => "Low Risk",
            RiskBucket::Medium => "Medium Risk",
            RiskBucket::High   => "High Risk",
        }
    }
}

impl fmt::Display for RiskBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower bounds (inclusive) of the Medium and High buckets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub medium: f64,
    pub high:   f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self::standard()
    }
}

impl RiskThresholds {
    /// ≥0.7 High, ≥0.4 Medium.
    pub fn standard() -> Self {
        Self { medium: 0.4, high: 0.7 }
    }

    /// ≥0.8 High, ≥0.5 Medium.
    pub fn conservative() -> Self {
        Self { medium: 0.5, high: 0.8 }
    }

    pub fn new(medium: f64, high: f64) -> ChurnResult<Self> {
        let t = Self { medium, high };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> ChurnResult<()> {
        let in_unit = |x: f64| (0.0..=1.0).contains(&x);
        if !in_unit(self.medium) || !in_unit(self.high) {
            return Err(ChurnError::InvalidThresholds {
                reason: format!(
                    "risk cut-offs must lie in [0, 1] (medium={}, high={})",
                    self.medium, self.high
                ),
            });
        }
        if self.medium > self.high {
            return Err(ChurnError::InvalidThresholds {
                reason: format!(
                    "medium cut-off {} is above high cut-off {}",
                    self.medium, self.high
                ),
            });
        }
        Ok(())
    }

    pub fn bucket(&self, p: Probability) -> RiskBucket {
        if p >= self.high {
            RiskBucket::High
        } else if p >= self.medium {
            RiskBucket::Medium
        } else {
            RiskBucket::Low
        }
    }
}

/// The binary churn call: `p >= threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThreshold {
    pub threshold: f64,
}

impl Default for DecisionThreshold {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl DecisionThreshold {
    pub fn new(threshold: f64) -> ChurnResult<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ChurnError::InvalidThresholds {
                reason: format!("decision threshold {threshold} is outside [0, 1]"),
            });
        }
        Ok(Self { threshold })
    }

    pub fn will_churn(&self, p: Probability) -> bool {
        p >= self.threshold
    }
}
