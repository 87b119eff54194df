//! Risk assessment and explanation data structures

use crate::types::profile::CustomerProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Probability above which a customer is shown as high risk.
/// A fixed business rule, not a configuration value.
pub const HIGH_RISK_THRESHOLD: f64 = 0.5;

/// Binary risk label shown next to the probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLabel {
    Low,
    High,
}

impl RiskLabel {
    /// High iff the probability is strictly greater than the threshold
    pub fn from_probability(probability: f64) -> Self {
        if probability > HIGH_RISK_THRESHOLD {
            RiskLabel::High
        } else {
            RiskLabel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Low => "Low",
            RiskLabel::High => "High",
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, RiskLabel::High)
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Risk", self.as_str())
    }
}

/// Outcome of scoring one customer profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Unique analysis identifier
    pub analysis_id: String,

    /// Profile the assessment was computed from
    pub profile: CustomerProfile,

    /// Positive-class (churn) probability, 0.0 - 1.0
    pub probability: f64,

    /// Label derived from the probability
    pub risk_label: RiskLabel,

    /// When the analysis ran
    pub timestamp: DateTime<Utc>,
}

impl RiskAssessment {
    pub fn new(profile: CustomerProfile, probability: f64) -> Self {
        Self {
            analysis_id: uuid::Uuid::new_v4().to_string(),
            profile,
            probability,
            risk_label: RiskLabel::from_probability(probability),
            timestamp: Utc::now(),
        }
    }
}

/// Additive contribution of one feature to the model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub contribution: f64,
}

/// Per-feature decomposition of a single prediction.
///
/// `base_value + sum(contributions)` equals the model output in the
/// explainer's units (log-odds for tree ensembles).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub base_value: f64,
    /// One entry per feature, in column order
    pub contributions: Vec<FeatureContribution>,
}

impl Explanation {
    pub fn total(&self) -> f64 {
        self.base_value + self.contributions.iter().map(|c| c.contribution).sum::<f64>()
    }

    /// Contributions sorted by descending magnitude
    pub fn ranked(&self) -> Vec<&FeatureContribution> {
        let mut ranked: Vec<&FeatureContribution> = self.contributions.iter().collect();
        ranked.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(Ordering::Equal)
        });
        ranked
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.contributions
            .iter()
            .find(|c| c.feature == feature)
            .map(|c| c.contribution)
    }
}
