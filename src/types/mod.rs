//! Type definitions for churn scoring

pub mod profile;
pub mod report;

pub use profile::CustomerProfile;
pub use report::{Explanation, FeatureContribution, RiskAssessment, RiskLabel, HIGH_RISK_THRESHOLD};
