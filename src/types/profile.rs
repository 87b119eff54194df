//! Customer profile submitted from the input panel

use crate::error::{ChurnError, ChurnResult};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Tenure in months
pub const TENURE_RANGE: RangeInclusive<u32> = 1..=72;
/// Monthly charge amount
pub const MONTHLY_CHARGES_RANGE: RangeInclusive<f64> = 10.0..=200.0;
/// Total charge amount
pub const TOTAL_CHARGES_RANGE: RangeInclusive<f64> = 10.0..=8000.0;
/// Count of subscribed services
pub const NUM_SERVICES_RANGE: RangeInclusive<u32> = 0..=8;

/// The four attributes a user can adjust before running an analysis.
///
/// Fields left out of an incoming document take the panel defaults.
/// No cross-field consistency (e.g. total vs. tenure x monthly) is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerProfile {
    /// Tenure in months (1-72)
    pub tenure: u32,

    /// Monthly charges in dollars (10.0-200.0)
    #[serde(alias = "MonthlyCharges")]
    pub monthly_charges: f64,

    /// Total charges in dollars (10.0-8000.0)
    #[serde(alias = "TotalCharges")]
    pub total_charges: f64,

    /// Number of subscribed services (0-8)
    #[serde(alias = "Num_Services")]
    pub num_services: u32,
}

impl CustomerProfile {
    pub fn new(tenure: u32, monthly_charges: f64, total_charges: f64, num_services: u32) -> Self {
        Self {
            tenure,
            monthly_charges,
            total_charges,
            num_services,
        }
    }

    /// Check every field against its range
    pub fn validate(&self) -> ChurnResult<()> {
        if !TENURE_RANGE.contains(&self.tenure) {
            return Err(ChurnError::InvalidProfile(format!(
                "tenure {} outside {}..={}",
                self.tenure,
                TENURE_RANGE.start(),
                TENURE_RANGE.end()
            )));
        }
        if !MONTHLY_CHARGES_RANGE.contains(&self.monthly_charges) {
            return Err(ChurnError::InvalidProfile(format!(
                "monthly charges {:.2} outside {:.1}..={:.1}",
                self.monthly_charges,
                MONTHLY_CHARGES_RANGE.start(),
                MONTHLY_CHARGES_RANGE.end()
            )));
        }
        if !TOTAL_CHARGES_RANGE.contains(&self.total_charges) {
            return Err(ChurnError::InvalidProfile(format!(
                "total charges {:.2} outside {:.1}..={:.1}",
                self.total_charges,
                TOTAL_CHARGES_RANGE.start(),
                TOTAL_CHARGES_RANGE.end()
            )));
        }
        if !NUM_SERVICES_RANGE.contains(&self.num_services) {
            return Err(ChurnError::InvalidProfile(format!(
                "number of services {} outside {}..={}",
                self.num_services,
                NUM_SERVICES_RANGE.start(),
                NUM_SERVICES_RANGE.end()
            )));
        }
        Ok(())
    }
}

impl Default for CustomerProfile {
    fn default() -> Self {
        Self::new(12, 70.0, 1000.0, 2)
    }
}
