//! Feature vector construction for churn model inference.
//!
//! The model consumes one row whose columns are exactly the feature names
//! it was trained on, in the same order. Only four columns come from the
//! input panel; every other column is left at zero.

use crate::types::profile::CustomerProfile;
use std::ops::Index;
use std::sync::Arc;
use tracing::warn;

/// Column names written from user input
pub const TENURE: &str = "tenure";
pub const MONTHLY_CHARGES: &str = "MonthlyCharges";
pub const TOTAL_CHARGES: &str = "TotalCharges";
pub const NUM_SERVICES: &str = "Num_Services";

/// Columns every feature list must contain
pub const INPUT_COLUMNS: [&str; 4] = [TENURE, MONTHLY_CHARGES, TOTAL_CHARGES, NUM_SERVICES];

/// Ordered column contract shared by the model and every vector built for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureNames(Arc<[String]>);

impl FeatureNames {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Index<usize> for FeatureNames {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.0[index]
    }
}

/// A single zero-defaulted row aligned to a [`FeatureNames`] list.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: FeatureNames,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Row of zeros over `columns`
    pub fn zeros(columns: &FeatureNames) -> Self {
        Self {
            columns: columns.clone(),
            values: vec![0.0; columns.len()],
        }
    }

    /// Overwrite a column. An unknown column is appended at the end,
    /// leaving a row wider than the model's schema.
    pub fn set(&mut self, column: &str, value: f64) {
        match self.columns.index_of(column) {
            Some(idx) => self.values[idx] = value,
            None => {
                warn!(column = %column, "Column not in feature list, appending");
                let mut names: Vec<String> = self.columns.as_slice().to_vec();
                names.push(column.to_string());
                self.columns = FeatureNames::new(names);
                self.values.push(value);
            }
        }
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns.index_of(column).map(|idx| self.values[idx])
    }

    pub fn columns(&self) -> &FeatureNames {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Build the model input row for the four panel values.
///
/// Inputs are expected to be in range already; nothing is re-validated here.
pub fn build_vector(
    tenure: u32,
    monthly_charges: f64,
    total_charges: f64,
    num_services: u32,
    feature_names: &FeatureNames,
) -> FeatureVector {
    let mut vector = FeatureVector::zeros(feature_names);
    vector.set(TENURE, tenure as f64);
    vector.set(MONTHLY_CHARGES, monthly_charges);
    vector.set(TOTAL_CHARGES, total_charges);
    vector.set(NUM_SERVICES, num_services as f64);
    vector
}

impl CustomerProfile {
    pub fn to_feature_vector(&self, feature_names: &FeatureNames) -> FeatureVector {
        build_vector(
            self.tenure,
            self.monthly_charges,
            self.total_charges,
            self.num_services,
            feature_names,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telco_names() -> FeatureNames {
        FeatureNames::new([
            "SeniorCitizen",
            "tenure",
            "MonthlyCharges",
            "TotalCharges",
            "Num_Services",
            "Contract_One year",
            "Contract_Two year",
            "InternetService_Fiber optic",
            "PaymentMethod_Electronic check",
        ])
    }

    #[test]
    fn test_scenario_a_vector() {
        let names = telco_names();
        let vector = build_vector(12, 70.0, 1000.0, 2, &names);

        assert_eq!(vector.len(), names.len());
        assert_eq!(vector.get(TENURE), Some(12.0));
        assert_eq!(vector.get(MONTHLY_CHARGES), Some(70.0));
        assert_eq!(vector.get(TOTAL_CHARGES), Some(1000.0));
        assert_eq!(vector.get(NUM_SERVICES), Some(2.0));
    }

    #[test]
    fn test_only_input_columns_are_written() {
        let names = telco_names();
        for profile in [
            CustomerProfile::new(1, 10.0, 10.0, 1),
            CustomerProfile::new(72, 200.0, 8000.0, 8),
            CustomerProfile::new(33, 55.25, 1820.4, 5),
        ] {
            let vector = profile.to_feature_vector(&names);
            for (name, value) in names.iter().zip(vector.values()) {
                if INPUT_COLUMNS.contains(&name) {
                    assert_ne!(*value, 0.0, "{} should carry input", name);
                } else {
                    assert_eq!(*value, 0.0, "{} should stay zero", name);
                }
            }
        }
    }

    #[test]
    fn test_column_order_follows_feature_names() {
        let names = FeatureNames::new(["Num_Services", "TotalCharges", "MonthlyCharges", "tenure"]);
        let vector = build_vector(5, 20.0, 100.0, 3, &names);
        assert_eq!(vector.values(), &[3.0, 100.0, 20.0, 5.0]);
    }

    #[test]
    fn test_missing_column_is_appended() {
        let names = FeatureNames::new(["tenure", "MonthlyCharges", "TotalCharges"]);
        let vector = build_vector(12, 70.0, 1000.0, 2, &names);

        assert_eq!(vector.len(), 4);
        assert_eq!(&vector.columns()[3], NUM_SERVICES);
        assert_eq!(vector.get(NUM_SERVICES), Some(2.0));
        // The shared list itself is untouched
        assert_eq!(names.len(), 3);
    }
}
