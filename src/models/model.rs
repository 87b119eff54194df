//! Narrow interface between the dashboard and a trained classifier

use crate::error::ChurnResult;
use crate::feature_vector::FeatureVector;
use crate::types::report::Explanation;

/// A binary churn classifier with an attached attribution routine.
///
/// Implementations must be deterministic: the same vector always yields the
/// same probability and the same contributions.
pub trait ChurnModel: Send + Sync {
    /// Model name for logging
    fn name(&self) -> &str;

    /// Probability mass on the positive ("will churn") class
    fn predict_probability(&self, vector: &FeatureVector) -> ChurnResult<f64>;

    /// Additive per-feature decomposition of the prediction
    fn explain(&self, vector: &FeatureVector) -> ChurnResult<Explanation>;
}
