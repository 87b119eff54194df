//! Inference engine: vector construction, prediction and explanation

use crate::error::{ChurnError, ChurnResult};
use crate::feature_vector::{FeatureNames, FeatureVector};
use crate::models::loader::Resources;
use crate::models::model::ChurnModel;
use crate::types::profile::CustomerProfile;
use crate::types::report::{Explanation, RiskAssessment};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one "run analysis" action.
///
/// The explanation may fail on its own without invalidating the prediction.
#[derive(Debug)]
pub struct Analysis {
    pub assessment: RiskAssessment,
    pub explanation: ChurnResult<Explanation>,
}

/// Scores customer profiles against a loaded model
pub struct InferenceEngine {
    model: Arc<dyn ChurnModel>,
    feature_names: FeatureNames,
}

impl InferenceEngine {
    pub fn new(model: Arc<dyn ChurnModel>, feature_names: FeatureNames) -> Self {
        Self {
            model,
            feature_names,
        }
    }

    pub fn from_resources(resources: &Resources) -> Self {
        Self::new(resources.model.clone(), resources.feature_names.clone())
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn feature_names(&self) -> &FeatureNames {
        &self.feature_names
    }

    /// Zero-filled row with the four profile columns written
    pub fn build_vector(&self, profile: &CustomerProfile) -> FeatureVector {
        profile.to_feature_vector(&self.feature_names)
    }

    /// Churn probability for a vector, guaranteed to lie in [0, 1]
    pub fn predict(&self, vector: &FeatureVector) -> ChurnResult<f64> {
        let probability = self.model.predict_probability(vector)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(ChurnError::PredictionFailed(format!(
                "model '{}' returned {} outside [0, 1]",
                self.model.name(),
                probability
            )));
        }
        Ok(probability)
    }

    /// Per-feature contribution breakdown for a vector
    pub fn explain(&self, vector: &FeatureVector) -> ChurnResult<Explanation> {
        self.model.explain(vector)
    }

    /// Score a profile without computing an explanation
    pub fn assess(&self, profile: &CustomerProfile) -> ChurnResult<RiskAssessment> {
        let vector = self.build_vector(profile);
        let probability = self.predict(&vector)?;
        Ok(RiskAssessment::new(profile.clone(), probability))
    }

    /// Build, predict, then explain
    pub fn analyze(&self, profile: &CustomerProfile) -> ChurnResult<Analysis> {
        let vector = self.build_vector(profile);
        let probability = self.predict(&vector)?;
        let assessment = RiskAssessment::new(profile.clone(), probability);

        debug!(
            analysis_id = %assessment.analysis_id,
            probability = probability,
            risk_label = ?assessment.risk_label,
            "Prediction complete"
        );

        let explanation = self.explain(&vector);
        match &explanation {
            Ok(explanation) => {
                info!(
                    analysis_id = %assessment.analysis_id,
                    probability = probability,
                    risk_label = %assessment.risk_label,
                    base_value = explanation.base_value,
                    "Analysis complete"
                );
            }
            Err(e) => {
                warn!(
                    analysis_id = %assessment.analysis_id,
                    error = %e,
                    "Explanation failed, keeping prediction"
                );
            }
        }

        Ok(Analysis {
            assessment,
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_vector::{MONTHLY_CHARGES, NUM_SERVICES, TENURE, TOTAL_CHARGES};
    use crate::types::report::{FeatureContribution, RiskLabel};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Deterministic stand-in returning a fixed probability
    struct FixedModel {
        probability: f64,
        explain_fails: bool,
        seen: Mutex<Vec<FeatureVector>>,
        predictions: AtomicUsize,
    }

    impl FixedModel {
        fn new(probability: f64) -> Self {
            Self {
                probability,
                explain_fails: false,
                seen: Mutex::new(Vec::new()),
                predictions: AtomicUsize::new(0),
            }
        }
    }

    impl ChurnModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict_probability(&self, vector: &FeatureVector) -> ChurnResult<f64> {
            self.predictions.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(vector.clone());
            Ok(self.probability)
        }

        fn explain(&self, vector: &FeatureVector) -> ChurnResult<Explanation> {
            if self.explain_fails {
                return Err(ChurnError::ExplanationFailed("attribution unavailable".into()));
            }
            Ok(Explanation {
                base_value: 0.0,
                contributions: vector
                    .columns()
                    .iter()
                    .zip(vector.values())
                    .map(|(feature, value)| FeatureContribution {
                        feature: feature.to_string(),
                        contribution: value / 1000.0,
                    })
                    .collect(),
            })
        }
    }

    /// Stand-in that rejects every vector
    struct BrokenModel;

    impl ChurnModel for BrokenModel {
        fn name(&self) -> &str {
            "broken"
        }

        fn predict_probability(&self, _vector: &FeatureVector) -> ChurnResult<f64> {
            Err(ChurnError::PredictionFailed("feature shape mismatch".into()))
        }

        fn explain(&self, _vector: &FeatureVector) -> ChurnResult<Explanation> {
            panic!("explain must not run after a failed prediction");
        }
    }

    fn names() -> FeatureNames {
        FeatureNames::new(["gender", TENURE, MONTHLY_CHARGES, TOTAL_CHARGES, NUM_SERVICES, "Partner"])
    }

    #[test]
    fn test_scenario_a_high_risk() {
        let model = Arc::new(FixedModel::new(0.73));
        let engine = InferenceEngine::new(model.clone(), names());

        let analysis = engine.analyze(&CustomerProfile::default()).unwrap();
        assert_eq!(analysis.assessment.probability, 0.73);
        assert_eq!(analysis.assessment.risk_label, RiskLabel::High);
        assert_eq!(analysis.assessment.risk_label.to_string(), "High Risk");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].values(), &[0.0, 12.0, 70.0, 1000.0, 2.0, 0.0]);
    }

    #[test]
    fn test_scenario_b_low_risk() {
        let engine = InferenceEngine::new(Arc::new(FixedModel::new(0.12)), names());

        let analysis = engine.analyze(&CustomerProfile::default()).unwrap();
        assert_eq!(analysis.assessment.risk_label, RiskLabel::Low);
        assert_eq!(analysis.assessment.risk_label.to_string(), "Low Risk");
        assert!(analysis.explanation.is_ok());
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let engine = InferenceEngine::new(Arc::new(FixedModel::new(1.2)), names());
        assert!(matches!(
            engine.assess(&CustomerProfile::default()),
            Err(ChurnError::PredictionFailed(_))
        ));

        let engine = InferenceEngine::new(Arc::new(FixedModel::new(f64::NAN)), names());
        assert!(matches!(
            engine.assess(&CustomerProfile::default()),
            Err(ChurnError::PredictionFailed(_))
        ));
    }

    #[test]
    fn test_prediction_failure_aborts_request() {
        let engine = InferenceEngine::new(Arc::new(BrokenModel), names());
        assert!(matches!(
            engine.analyze(&CustomerProfile::default()),
            Err(ChurnError::PredictionFailed(_))
        ));
    }

    #[test]
    fn test_explanation_failure_keeps_prediction() {
        let mut model = FixedModel::new(0.64);
        model.explain_fails = true;
        let engine = InferenceEngine::new(Arc::new(model), names());

        let analysis = engine.analyze(&CustomerProfile::default()).unwrap();
        assert_eq!(analysis.assessment.probability, 0.64);
        assert!(matches!(analysis.explanation, Err(ChurnError::ExplanationFailed(_))));
    }

    #[test]
    fn test_predict_is_idempotent() {
        let model = Arc::new(FixedModel::new(0.31));
        let engine = InferenceEngine::new(model.clone(), names());
        let vector = engine.build_vector(&CustomerProfile::new(24, 89.9, 2100.0, 4));

        assert_eq!(engine.predict(&vector).unwrap(), engine.predict(&vector).unwrap());
        assert_eq!(model.predictions.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_explanation_follows_columns() {
        let engine = InferenceEngine::new(Arc::new(FixedModel::new(0.4)), names());
        let vector = engine.build_vector(&CustomerProfile::default());
        let explanation = engine.explain(&vector).unwrap();

        assert_eq!(explanation.contributions.len(), 6);
        assert_eq!(explanation.ranked()[0].feature, TOTAL_CHARGES);
        assert_eq!(explanation.get("gender"), Some(0.0));
    }
}
