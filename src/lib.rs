//! ChurnGuard Library
//!
//! Customer churn risk scoring over a gradient-boosted tree model, with
//! per-feature TreeSHAP explanations of every prediction.

pub mod config;
pub mod error;
pub mod feature_vector;
pub mod metrics;
pub mod models;
pub mod render;
pub mod session;
pub mod types;

pub use config::AppConfig;
pub use error::{ChurnError, ChurnResult};
pub use feature_vector::{build_vector, FeatureNames, FeatureVector};
pub use models::inference::{Analysis, InferenceEngine};
pub use models::loader::ResourceLoader;
pub use session::DashboardSession;
pub use types::{profile::CustomerProfile, report::RiskAssessment};
