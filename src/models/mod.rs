//! Churn model loading, scoring and explanation

pub mod ensemble;
pub mod inference;
pub mod loader;
pub mod model;
mod shap;

pub use ensemble::TreeEnsemble;
pub use inference::{Analysis, InferenceEngine};
pub use loader::{ArtifactStore, FsArtifactStore, ResourceLoader, Resources};
pub use model::ChurnModel;
