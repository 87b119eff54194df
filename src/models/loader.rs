//! Model and feature-list loader with a process-lifetime cache

use crate::config::ArtifactsConfig;
use crate::error::{Artifact, ChurnError, ChurnResult};
use crate::feature_vector::{FeatureNames, INPUT_COLUMNS};
use crate::models::ensemble::TreeEnsemble;
use crate::models::model::ChurnModel;
use once_cell::sync::OnceCell;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Read-only storage holding the serialized artifacts
pub trait ArtifactStore: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Artifacts on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsArtifactStore;

impl ArtifactStore for FsArtifactStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Model handle and feature list from the same training run
#[derive(Clone)]
pub struct Resources {
    pub model: Arc<dyn ChurnModel>,
    pub feature_names: FeatureNames,
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources")
            .field("model", &self.model.name())
            .field("features", &self.feature_names.len())
            .finish()
    }
}

/// Loads the artifacts on first use and hands out the cached pair afterwards
pub struct ResourceLoader<S = FsArtifactStore> {
    store: S,
    model_path: PathBuf,
    features_path: PathBuf,
    cache: OnceCell<Arc<Resources>>,
}

impl ResourceLoader<FsArtifactStore> {
    pub fn from_config(config: &ArtifactsConfig) -> Self {
        Self::with_store(FsArtifactStore, &config.model_path, &config.features_path)
    }
}

impl<S: ArtifactStore> ResourceLoader<S> {
    pub fn with_store<P: AsRef<Path>, Q: AsRef<Path>>(store: S, model_path: P, features_path: Q) -> Self {
        Self {
            store,
            model_path: model_path.as_ref().to_path_buf(),
            features_path: features_path.as_ref().to_path_buf(),
            cache: OnceCell::new(),
        }
    }

    /// Return the cached resources, reading storage only on the first
    /// successful call
    pub fn load(&self) -> ChurnResult<Arc<Resources>> {
        if let Some(resources) = self.cache.get() {
            debug!("Resource cache hit");
            return Ok(resources.clone());
        }
        self.cache
            .get_or_try_init(|| self.read_resources().map(Arc::new))
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    fn read_resources(&self) -> ChurnResult<Resources> {
        info!(
            model = %self.model_path.display(),
            features = %self.features_path.display(),
            "Loading model artifacts"
        );

        let model_bytes = self
            .store
            .read(&self.model_path)
            .map_err(|e| ChurnError::unavailable(Artifact::Model, &self.model_path, e))?;
        let feature_bytes = self
            .store
            .read(&self.features_path)
            .map_err(|e| ChurnError::unavailable(Artifact::FeatureNames, &self.features_path, e))?;

        let feature_names = self.decode_feature_names(&feature_bytes)?;
        let model = TreeEnsemble::from_json(&model_bytes, feature_names.clone())
            .map_err(|e| ChurnError::unavailable(Artifact::Model, &self.model_path, e))?;

        info!(
            model = %model.name(),
            trees = model.tree_count(),
            features = feature_names.len(),
            "Model artifacts loaded"
        );

        Ok(Resources {
            model: Arc::new(model),
            feature_names,
        })
    }

    fn decode_feature_names(&self, bytes: &[u8]) -> ChurnResult<FeatureNames> {
        let unavailable = |reason: String| ChurnError::unavailable(Artifact::FeatureNames, &self.features_path, reason);

        let names: Vec<String> = serde_json::from_slice(bytes).map_err(|e| unavailable(e.to_string()))?;
        if names.is_empty() {
            return Err(unavailable("feature list is empty".to_string()));
        }

        let feature_names = FeatureNames::new(names);
        if let Some(missing) = INPUT_COLUMNS.iter().find(|c| !feature_names.contains(c)) {
            return Err(unavailable(format!("required column '{}' is missing", missing)));
        }
        Ok(feature_names)
    }
}
