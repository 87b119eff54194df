//! One dashboard session: every input line is a "run analysis" action

use crate::metrics::SessionMetrics;
use crate::models::inference::InferenceEngine;
use crate::models::loader::{ArtifactStore, FsArtifactStore, ResourceLoader};
use crate::render::DashboardRenderer;
use crate::types::profile::CustomerProfile;
use crate::ChurnError;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Ties the cached resources, the renderer and the session counters together
pub struct DashboardSession<S = FsArtifactStore> {
    loader: ResourceLoader<S>,
    renderer: DashboardRenderer,
    metrics: SessionMetrics,
}

impl<S: ArtifactStore> DashboardSession<S> {
    pub fn new(loader: ResourceLoader<S>, renderer: DashboardRenderer) -> Self {
        Self {
            loader,
            renderer,
            metrics: SessionMetrics::new(),
        }
    }

    pub fn loader(&self) -> &ResourceLoader<S> {
        &self.loader
    }

    pub fn renderer(&self) -> &DashboardRenderer {
        &self.renderer
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Run one analysis for a JSON profile line and return what to display.
    ///
    /// Blank lines yield `None`. Every failure is rendered as a visible
    /// message; the session keeps going.
    pub fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let profile = match serde_json::from_str::<CustomerProfile>(line) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Failed to parse customer profile");
                self.metrics.record_rejected_input();
                return Some(self.renderer.render_failure(&e));
            }
        };
        if let Err(e) = profile.validate() {
            warn!(error = %e, "Customer profile rejected");
            self.metrics.record_rejected_input();
            return Some(self.renderer.render_failure(&e));
        }

        let start_time = Instant::now();

        // Every interaction goes through the cache; storage is read only once
        let resources = match self.loader.load() {
            Ok(resources) => resources,
            Err(e) => {
                error!(error = %e, "Resources unavailable");
                return Some(self.renderer.render_failure(&e));
            }
        };
        let engine = InferenceEngine::from_resources(&resources);

        match engine.analyze(&profile) {
            Ok(analysis) => {
                let elapsed = start_time.elapsed();
                self.metrics.record_analysis(
                    elapsed,
                    analysis.assessment.probability,
                    analysis.assessment.risk_label,
                );
                if analysis.explanation.is_err() {
                    self.metrics.record_explanation_failure();
                }
                debug!(
                    analysis_id = %analysis.assessment.analysis_id,
                    processing_time_us = elapsed.as_micros(),
                    "Analysis rendered"
                );
                Some(self.renderer.render(&analysis))
            }
            Err(e) => {
                if matches!(e, ChurnError::PredictionFailed(_)) {
                    self.metrics.record_prediction_failure();
                }
                error!(error = %e, "Analysis failed");
                Some(self.renderer.render_failure(&e))
            }
        }
    }
}
