//! Configuration management for the churn dashboard

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// How analysis results are written to stdout
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Text dashboard with a contribution bar chart
    #[default]
    Text,
    /// One JSON document per analysis
    Json,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Locations of the persisted model artifacts
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Tree ensemble dump (JSON)
    pub model_path: String,
    /// Ordered feature-name list (JSON array)
    pub features_path: String,
}

/// Dashboard rendering configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Number of contributions shown in the bar chart
    #[serde(default = "default_top_features")]
    pub top_features: usize,
    /// Width in characters of the longest bar
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
    #[serde(default)]
    pub output: OutputFormat,
}

fn default_top_features() -> usize {
    10
}

fn default_bar_width() -> usize {
    30
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_features: default_top_features(),
            bar_width: default_bar_width(),
            output: OutputFormat::Text,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                model_path: "artifacts/churn_model.json".to_string(),
                features_path: "artifacts/features.json".to_string(),
            },
            dashboard: DashboardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.artifacts.model_path, "artifacts/churn_model.json");
        assert_eq!(config.artifacts.features_path, "artifacts/features.json");
        assert_eq!(config.dashboard.top_features, 10);
        assert_eq!(config.dashboard.output, OutputFormat::Text);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[artifacts]
model_path = "models/xgb.json"
features_path = "models/features.json"

[dashboard]
output = "json"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.artifacts.model_path, "models/xgb.json");
        assert_eq!(config.dashboard.output, OutputFormat::Json);
        assert_eq!(config.dashboard.bar_width, 30);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_missing_artifacts_section_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\nformat = \"json\"\n").unwrap();

        assert!(AppConfig::load_from_path(&path).is_err());
    }
}
