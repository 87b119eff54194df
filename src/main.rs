//! ChurnGuard - Main Entry Point
//!
//! Loads the churn model once, then runs one risk analysis per customer
//! profile read from stdin (one JSON object per line).

use anyhow::{Context, Result};
use churnguard::{
    config::{AppConfig, LoggingConfig},
    models::loader::ResourceLoader,
    render::DashboardRenderer,
    session::DashboardSession,
};
use std::io::{self, BufRead, Write};
use tracing::info;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("churnguard={}", logging.level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting ChurnGuard");
    info!(
        model = %config.artifacts.model_path,
        features = %config.artifacts.features_path,
        "Configuration loaded successfully"
    );

    // The dashboard cannot run without both artifacts
    let loader = ResourceLoader::from_config(&config.artifacts);
    let resources = loader
        .load()
        .context("Failed to load model artifacts")?;
    info!(
        model = %resources.model.name(),
        features = resources.feature_names.len(),
        "Resources ready"
    );

    let session = DashboardSession::new(loader, DashboardRenderer::new(&config.dashboard));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(placeholder) = session.renderer().placeholder() {
        writeln!(out, "{}", placeholder)?;
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read input")?;
        if let Some(output) = session.handle_line(&line) {
            writeln!(out, "{}", output)?;
            out.flush()?;
        }
    }

    info!("Session ending...");
    session.metrics().print_summary();

    Ok(())
}
