//! Terminal rendering of analysis results

use crate::config::{DashboardConfig, OutputFormat};
use crate::models::inference::Analysis;
use crate::types::profile::CustomerProfile;
use crate::types::report::{Explanation, RiskAssessment};
use serde::Serialize;
use std::fmt::Write;

/// Serialized form of an [`Analysis`] for JSON output
#[derive(Debug, Serialize)]
struct AnalysisDocument<'a> {
    #[serde(flatten)]
    assessment: &'a RiskAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation: Option<&'a Explanation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    explanation_error: Option<String>,
}

/// Renders analyses in the configured output format
pub struct DashboardRenderer {
    top_features: usize,
    bar_width: usize,
    output: OutputFormat,
}

impl DashboardRenderer {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            top_features: config.top_features.max(1),
            bar_width: config.bar_width.max(1),
            output: config.output.clone(),
        }
    }

    /// Shown before the first analysis
    pub fn placeholder(&self) -> Option<String> {
        match self.output {
            OutputFormat::Text => Some(
                "Live Retention Dashboard\n\
                 Enter a customer profile as JSON (one per line) to run a risk analysis.\n\
                 Example: {\"tenure\": 12, \"monthly_charges\": 70.0, \"total_charges\": 1000.0, \"num_services\": 2}\n"
                    .to_string(),
            ),
            OutputFormat::Json => None,
        }
    }

    pub fn render(&self, analysis: &Analysis) -> String {
        match self.output {
            OutputFormat::Text => self.render_text(analysis),
            OutputFormat::Json => self.render_json(analysis),
        }
    }

    /// Visible failure message for an aborted request
    pub fn render_failure(&self, error: &dyn std::fmt::Display) -> String {
        match self.output {
            OutputFormat::Text => format!("Analysis failed: {}\n", error),
            OutputFormat::Json => serde_json::json!({ "error": error.to_string() }).to_string(),
        }
    }

    fn render_json(&self, analysis: &Analysis) -> String {
        let document = AnalysisDocument {
            assessment: &analysis.assessment,
            explanation: analysis.explanation.as_ref().ok(),
            explanation_error: analysis.explanation.as_ref().err().map(|e| e.to_string()),
        };
        serde_json::to_string(&document).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }

    fn render_text(&self, analysis: &Analysis) -> String {
        let assessment = &analysis.assessment;
        let mut out = String::new();

        out.push_str(&info_cards(&assessment.profile));
        out.push('\n');

        let _ = writeln!(out, "Risk Probability");
        let _ = writeln!(
            out,
            "  Churn Risk: {:.1}%  ({})",
            assessment.probability * 100.0,
            assessment.risk_label
        );
        let _ = writeln!(out, "  {}", progress_bar(assessment.probability, self.bar_width));
        if assessment.risk_label.is_high() {
            let _ = writeln!(out, "  ACTION NEEDED: High probability of churn!");
        } else {
            let _ = writeln!(out, "  CUSTOMER SAFE: Low probability of churn.");
        }
        out.push('\n');

        let _ = writeln!(out, "Why this prediction?");
        match &analysis.explanation {
            Ok(explanation) => out.push_str(&self.contribution_chart(explanation)),
            Err(e) => {
                let _ = writeln!(out, "  Explanation unavailable: {}", e);
            }
        }

        out
    }

    /// Bar chart of contribution magnitudes, largest first
    fn contribution_chart(&self, explanation: &Explanation) -> String {
        let ranked: Vec<_> = explanation
            .ranked()
            .into_iter()
            .take(self.top_features)
            .collect();
        let max = ranked
            .first()
            .map(|c| c.contribution.abs())
            .unwrap_or(0.0);
        let label_width = ranked.iter().map(|c| c.feature.len()).max().unwrap_or(0);

        let mut out = String::new();
        for contribution in ranked {
            let magnitude = contribution.contribution.abs();
            let len = if max > 0.0 {
                ((magnitude / max) * self.bar_width as f64).round() as usize
            } else {
                0
            };
            let sign = if contribution.contribution >= 0.0 { '+' } else { '-' };
            let _ = writeln!(
                out,
                "  {:<width$} {} {:.4} {}",
                contribution.feature,
                sign,
                magnitude,
                "█".repeat(len),
                width = label_width
            );
        }
        let _ = writeln!(out, "  Impact on churn risk (log-odds), base value {:.4}", explanation.base_value);
        out
    }
}

fn info_cards(profile: &CustomerProfile) -> String {
    format!(
        "Current Tenure: {} Months | Monthly Bill: ${:.2} | Total Value: ${:.2} | Services: {}\n",
        profile.tenure, profile.monthly_charges, profile.total_charges, profile.num_services
    )
}

fn progress_bar(probability: f64, width: usize) -> String {
    let filled = ((probability.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}
