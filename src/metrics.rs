//! Session statistics for the churn dashboard.

use crate::types::report::RiskLabel;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Counters and latency samples collected over one dashboard session
pub struct SessionMetrics {
    /// Analyses that produced a probability
    pub analyses_run: AtomicU64,
    /// Analyses labelled high risk
    pub high_risk: AtomicU64,
    /// Requests aborted by a prediction error
    pub prediction_failures: AtomicU64,
    /// Explanations that failed after a successful prediction
    pub explanation_failures: AtomicU64,
    /// Profiles rejected by the input layer
    pub rejected_inputs: AtomicU64,
    /// Analysis times (in microseconds)
    analysis_times: RwLock<Vec<u64>>,
    /// Probability distribution buckets
    probability_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            analyses_run: AtomicU64::new(0),
            high_risk: AtomicU64::new(0),
            prediction_failures: AtomicU64::new(0),
            explanation_failures: AtomicU64::new(0),
            rejected_inputs: AtomicU64::new(0),
            analysis_times: RwLock::new(Vec::with_capacity(256)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a completed analysis
    pub fn record_analysis(&self, elapsed: Duration, probability: f64, label: RiskLabel) {
        self.analyses_run.fetch_add(1, Ordering::Relaxed);
        if label.is_high() {
            self.high_risk.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.analysis_times.write() {
            times.push(elapsed.as_micros() as u64);
            // Keep only the most recent samples
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (probability * 10.0).clamp(0.0, 9.0) as usize;
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    pub fn record_prediction_failure(&self) {
        self.prediction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_explanation_failure(&self) {
        self.explanation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_input(&self) {
        self.rejected_inputs.fetch_add(1, Ordering::Relaxed);
    }

    /// Analysis time statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let times = match self.analysis_times.read() {
            Ok(times) => times.clone(),
            Err(_) => return LatencyStats::default(),
        };
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = times;
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Share of analyses labelled high risk
    pub fn high_risk_rate(&self) -> f64 {
        let total = self.analyses_run.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        self.high_risk.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let analyses = self.analyses_run.load(Ordering::Relaxed);
        let latency = self.get_latency_stats();
        let distribution = self.get_probability_distribution();

        info!("╔{}╗", "═".repeat(SUMMARY_WIDTH));
        info!("{}", summary_row("             CHURNGUARD SESSION - METRICS SUMMARY"));
        info!("╠{}╣", "═".repeat(SUMMARY_WIDTH));
        info!(
            "{}",
            summary_row(&format!(
                "Analyses Run:     {:>8}  │  Session: {:>8.1}s",
                analyses,
                self.start_time.elapsed().as_secs_f64()
            ))
        );
        info!(
            "{}",
            summary_row(&format!(
                "High Risk:        {:>8}  │  Rate: {:>6.1}%",
                self.high_risk.load(Ordering::Relaxed),
                self.high_risk_rate() * 100.0
            ))
        );
        info!(
            "{}",
            summary_row(&format!(
                "Failures: prediction={} explanation={} rejected_input={}",
                self.prediction_failures.load(Ordering::Relaxed),
                self.explanation_failures.load(Ordering::Relaxed),
                self.rejected_inputs.load(Ordering::Relaxed)
            ))
        );
        info!("╠{}╣", "═".repeat(SUMMARY_WIDTH));
        info!(
            "{}",
            summary_row(&format!(
                "Analysis Time (μs): mean={} p50={} p95={} max={}",
                latency.mean_us, latency.p50_us, latency.p95_us, latency.max_us
            ))
        );
        info!("╠{}╣", "═".repeat(SUMMARY_WIDTH));
        info!("{}", summary_row("Churn Probability Distribution:"));
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 5.0) as usize).min(20));
            info!(
                "{}",
                summary_row(&format!(
                    "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                    i as f64 / 10.0,
                    (i + 1) as f64 / 10.0,
                    count,
                    pct,
                    bar
                ))
            );
        }
        info!("╚{}╝", "═".repeat(SUMMARY_WIDTH));
    }
}

/// Inner width of the summary box
const SUMMARY_WIDTH: usize = 62;

/// One boxed summary line, padded to the box width
fn summary_row(content: &str) -> String {
    let used = content.chars().count() + 1;
    let padding = SUMMARY_WIDTH.saturating_sub(used);
    format!("║ {}{}║", content, " ".repeat(padding))
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Analysis time statistics
#[derive(Debug, Default)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub max_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = SessionMetrics::new();

        metrics.record_analysis(Duration::from_micros(100), 0.73, RiskLabel::High);
        metrics.record_analysis(Duration::from_micros(300), 0.12, RiskLabel::Low);
        metrics.record_explanation_failure();
        metrics.record_rejected_input();

        assert_eq!(metrics.analyses_run.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.high_risk.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.explanation_failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.rejected_inputs.load(Ordering::Relaxed), 1);
        assert!((metrics.high_risk_rate() - 0.5).abs() < 1e-12);

        let latency = metrics.get_latency_stats();
        assert_eq!(latency.count, 2);
        assert_eq!(latency.mean_us, 200);
        assert_eq!(latency.max_us, 300);
    }

    #[test]
    fn test_probability_buckets() {
        let metrics = SessionMetrics::new();
        metrics.record_analysis(Duration::from_micros(10), 0.0, RiskLabel::Low);
        metrics.record_analysis(Duration::from_micros(10), 0.73, RiskLabel::High);
        metrics.record_analysis(Duration::from_micros(10), 1.0, RiskLabel::High);

        let distribution = metrics.get_probability_distribution();
        assert_eq!(distribution[0], 1);
        assert_eq!(distribution[7], 1);
        assert_eq!(distribution[9], 1);
    }

    #[test]
    fn test_summary_rows_share_width() {
        let rows = [
            summary_row("Analyses Run:            2"),
            summary_row("Analysis Time (μs): mean=200 p50=300 p95=300 max=300"),
            summary_row(&format!("  0.7-0.8: {:>6} ({:>5.1}%) {}", 1, 50.0, "█".repeat(10))),
        ];
        for row in &rows {
            assert_eq!(row.chars().count(), SUMMARY_WIDTH + 2);
            assert!(row.starts_with('║') && row.ends_with('║'));
        }
    }

    #[test]
    fn test_empty_session() {
        let metrics = SessionMetrics::new();
        assert_eq!(metrics.get_latency_stats().count, 0);
        assert_eq!(metrics.high_risk_rate(), 0.0);
    }
}
