//! Session counters for transaction checks

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::info;

/// Metrics collector for one session
#[derive(Debug, Default)]
pub struct CheckMetrics {
    pub checks: AtomicU64,
    pub verified: AtomicU64,
    pub lockouts: AtomicU64,
    pub fraud_alerts: AtomicU64,
    pub legitimate: AtomicU64,
    /// Requests that ended in an error
    pub failures: AtomicU64,
    /// Prediction latencies per model (in microseconds)
    prediction_times: RwLock<HashMap<String, Vec<u64>>>,
}

impl CheckMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_check(&self) {
        self.checks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_verified(&self) {
        self.verified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lockout(&self) {
        self.lockouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fraud_alert(&self) {
        self.fraud_alerts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_legitimate(&self) {
        self.legitimate.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prediction(&self, model: &str, latency: Duration) {
        if let Ok(mut times) = self.prediction_times.write() {
            times
                .entry(model.to_string())
                .or_default()
                .push(latency.as_micros() as u64);
        }
    }

    /// Mean prediction latency per model, in microseconds
    pub fn mean_prediction_us(&self) -> HashMap<String, u64> {
        let Ok(times) = self.prediction_times.read() else {
            return HashMap::new();
        };
        times
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(model, samples)| {
                (
                    model.clone(),
                    samples.iter().sum::<u64>() / samples.len() as u64,
                )
            })
            .collect()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        info!("╔══════════════════════════════════════════════╗");
        info!("║        TRANSACTION SCREENING - SUMMARY       ║");
        info!("╠══════════════════════════════════════════════╣");
        info!("║ Checks:        {:>6}                        ║", load(&self.checks));
        info!("║ Verified:      {:>6}                        ║", load(&self.verified));
        info!("║ Lockouts:      {:>6}                        ║", load(&self.lockouts));
        info!("║ Fraud alerts:  {:>6}                        ║", load(&self.fraud_alerts));
        info!("║ Legitimate:    {:>6}                        ║", load(&self.legitimate));
        info!("║ Failed:        {:>6}                        ║", load(&self.failures));
        info!("╚══════════════════════════════════════════════╝");

        let mut latencies: Vec<(String, u64)> = self.mean_prediction_us().into_iter().collect();
        latencies.sort();
        for (model, mean_us) in latencies {
            info!("  {}: mean prediction {} μs", model, mean_us);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = CheckMetrics::new();
        metrics.record_check();
        metrics.record_check();
        metrics.record_lockout();
        metrics.record_verified();
        metrics.record_fraud_alert();

        assert_eq!(metrics.checks.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.lockouts.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.fraud_alerts.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.legitimate.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_mean_prediction_latency() {
        let metrics = CheckMetrics::new();
        metrics.record_prediction("SVM", Duration::from_micros(100));
        metrics.record_prediction("SVM", Duration::from_micros(300));

        assert_eq!(metrics.mean_prediction_us().get("SVM"), Some(&200));
    }
}
