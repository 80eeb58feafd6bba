mod types;

pub use types::{ProbeMetric, ProbeStatus, ResolveMetrics};

use std::time::{Duration, Instant};

use crate::error::{ProbeError, ProbeOutcome};

/// A probe's outcome together with how long it took.
#[derive(Debug)]
pub struct Timed<T> {
    pub outcome: ProbeOutcome<T>,
    pub elapsed: Duration,
}

/// Collects per-probe metrics for a single resolve. Owned by the orchestrator
/// task; probes hand back their `Timed` result instead of writing here.
pub struct MetricsRecorder {
    started: Instant,
    metrics: ResolveMetrics,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            metrics: ResolveMetrics::default(),
        }
    }

    pub fn record<T>(&mut self, probe: &str, timed: &Timed<T>) {
        let (status, detail) = match timed.outcome.error() {
            None => (ProbeStatus::Ok, None),
            Some(err) => {
                let status = if matches!(err, ProbeError::TimedOut { .. }) {
                    ProbeStatus::TimedOut
                } else {
                    ProbeStatus::Failed
                };
                (status, Some(err.to_string()))
            }
        };

        self.metrics.probes.push(ProbeMetric {
            probe: probe.to_string(),
            elapsed_ms: millis(timed.elapsed),
            status,
            detail,
        });
    }

    pub fn tier1(&mut self, elapsed: Duration, strong: bool) {
        self.metrics.tier1_ms = millis(elapsed);
        self.metrics.strong_context = strong;
    }

    pub fn tier2(&mut self, elapsed: Duration) {
        self.metrics.tier2_ms = Some(millis(elapsed));
    }

    pub fn tier3(&mut self, elapsed: Duration) {
        self.metrics.tier3_ms = Some(millis(elapsed));
    }

    pub fn finish(mut self) -> ResolveMetrics {
        self.metrics.total_ms = millis(self.started.elapsed());
        self.metrics
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
