use std::sync::Mutex;

/// Run-level counters shared between the CLI and the HTTP bridge.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batches: usize,
    pub candidates: usize,
    pub rejected: usize,
}

#[derive(Default)]
struct Metrics {
    batches: usize,
    candidates: usize,
    rejected: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    /// Records a batch that made it through classification.
    pub fn record_batch(&self, candidates: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.batches += 1;
            metrics.candidates += candidates;
        }
    }

    /// Records a batch that failed validation or configuration checks.
    pub fn record_rejected(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rejected += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            MetricsSnapshot {
                batches: metrics.batches,
                candidates: metrics.candidates,
                rejected: metrics.rejected,
            }
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_across_batches() {
        let metrics = MetricsRecorder::new();
        metrics.record_batch(10);
        metrics.record_batch(0);
        metrics.record_rejected();
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                batches: 2,
                candidates: 10,
                rejected: 1,
            }
        );
    }
}
