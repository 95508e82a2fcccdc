//! Per-step counters shared by concurrent runs.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

/// Accumulated counters for one step.
#[derive(Debug, Default)]
struct Counters {
    success_count: u64,
    error_count: u64,
    cumulative_duration: Duration,
}

/// Lock-protected counters, one slot per registered step.
#[derive(Debug)]
pub(crate) struct MetricsTable {
    slots: Vec<(String, Mutex<Counters>)>,
}

impl MetricsTable {
    pub(crate) fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            slots: names
                .into_iter()
                .map(|name| (name.to_string(), Mutex::new(Counters::default())))
                .collect(),
        }
    }

    pub(crate) fn record_success(&self, position: usize, elapsed: Duration) {
        let mut counters = self.lock(position);
        counters.success_count += 1;
        counters.cumulative_duration += elapsed;
    }

    pub(crate) fn record_error(&self, position: usize) {
        self.lock(position).error_count += 1;
    }

    pub(crate) fn snapshot(&self) -> PipelineMetrics {
        let steps = self
            .slots
            .iter()
            .enumerate()
            .map(|(position, (name, _))| {
                let counters = self.lock(position);
                StepMetrics::from_counts(
                    name.clone(),
                    counters.success_count,
                    counters.error_count,
                    counters.cumulative_duration,
                )
            })
            .collect();
        PipelineMetrics { steps }
    }

    fn lock(&self, position: usize) -> std::sync::MutexGuard<'_, Counters> {
        // Counters stay consistent even if a holder panicked mid-update.
        self.slots[position]
            .1
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Aggregate view of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepMetrics {
    pub name: String,
    pub total_runs: u64,
    pub success_count: u64,
    pub error_count: u64,
    /// `success_count / total_runs`, 0 before the first run.
    pub success_rate: f64,
    /// Mean duration of successful runs in seconds, 0 before the first success.
    pub average_success_duration: f64,
}

impl StepMetrics {
    fn from_counts(name: String, success: u64, error: u64, cumulative: Duration) -> Self {
        let total_runs = success + error;
        let success_rate = if total_runs > 0 {
            success as f64 / total_runs as f64
        } else {
            0.0
        };
        let average_success_duration = if success > 0 {
            cumulative.as_secs_f64() / success as f64
        } else {
            0.0
        };

        Self {
            name,
            total_runs,
            success_count: success,
            error_count: error,
            success_rate,
            average_success_duration,
        }
    }
}

/// Snapshot of all step metrics, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PipelineMetrics {
    steps: Vec<StepMetrics>,
}

impl PipelineMetrics {
    pub fn get(&self, name: &str) -> Option<&StepMetrics> {
        self.steps.iter().find(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepMetrics> {
        self.steps.iter()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_runs_have_zero_rates() {
        let table = MetricsTable::new(["ocr"]);
        let metrics = table.snapshot();
        let ocr = metrics.get("ocr").unwrap();

        assert_eq!(ocr.total_runs, 0);
        assert_eq!(ocr.success_rate, 0.0);
        assert_eq!(ocr.average_success_duration, 0.0);
    }

    #[test]
    fn test_only_successes_count_towards_duration() {
        let table = MetricsTable::new(["ocr", "store"]);
        table.record_success(0, Duration::from_millis(100));
        table.record_success(0, Duration::from_millis(300));
        table.record_error(0);
        table.record_error(1);

        let metrics = table.snapshot();
        let ocr = metrics.get("ocr").unwrap();
        assert_eq!(ocr.total_runs, 3);
        assert_eq!(ocr.success_count, 2);
        assert_eq!(ocr.error_count, 1);
        assert!((ocr.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((ocr.average_success_duration - 0.2).abs() < 1e-9);

        let store = metrics.get("store").unwrap();
        assert_eq!(store.success_rate, 0.0);
        assert_eq!(store.average_success_duration, 0.0);
    }

    #[test]
    fn test_snapshot_keeps_declaration_order() {
        let table = MetricsTable::new(["b", "a", "c"]);
        let names: Vec<_> = table.snapshot().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
