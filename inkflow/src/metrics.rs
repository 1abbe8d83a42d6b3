use std::collections::VecDeque;

use serde::Serialize;

use crate::utils::now_epoch_ms;

const DEFAULT_WINDOW_SIZE: usize = 128;
const RECOGNITION_P95_TARGET_MS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub samples: usize,
    pub average_ms: u64,
    pub p95_ms: u64,
    pub max_ms: u64,
}

impl MetricSummary {
    fn empty() -> Self {
        Self {
            samples: 0,
            average_ms: 0,
            p95_ms: 0,
            max_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub generated_at_ms: u64,
    pub recognition: MetricSummary,
    pub download: MetricSummary,
    pub recognitions: u64,
    pub recognition_failures: u64,
    pub stale_results_dropped: u64,
    pub warnings: Vec<String>,
}

/// Last `capacity` latency samples with a running total.
#[derive(Debug)]
struct LatencyWindow {
    samples: VecDeque<u64>,
    capacity: usize,
    total_ms: u64,
}

impl LatencyWindow {
    fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            total_ms: 0,
        }
    }

    fn push(&mut self, latency_ms: u64) {
        while self.samples.len() >= self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                self.total_ms -= evicted;
            }
        }
        self.samples.push_back(latency_ms);
        self.total_ms += latency_ms;
    }

    /// Nearest-rank percentile over the current window.
    fn percentile(&self, percent: usize) -> Option<u64> {
        let count = self.samples.len();
        if count == 0 {
            return None;
        }
        let rank = (count * percent).div_ceil(100).clamp(1, count);
        let mut scratch: Vec<u64> = self.samples.iter().copied().collect();
        let (_, value, _) = scratch.select_nth_unstable(rank - 1);
        Some(*value)
    }

    fn summary(&self) -> MetricSummary {
        let samples = self.samples.len();
        if samples == 0 {
            return MetricSummary::empty();
        }
        MetricSummary {
            samples,
            average_ms: self.total_ms / samples as u64,
            p95_ms: self.percentile(95).unwrap_or(0),
            max_ms: self.samples.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Latency windows and counters for the recognition pipeline.
#[derive(Debug)]
pub struct RuntimeMetrics {
    recognition_ms: LatencyWindow,
    download_ms: LatencyWindow,
    recognitions: u64,
    recognition_failures: u64,
    stale_results_dropped: u64,
}

impl RuntimeMetrics {
    pub fn new() -> Self {
        Self {
            recognition_ms: LatencyWindow::new(DEFAULT_WINDOW_SIZE),
            download_ms: LatencyWindow::new(DEFAULT_WINDOW_SIZE),
            recognitions: 0,
            recognition_failures: 0,
            stale_results_dropped: 0,
        }
    }

    pub fn record_recognition(&mut self, latency_ms: u64) {
        self.recognition_ms.push(latency_ms);
        self.recognitions += 1;
    }

    pub fn record_recognition_failure(&mut self) {
        self.recognition_failures += 1;
    }

    pub fn record_download(&mut self, latency_ms: u64) {
        self.download_ms.push(latency_ms);
    }

    pub fn record_stale_drop(&mut self) {
        self.stale_results_dropped += 1;
    }

    pub fn report(&self) -> PerformanceReport {
        let recognition = self.recognition_ms.summary();
        let download = self.download_ms.summary();

        let mut warnings = Vec::new();
        if self.stale_results_dropped > 0 {
            warnings.push(format!(
                "Dropped {} recognition results issued before a language switch.",
                self.stale_results_dropped
            ));
        }
        if self.recognition_failures > 0 {
            warnings.push(format!(
                "{} recognition requests failed.",
                self.recognition_failures
            ));
        }
        if recognition.samples > 0 && recognition.p95_ms > RECOGNITION_P95_TARGET_MS {
            warnings.push(format!(
                "Recognition P95 latency {}ms exceeded target {}ms.",
                recognition.p95_ms, RECOGNITION_P95_TARGET_MS
            ));
        }

        PerformanceReport {
            generated_at_ms: now_epoch_ms(),
            recognition,
            download,
            recognitions: self.recognitions,
            recognition_failures: self.recognition_failures,
            stale_results_dropped: self.stale_results_dropped,
            warnings,
        }
    }
}

impl Default for RuntimeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
