//! Per-worker timing log. Each worker owns one, so concurrent workers never interleave
//! entries.

use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TimingLog {
    started: Instant,
    label: String,
    entries: Vec<String>,
}

impl TimingLog {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            started: Instant::now(),
            label: label.into(),
            entries: Vec::new(),
        }
    }

    /// Append a timestamped entry: `[HH:MM:SS.mmm] +  1.23s - event`
    pub fn record(&mut self, event: impl AsRef<str>) {
        let event = event.as_ref();
        let elapsed = self.started.elapsed().as_secs_f64();
        let entry = format!(
            "[{}] +{:6.2}s - {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            elapsed,
            event
        );
        debug!(worker = %self.label, "{}", entry);
        self.entries.push(entry);
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}
