//! Explicit timing context passed to the stages that want to be measured.
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::info;

/// Labelled durations in recording order. Repeated labels accumulate.
#[derive(Debug, Default)]
pub struct Timings {
    entries: Mutex<Vec<(String, Duration)>>,
}

impl Timings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing `label`; the elapsed time is recorded when the guard drops.
    pub fn scope(&self, label: impl Into<String>) -> TimingScope<'_> {
        TimingScope {
            timings: self,
            label: label.into(),
            start: Instant::now(),
            recorded: false,
        }
    }

    pub fn record(&self, label: &str, elapsed: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|(name, _)| name == label) {
            Some((_, total)) => *total += elapsed,
            None => entries.push((label.to_string(), elapsed)),
        }
    }

    pub fn get(&self, label: &str) -> Option<Duration> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, elapsed)| *elapsed)
    }

    pub fn total(&self) -> Duration {
        self.entries().iter().map(|(_, elapsed)| *elapsed).sum()
    }

    pub fn entries(&self) -> Vec<(String, Duration)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn log_summary(&self) {
        for (label, elapsed) in self.entries() {
            info!(stage = %label, seconds = elapsed.as_secs_f64(), "timing");
        }
        info!(seconds = self.total().as_secs_f64(), "total time");
    }
}

/// Guard returned by [`Timings::scope`].
pub struct TimingScope<'a> {
    timings: &'a Timings,
    label: String,
    start: Instant,
    recorded: bool,
}

impl TimingScope<'_> {
    /// Records now and returns the elapsed time.
    pub fn stop(mut self) -> Duration {
        self.finish()
    }

    fn finish(&mut self) -> Duration {
        let elapsed = self.start.elapsed();
        if !self.recorded {
            self.timings.record(&self.label, elapsed);
            self.recorded = true;
        }
        elapsed
    }
}

impl Drop for TimingScope<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::Timings;
    use std::time::Duration;

    #[test]
    fn scopes_record_on_drop() {
        let timings = Timings::new();
        {
            let _scope = timings.scope("load");
            std::thread::sleep(Duration::from_millis(2));
        }
        let load = timings.get("load").expect("load recorded");
        assert!(load >= Duration::from_millis(2), "recorded {load:?}");
    }

    #[test]
    fn stop_records_exactly_once() {
        let timings = Timings::new();
        let elapsed = timings.scope("march").stop();
        assert_eq!(timings.entries().len(), 1);
        assert_eq!(timings.get("march"), Some(elapsed));
    }

    #[test]
    fn repeated_labels_accumulate_in_order() {
        let timings = Timings::new();
        timings.record("a", Duration::from_millis(5));
        timings.record("b", Duration::from_millis(1));
        timings.record("a", Duration::from_millis(5));
        let entries = timings.entries();
        assert_eq!(entries[0], ("a".to_string(), Duration::from_millis(10)));
        assert_eq!(entries[1].0, "b");
        assert_eq!(timings.total(), Duration::from_millis(11));
        assert_eq!(timings.get("missing"), None);
    }
}
