// ============================================
// TIMING UTILITY
// ============================================
// Usage:
//   let timer = Timer::start("scan"); ... timer.stop();
//   let mut agg = AggregateTimer::new("tickers"); agg.record(d); agg.summary();
// ============================================

use std::time::{Duration, Instant};
use tracing::info;

/// Wall-clock timer that reports through tracing when stopped
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and log the result
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        info!(
            operation = %self.name,
            elapsed_ms = duration.as_millis() as u64,
            "{} {}",
            Self::speed_label(duration),
            self.name
        );
        duration
    }

    fn speed_label(duration: Duration) -> &'static str {
        match duration.as_millis() {
            0..=500 => "fast",
            501..=5000 => "ok",
            5001..=30000 => "slow",
            _ => "very slow",
        }
    }
}

/// Aggregate timer for a batch of similar operations
pub struct AggregateTimer {
    name: String,
    count: usize,
    total_duration: Duration,
    min_duration: Option<Duration>,
    max_duration: Option<Duration>,
}

impl AggregateTimer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count: 0,
            total_duration: Duration::ZERO,
            min_duration: None,
            max_duration: None,
        }
    }

    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.min_duration = Some(self.min_duration.map_or(duration, |min| min.min(duration)));
        self.max_duration = Some(self.max_duration.map_or(duration, |max| max.max(duration)));
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn avg_duration(&self) -> Option<Duration> {
        if self.count == 0 {
            None
        } else {
            Some(self.total_duration / self.count as u32)
        }
    }

    /// Log summary statistics
    pub fn summary(&self) {
        let Some(avg) = self.avg_duration() else {
            info!(operation = %self.name, "no operations recorded");
            return;
        };

        info!(
            operation = %self.name,
            count = self.count,
            total_ms = self.total_duration.as_millis() as u64,
            avg_ms = avg.as_millis() as u64,
            min_ms = self.min_duration.unwrap_or_default().as_millis() as u64,
            max_ms = self.max_duration.unwrap_or_default().as_millis() as u64,
            "timing summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_timer() {
        let mut agg = AggregateTimer::new("tickers");
        assert!(agg.avg_duration().is_none());

        agg.record(Duration::from_millis(100));
        agg.record(Duration::from_millis(300));

        assert_eq!(agg.count(), 2);
        assert_eq!(agg.avg_duration(), Some(Duration::from_millis(200)));
        assert_eq!(agg.min_duration, Some(Duration::from_millis(100)));
        assert_eq!(agg.max_duration, Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_speed_label() {
        assert_eq!(Timer::speed_label(Duration::from_millis(10)), "fast");
        assert_eq!(Timer::speed_label(Duration::from_secs(60)), "very slow");
    }
}
