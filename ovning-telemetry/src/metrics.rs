//! ## ovning-telemetry::metrics
//! **Prometheus recorder for the session engine**
//!
//! Counters for the session lifecycle plus a duration histogram; the
//! registry is owned here so embedders can scrape `gather_metrics()`.

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub sessions_started: Counter,
    pub sessions_completed: Counter,
    pub triggers_dispatched: Counter,
    pub session_duration: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let sessions_started =
            Counter::new("ovning_sessions_started_total", "Total sessions started").unwrap();
        let sessions_completed = Counter::new(
            "ovning_sessions_completed_total",
            "Total sessions reaching a terminal status",
        )
        .unwrap();
        let triggers_dispatched = Counter::new(
            "ovning_triggers_dispatched_total",
            "Total triggers dispatched (scheduled and injected)",
        )
        .unwrap();

        let session_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ovning_session_duration_seconds",
                "Elapsed (pausable-clock) session duration at stop",
            )
            .buckets(vec![60.0, 300.0, 900.0, 1800.0, 3600.0]),
        )
        .unwrap();

        registry
            .register(Box::new(sessions_started.clone()))
            .unwrap();
        registry
            .register(Box::new(sessions_completed.clone()))
            .unwrap();
        registry
            .register(Box::new(triggers_dispatched.clone()))
            .unwrap();
        registry
            .register(Box::new(session_duration.clone()))
            .unwrap();

        Self {
            registry,
            sessions_started,
            sessions_completed,
            triggers_dispatched,
            session_duration,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathers_registered_counters() {
        let metrics = MetricsRecorder::new();
        metrics.sessions_started.inc();
        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("ovning_sessions_started_total"));
    }
}
