//! ## ovning-telemetry::logging
//! **Structured logging with tracing**
//!
//! One init call at process start; everything else is plain `tracing`
//! macros at the call sites.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
    pub fn init(default_level: &str) {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_level.to_string())),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::ENTER)
            .init()
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logging() {
        tracing::info!(session_id = "ses_1", "Session dispatched");
        assert!(logs_contain("Session dispatched"));
    }
}
