//! Logging for tests.

use std::sync::Once;

use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

static TRACING: Once = Once::new();

/// Sends arena tracing output through the test harness, once per test binary.
///
/// `RUST_LOG` picks what is shown, e.g. `RUST_LOG=rsmodel=trace` for every
/// move. Without it only warnings are printed.
pub fn init_test_setup() {
    TRACING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rsmodel=warn"));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_span_events(FmtSpan::CLOSE)
            .try_init();
        if let Err(e) = installed {
            eprintln!("tracing subscriber not installed: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup_is_repeatable() {
        init_test_setup();
        init_test_setup();
        assert!(TRACING.is_completed());
    }
}
