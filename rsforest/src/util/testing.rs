//! Tracing for tests
//!
//! Honors `RUST_LOG`; otherwise this crate logs at trace level while the
//! `config` crate is kept quiet.

use std::sync::Once;

use tracing::debug;
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

static INIT: Once = Once::new();

const DEFAULT_FILTER: &str = "rsforest=trace,config=warn";

/// Install the test subscriber once per process. Later calls do nothing.
pub fn init_test_setup() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let layer = tracing_subscriber::fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(filter);

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            eprintln!("tracing subscriber already installed, keeping it");
        }
        debug!("test tracing ready");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_repeated_calls_when_initializing_then_installs_once() {
        init_test_setup();
        init_test_setup();
        assert!(INIT.is_completed());
    }
}
