//! Log sink that can be muted while the fee editor owns the terminal.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn,msgcheck_wallet=info";

static STDERR_ENABLED: AtomicBool = AtomicBool::new(true);

pub fn set_stderr_enabled(enabled: bool) {
    STDERR_ENABLED.store(enabled, Ordering::SeqCst);
}

fn writer() -> Box<dyn Write> {
    if STDERR_ENABLED.load(Ordering::SeqCst) {
        Box::new(io::stderr())
    } else {
        Box::new(io::sink())
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .init();
}
