//! Diagnostics for debugging a run.
//!
//! Everything goes to stderr so stdout only carries the one-line summary of
//! the command. The filter comes from `RUST_LOG` and defaults to `warn`.
//!
//! ```bash
//! RUST_LOG=runmd=debug runmd notes.md
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Later calls are ignored.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
