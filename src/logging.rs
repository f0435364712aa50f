//! Logging bootstrap.
//!
//! Installs a `tracing-subscriber` fmt layer on stderr.  `RUST_LOG` wins when
//! set; otherwise the level is `info`, or `debug` with `--verbose`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.  Call once, before anything logs.
pub fn init(verbose: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{}={default_level},warn", env!("CARGO_CRATE_NAME")))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
}
