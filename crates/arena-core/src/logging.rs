//! Structured logging with `tracing`.
//!
//! Components and the dispatch engine log through `tracing` macros with
//! structured fields (`event`, `client_id`, `component`). The binary that
//! embeds the engine calls [`init_subscriber`] once at startup.

use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor settings provide one.
pub const DEFAULT_LEVEL: &str = "debug";

/// Initialize the global tracing subscriber with stdout output.
///
/// `RUST_LOG` takes precedence over `level`. Call once at application
/// startup; subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stdout)
        .compact();

    // set_global_default fails if a subscriber is already installed
    let _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_subscriber_does_not_panic() {
        init_subscriber(DEFAULT_LEVEL);
        init_subscriber("warn");
    }
}
