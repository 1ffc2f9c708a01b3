//! Tracing setup
//!
//! The pipeline only emits `tracing` events. Whatever subscriber the host
//! installs is the log sink; nothing in the pipeline depends on one existing.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `warn`)
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::warn!("still logging after double init");
    }
}
