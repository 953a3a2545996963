//! qsnap: question snapshot augmenter
//!
//! Finds question blocks in a host document, attaches capture controls to
//! them, and turns clicks into redacted PNG captures that go to the
//! clipboard or the local question library.

mod augmenter;

pub use augmenter::{Augmenter, AugmenterBuilder};

pub use qsnap_config as config;
pub use qsnap_core as core;
pub use qsnap_discovery as discovery;
pub use qsnap_engine as engine;
pub use qsnap_redact as redact;
pub use qsnap_sinks as sinks;

/// Install the `fmt` subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Fails if a global subscriber is already set.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}
