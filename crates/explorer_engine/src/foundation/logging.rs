//! Logging utilities and structured logging support

use std::sync::Once;

pub use log::{debug, error, info, trace, warn};

/// Logger configuration
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "explorer_engine=debug"). When unset, `RUST_LOG` is consulted, then the
/// `info` level is used.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Explicit filter, overrides `RUST_LOG`
    pub env_filter: Option<String>,
}

impl LoggingConfig {
    /// Configuration with an explicit filter string
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
        }
    }
}

static INIT: Once = Once::new();

/// Initialize the logging system with defaults
pub fn init() {
    init_with(LoggingConfig::default());
}

/// Initialize the logging system once; later calls are ignored
pub fn init_with(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        // Another logger may already be installed (tests, embedding apps)
        if builder.try_init().is_err() {
            log::debug!("logger already initialized elsewhere");
        }
    });
}
