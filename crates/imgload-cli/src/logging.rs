//! Tracing subscriber setup

use std::io;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSettings {
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// `-v` count: 0 = info, 1 = debug, 2+ = trace
    pub verbosity: u8,
}

impl LogSettings {
    /// Filter directive used when `RUST_LOG` is unset
    #[must_use]
    pub fn default_directive(&self) -> String {
        let level = match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        format!("warn,imgload_core={level},imgload_transcode={level},imgload_remote={level},imgload_cli={level}")
    }
}

/// Install the global subscriber; logs go to stderr so stdout stays JSON
///
/// # Errors
///
/// Fails if the filter is malformed or a subscriber is already installed.
pub fn init_tracing(settings: LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings.default_directive()))?;
    let registry = tracing_subscriber::registry().with(filter);

    if settings.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stderr),
            )
            .try_init()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert!(LogSettings::default().default_directive().contains("imgload_core=info"));
        let debug = LogSettings { json: false, verbosity: 1 };
        assert!(debug.default_directive().contains("imgload_cli=debug"));
        let trace = LogSettings { json: true, verbosity: 4 };
        assert!(trace.default_directive().contains("imgload_remote=trace"));
    }
}
