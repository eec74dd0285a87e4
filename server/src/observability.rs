//! tracing-subscriber initialization.
//!
//! A registry with an `EnvFilter` and one `fmt` layer: JSON lines by default,
//! the human-readable formatter when `LOG_FORMAT=pretty`.

use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, Registry};

/// Filter used when neither `RUST_LOG` nor `LOG_LEVEL` is set.
pub const DEFAULT_FILTER: &str = "folio_server=debug,tower_http=debug";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    /// `pretty` (any case) selects [`LogFormat::Pretty`]; anything else is JSON.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("pretty") => Self::Pretty,
            _ => Self::Json,
        }
    }
}

/// Build the filter: `RUST_LOG` wins, then `level`, then [`DEFAULT_FILTER`].
fn filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(level.filter(|l| !l.trim().is_empty()).unwrap_or(DEFAULT_FILTER))
    })
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(format: LogFormat, level: Option<&str>) {
    let registry = Registry::default().with(filter(level));
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}
