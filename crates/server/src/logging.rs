// crates/server/src/logging.rs
//! Tracing subscriber setup, called once from `main`.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn directive(raw: &str, fallback: Level) -> Directive {
    raw.parse().unwrap_or_else(|_| fallback.into())
}

/// Build the filter: `RUST_LOG` when set, else `default_level`, with the
/// chatty dependency targets pinned down either way.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level))
        .add_directive(directive("hyper=warn", Level::WARN))
        .add_directive(directive("reqwest=warn", Level::WARN))
        .add_directive(directive("sqlx=warn", Level::WARN))
        .add_directive(directive("tower_http=info", Level::INFO))
}

/// Install the global subscriber. JSON lines when `json` is set, compact
/// human-readable output otherwise.
pub fn init(default_level: &str, json: bool) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(default_level));

    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().compact().with_target(false))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_directive_falls_back() {
        assert_eq!(
            directive("hyper=notalevel", Level::WARN).to_string(),
            "warn"
        );
    }

    #[test]
    fn test_filter_keeps_default_level() {
        // Only meaningful when RUST_LOG is unset in the test environment.
        if std::env::var("RUST_LOG").is_err() {
            let filter = env_filter("debug").to_string();
            assert!(filter.contains("debug"));
            assert!(filter.contains("hyper=warn"));
        }
    }
}
