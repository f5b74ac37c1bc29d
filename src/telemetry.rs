//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL controls the filter (e.g. "debug" or directives such as
//!   "info,learn=debug,game=debug,community=debug,tower_http=info").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Domain targets: `learn`, `game`, `community`, `forum`, `lumen_backend`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,learn=debug,game=debug,community=debug,forum=debug,lumen_backend=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Choose JSON vs pretty; the two builders have different types.
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => {
            builder.json().init();
        }
        _ => {
            builder.init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_covers_domain_targets() {
        for target in ["learn", "game", "community", "forum", "lumen_backend"] {
            assert!(DEFAULT_FILTER.contains(&format!("{target}=debug")), "{target}");
        }
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
