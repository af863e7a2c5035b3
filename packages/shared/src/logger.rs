//! Logging setup utilities for the stmsh binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default `EnvFilter` directive string for the given targets.
///
/// Every target gets the same level, e.g. `stmsh_server=debug,stmsh_shared=debug`.
/// Dashes in target names are replaced with underscores to match module paths.
pub fn default_directives(targets: &[&str], default_log_level: &str) -> String {
    targets
        .iter()
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `targets` - Crate or binary names to enable (e.g. `["stmsh-server", "stmsh-shared"]`)
/// * `default_log_level` - The default log level (e.g. "debug", "info", "warn")
///
/// # Examples
///
/// ```no_run
/// use stmsh_shared::logger::setup_logger;
///
/// setup_logger(&["stmsh-server", "stmsh-shared"], "debug");
/// ```
pub fn setup_logger(targets: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(targets, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
