//! Logging setup utilities.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose log output is enabled by default alongside the binary.
const DEFAULT_TARGETS: &[&str] = &["tefuda_server", "tefuda_shared", "tower_http"];

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "tefuda-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use tefuda_shared::logger::setup_logger;
///
/// setup_logger("tefuda-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the `EnvFilter` directive used when `RUST_LOG` is not set.
///
/// Each target appears once, even when the binary shares its crate's name.
fn default_directive(binary_name: &str, default_log_level: &str) -> String {
    let mut targets: Vec<String> = Vec::new();
    for target in DEFAULT_TARGETS
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
    {
        let target = target.replace('-', "_");
        if !targets.contains(&target) {
            targets.push(target);
        }
    }

    targets
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}
