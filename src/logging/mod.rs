/*!
 * Logging Module
 * Console and rolling-file tracing output, plus the per-request middleware
 */
pub mod middleware;

use std::io;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, registry::Registry, util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::AppConfig;

const LOG_DIR: &str = "logs";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Filter used when `RUST_LOG` is unset.
fn default_directives(level: &str) -> String {
    format!(
        "blogging_backend={},tower_http=debug,axum=debug,sqlx=warn",
        level
    )
}

/// Human-readable output for development, JSON lines for production.
fn output_layers(
    json: bool,
    file_writer: non_blocking::NonBlocking,
    console_writer: non_blocking::NonBlocking,
) -> Vec<BoxedLayer> {
    if json {
        vec![
            fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .boxed(),
            fmt::layer()
                .json()
                .with_writer(console_writer)
                .with_target(false)
                .boxed(),
        ]
    } else {
        vec![
            fmt::layer()
                .with_writer(file_writer)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .boxed(),
            fmt::layer().with_writer(console_writer).pretty().boxed(),
        ]
    }
}

/// Install the global subscriber.
///
/// Writes to stdout, `logs/app.log` and (errors only) `logs/error.log`, the
/// files rolling daily. The returned guards flush the background writers when
/// dropped, so the caller holds them for the lifetime of the process.
pub fn init(config: &AppConfig) -> Vec<WorkerGuard> {
    std::fs::create_dir_all(LOG_DIR).ok();

    let (file_writer, file_guard) = non_blocking(rolling::daily(LOG_DIR, "app.log"));
    let (error_writer, error_guard) = non_blocking(rolling::daily(LOG_DIR, "error.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let error_layer = fmt::layer()
        .json()
        .with_writer(error_writer)
        .with_file(true)
        .with_line_number(true)
        .with_filter(LevelFilter::ERROR)
        .boxed();

    let mut layers = output_layers(config.is_production(), file_writer, console_writer);
    layers.push(error_layer);

    // try_init: a second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init();

    tracing::info!(
        environment = %config.environment,
        level = %config.log_level,
        "logging initialized"
    );

    vec![file_guard, error_guard, console_guard]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_scope_crate_level() {
        let directives = default_directives("warn");
        assert!(directives.starts_with("blogging_backend=warn"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
