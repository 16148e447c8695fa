use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "reviewdesk.log";

/// Initialize tracing to a daily-rolling file under `log_dir`.
///
/// The terminal belongs to the UI, so nothing is written to stdout. Default
/// level is INFO (DEBUG with `verbose`), override via RUST_LOG. The returned
/// guard must live until exit or buffered lines are lost.
pub fn init(log_dir: &Path, verbose: bool) -> std::io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let default_level = if verbose {
        "info,reviewdesk=debug"
    } else {
        "info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::debug!(dir = %log_dir.display(), "Tracing initialized");
    Ok(guard)
}
