use anyhow::Result;
use homewatch_core::paths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "homewatch.log";

/// Install the global subscriber: daily log file, plus stderr when `foreground`.
///
/// The returned guard flushes the file writer and must live until exit.
pub fn init(verbose: bool, foreground: bool) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(paths::logs_dir()?, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false);
    let stderr_layer = foreground.then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(guard)
}
