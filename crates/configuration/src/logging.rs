use crate::error::ConfigError;
use crate::settings::Logging;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber.
///
/// Events go to stdout and to a daily-rolling file under
/// `settings.directory`. `RUST_LOG` overrides `settings.level` when set.
/// The returned guard flushes the file writer on drop, so the caller must
/// hold it for the lifetime of the process.
pub fn init_tracing(settings: &Logging) -> Result<WorkerGuard, ConfigError> {
    let file_appender =
        tracing_appender::rolling::daily(&settings.directory, &settings.file_prefix);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)
            .map_err(|e| ConfigError::Logging(e.to_string()))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    Ok(guard)
}
