use crate::error::ConfigError;
use crate::settings::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// File name prefix of the daily rolling log files.
pub const LOG_FILE_PREFIX: &str = "trade-journal.log";

/// Parses an `EnvFilter` directive string.
pub fn parse_filter(directive: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(directive).map_err(|e| ConfigError::LoggingError(e.to_string()))
}

/// Installs the global subscriber: stdout always, plus a rolling file when a
/// directory is configured.
///
/// `RUST_LOG` wins over the configured filter. The returned guard flushes the
/// file writer on drop, so the caller must keep it alive until shutdown.
pub fn init_tracing(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&settings.filter)?,
    };

    let (file_layer, guard) = match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    tracing::debug!(directory = ?settings.directory, "Tracing initialised");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_target_directives() {
        assert!(parse_filter("info").is_ok());
        assert!(parse_filter("web_server=debug,info").is_ok());
    }

    #[test]
    fn rejects_unknown_level() {
        let err = parse_filter("web_server=loud").unwrap_err();
        assert!(matches!(err, ConfigError::LoggingError(_)));
    }
}
