use std::path::PathBuf;

use once_cell::sync::OnceCell;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::error::{AppError, AppResult};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();
static LOGGER_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

pub const DEFAULT_LOG_DIRECTIVES: &str = "info,app::scheduler=debug,app::config=info";
const LOG_FILE_PREFIX: &str = "cognical-slots.log";

#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// When set, a daily-rolling log file is written here next to console output.
    pub log_dir: Option<PathBuf>,
    /// Used when `RUST_LOG` is unset or unparsable.
    pub default_directives: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            log_dir: None,
            default_directives: DEFAULT_LOG_DIRECTIVES.to_string(),
        }
    }
}

impl LoggingOptions {
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(options: &LoggingOptions) -> AppResult<()> {
    LOGGER_INIT
        .get_or_try_init(|| {
            let env_filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&options.default_directives))
                .map_err(|err| AppError::config(format!("invalid log directives: {err}")))?;

            let file_layer = match &options.log_dir {
                Some(dir) => {
                    std::fs::create_dir_all(dir)?;
                    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
                    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                    LOGGER_GUARD
                        .set(guard)
                        .map_err(|_| AppError::other("logger already initialised"))?;
                    Some(
                        fmt::layer()
                            .with_writer(non_blocking)
                            .with_ansi(false)
                            .with_target(true)
                            .with_timer(UtcTime::rfc_3339())
                            .boxed(),
                    )
                }
                None => None,
            };

            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .try_init()
                .map_err(|err| AppError::other(format!("failed to install subscriber: {err}")))?;

            Ok(())
        })
        .map(|_| ())
}
