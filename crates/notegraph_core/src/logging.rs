//! File logging for graph loads and search runs.
//!
//! Events are single `key=value` lines carrying ids, counts and durations.
//! Query text and note content never reach the log. The panic hook follows
//! the same rule and records only where the panic happened.
//!
//! # Invariants
//! - The logger starts at most once per process.
//! - Starting again with an equal [`LogConfig`] is a no-op; any other config
//!   is rejected.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, LogSpecification, Logger, LoggerHandle,
    Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Directory receiving log files. Logging stays off when unset.
pub const LOG_DIR_ENV: &str = "NOTEGRAPH_LOG_DIR";
/// Overrides [`default_log_level`].
pub const LOG_LEVEL_ENV: &str = "NOTEGRAPH_LOG_LEVEL";

const LOG_FILE_BASENAME: &str = "notegraph";
const ROTATE_AT_BYTES: u64 = 8 * 1024 * 1024;
const KEPT_LOG_FILES: usize = 3;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    config: LogConfig,
    _handle: LoggerHandle,
}

/// Validated logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// Absolute directory; created on start when missing.
    pub log_dir: PathBuf,
}

impl LogConfig {
    /// Parses a level name (`trace`..`error`, `warning` accepted) and an
    /// absolute directory.
    pub fn new(level: &str, log_dir: &str) -> Result<Self, LoggingError> {
        Ok(Self {
            level: parse_level(level)?,
            log_dir: parse_log_dir(log_dir)?,
        })
    }

    /// Reads [`LOG_DIR_ENV`] and [`LOG_LEVEL_ENV`].
    ///
    /// Returns `Ok(None)` when no log directory is configured.
    pub fn from_env() -> Result<Option<Self>, LoggingError> {
        let Ok(log_dir) = env::var(LOG_DIR_ENV) else {
            return Ok(None);
        };
        let level = env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
        Self::new(&level, &log_dir).map(Some)
    }
}

/// Logging setup failure.
#[derive(Debug)]
pub enum LoggingError {
    InvalidLevel(String),
    /// Directory is blank or relative.
    InvalidLogDir(String),
    CreateLogDir {
        log_dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// The process logger already runs with another config.
    AlreadyStarted {
        active: LogConfig,
        requested: LogConfig,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidLogDir(log_dir) => {
                write!(f, "log directory must be an absolute path, got `{log_dir}`")
            }
            Self::CreateLogDir { log_dir, source } => write!(
                f,
                "failed to create log directory `{}`: {source}",
                log_dir.display()
            ),
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyStarted { active, requested } => write!(
                f,
                "logging already runs at {} in `{}`; cannot switch to {} in `{}`",
                active.level,
                active.log_dir.display(),
                requested.level,
                requested.log_dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateLogDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Starts rolling file logs for the process.
///
/// # Errors
/// - `CreateLogDir` or `Backend` when the logger cannot start.
/// - `AlreadyStarted` when a different config is already active.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let active = ACTIVE.get_or_try_init(|| start(config))?;
    if active.config != *config {
        return Err(LoggingError::AlreadyStarted {
            active: active.config.clone(),
            requested: config.clone(),
        });
    }
    Ok(())
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start(config: &LogConfig) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&config.log_dir).map_err(|source| LoggingError::CreateLogDir {
        log_dir: config.log_dir.clone(),
        source,
    })?;

    let handle = Logger::with(LogSpecification::builder().default(config.level).build())
        .log_to_file(
            FileSpec::default()
                .directory(config.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEPT_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(LoggingError::Backend)?;

    install_panic_hook();
    info!(
        "event=logging_init module=logging status=ok level={} version={}",
        config.level,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        config: config.clone(),
        _handle: handle,
    })
}

/// Panic messages may quote titles or query text; only the location is kept.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!("event=panic module=logging status=error location={location}");
        previous(info);
    }));
}

fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    let trimmed = level.trim();
    let name = if trimmed.eq_ignore_ascii_case("warning") {
        "warn"
    } else {
        trimmed
    };
    match name.parse::<LevelFilter>() {
        Ok(LevelFilter::Off) | Err(_) => Err(LoggingError::InvalidLevel(trimmed.to_string())),
        Ok(level) => Ok(level),
    }
}

fn parse_log_dir(log_dir: &str) -> Result<PathBuf, LoggingError> {
    let path = Path::new(log_dir.trim());
    if !path.is_absolute() {
        return Err(LoggingError::InvalidLogDir(log_dir.trim().to_string()));
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::{init_logging, parse_level, parse_log_dir, LogConfig, LoggingError};
    use log::LevelFilter;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level(" warning ").unwrap(), LevelFilter::Warn);
        assert!(matches!(
            parse_level("verbose"),
            Err(LoggingError::InvalidLevel(level)) if level == "verbose"
        ));
        assert!(parse_level("off").is_err());
    }

    #[test]
    fn log_dir_must_be_absolute() {
        assert!(matches!(
            parse_log_dir("   "),
            Err(LoggingError::InvalidLogDir(_))
        ));
        assert!(matches!(
            parse_log_dir("logs/dev"),
            Err(LoggingError::InvalidLogDir(dir)) if dir == "logs/dev"
        ));
    }

    #[test]
    fn second_start_accepts_equal_config_only() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let log_dir = first.path().join("logs");
        let log_dir_str = log_dir.to_str().unwrap();
        let config = LogConfig::new("info", log_dir_str).unwrap();

        init_logging(&config).unwrap();
        init_logging(&LogConfig::new("INFO", log_dir_str).unwrap()).unwrap();
        assert!(log_dir.is_dir());

        let louder = LogConfig::new("debug", log_dir_str).unwrap();
        assert!(matches!(
            init_logging(&louder),
            Err(LoggingError::AlreadyStarted { active, .. }) if active == config
        ));

        let moved = LogConfig::new("info", second.path().to_str().unwrap()).unwrap();
        let err = init_logging(&moved).unwrap_err();
        assert!(err.to_string().contains("cannot switch"));
    }
}
