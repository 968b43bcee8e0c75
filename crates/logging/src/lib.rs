//! Logging setup for the Flaunch dashboard
//!
//! Installs a `tracing` subscriber with:
//! - An `EnvFilter` (`RUST_LOG` overrides the configured level)
//! - A console layer in pretty, compact or JSON format
//! - An optional non-blocking rolling file layer
//!
//! The returned [`LoggingGuard`] flushes the file writer on drop and must be
//! held for the lifetime of the program.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    fmt::{format::Writer, time::FormatTime},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Configuration of the installed subscriber
static ACTIVE_CONFIG: OnceCell<LoggingConfig> = OnceCell::new();

/// Timestamp formatter, optionally with microseconds
#[derive(Debug, Clone, Copy)]
struct Timestamp {
    high_precision: bool,
}

impl FormatTime for Timestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = chrono::Utc::now();
        if self.high_precision {
            write!(
                w,
                "{}.{:06}",
                now.format("%Y-%m-%d %H:%M:%S"),
                now.timestamp_subsec_micros()
            )
        } else {
            write!(w, "{}", now.format("%Y-%m-%d %H:%M:%S"))
        }
    }
}

/// Log rotation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    Minutely,
    Hourly,
    Daily,
    Never,
}

impl RotationPolicy {
    fn to_appender_rotation(self) -> Rotation {
        match self {
            RotationPolicy::Minutely => Rotation::MINUTELY,
            RotationPolicy::Hourly => Rotation::HOURLY,
            RotationPolicy::Daily => Rotation::DAILY,
            RotationPolicy::Never => Rotation::NEVER,
        }
    }
}

/// Output format for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Multi-line, human-readable
    Pretty,
    Compact,
    /// One JSON object per event
    Json,
}

/// Rolling file output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTargetConfig {
    /// Directory the log files are written to
    pub directory: String,

    /// File name prefix; the rotation suffix is appended
    pub file_name: String,

    pub rotation: RotationPolicy,

    pub format: OutputFormat,
}

impl Default for FileTargetConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_name: "flaunch-dash.log".to_string(),
            rotation: RotationPolicy::Daily,
            format: OutputFormat::Json,
        }
    }
}

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub default_level: String,

    /// Console output format
    pub format: OutputFormat,

    /// Colored console output
    pub ansi: bool,

    /// Whether to include file and line information
    pub include_file_line: bool,

    /// Whether to include module path
    pub include_module_path: bool,

    /// Whether to include thread ID
    pub include_thread_id: bool,

    /// Whether to include microseconds in timestamps
    pub high_precision_timestamps: bool,

    /// Optional rolling file output
    pub file: Option<FileTargetConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            format: OutputFormat::Compact,
            ansi: true,
            include_file_line: false,
            include_module_path: true,
            include_thread_id: false,
            high_precision_timestamps: false,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Check that `default_level` is a valid filter directive
    pub fn validate(&self) -> Result<(), LoggingError> {
        EnvFilter::try_new(&self.default_level)
            .map(|_| ())
            .map_err(|e| LoggingError::Filter(format!("{}: {}", self.default_level, e)))
    }

    /// Same configuration with a different level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    fn timer(&self) -> Timestamp {
        Timestamp {
            high_precision: self.high_precision_timestamps,
        }
    }
}

/// Logging error types
#[derive(thiserror::Error, Debug)]
pub enum LoggingError {
    #[error("Logging system already initialized")]
    AlreadyInitialized,

    #[error("Invalid filter directive {0}")]
    Filter(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Keeps the non-blocking file writer alive
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _guards: Vec<WorkerGuard>,
}

type Base = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Base> + Send + Sync>;

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(config.include_module_path)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line)
        .with_level(true)
        .with_ansi(config.ansi)
        .with_timer(config.timer());

    match config.format {
        OutputFormat::Pretty => layer.pretty().boxed(),
        OutputFormat::Compact => layer.compact().boxed(),
        OutputFormat::Json => layer.json().boxed(),
    }
}

fn file_layer(
    config: &LoggingConfig,
    target: &FileTargetConfig,
) -> Result<(BoxedLayer, WorkerGuard), LoggingError> {
    std::fs::create_dir_all(&target.directory)?;

    let appender = RollingFileAppender::new(
        target.rotation.to_appender_rotation(),
        &target.directory,
        &target.file_name,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(config.include_module_path)
        .with_thread_ids(config.include_thread_id)
        .with_file(config.include_file_line)
        .with_line_number(config.include_file_line)
        .with_ansi(false)
        .with_timer(config.timer());

    let layer = match target.format {
        OutputFormat::Pretty => layer.boxed(),
        OutputFormat::Compact => layer.compact().boxed(),
        OutputFormat::Json => layer.json().boxed(),
    };

    Ok((layer, guard))
}

/// Install the global subscriber
pub fn init(config: LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    config.validate()?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_level)
            .map_err(|e| LoggingError::Filter(e.to_string()))?,
    };

    let mut layers: Vec<BoxedLayer> = vec![console_layer(&config)];
    let mut guards = Vec::new();

    if let Some(target) = &config.file {
        let (layer, guard) = file_layer(&config, target)?;
        layers.push(layer);
        guards.push(guard);
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    if let Some(target) = &config.file {
        info!(
            "File logging to {}",
            PathBuf::from(&target.directory).join(&target.file_name).display()
        );
    }

    // Only the first successful init reaches this point
    let _ = ACTIVE_CONFIG.set(config);

    Ok(LoggingGuard { _guards: guards })
}

/// Initialize with the default configuration
pub fn init_default() -> Result<LoggingGuard, LoggingError> {
    init(LoggingConfig::default())
}

/// Initialize from a JSON configuration file
pub fn init_from_file(path: impl AsRef<Path>) -> Result<LoggingGuard, LoggingError> {
    let content = std::fs::read_to_string(path)?;
    let config: LoggingConfig = serde_json::from_str(&content)?;
    init(config)
}

/// Configuration of the installed subscriber, if any
pub fn active_config() -> Option<&'static LoggingConfig> {
    ACTIVE_CONFIG.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.default_level, "info");
        assert!(config.file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_filter() {
        let config = LoggingConfig::default().with_level("flaunch_dash_feed=debug,warn");
        assert!(config.validate().is_ok());

        let config = LoggingConfig::default().with_level("feed=notalevel");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let config: LoggingConfig = serde_json::from_str(
            r#"{"format": "json", "file": {"directory": "/tmp/x", "file_name": "a.log", "rotation": "hourly", "format": "compact"}}"#,
        )
        .unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.default_level, "info");
        let file = config.file.unwrap();
        assert_eq!(file.rotation, RotationPolicy::Hourly);
        assert_eq!(file.format, OutputFormat::Compact);
    }

    #[test]
    fn test_file_layer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = FileTargetConfig {
            directory: dir.path().join("nested").to_string_lossy().into_owned(),
            ..Default::default()
        };
        let (_layer, _guard) = file_layer(&LoggingConfig::default(), &target).unwrap();
        assert!(dir.path().join("nested").is_dir());
    }
}
