//! Logging configuration and the builder that turns it into a [`Log`].
//!
//! Configuration comes from a JSON file or from environment variables:
//!
//! | Variable              | Meaning                                  |
//! |-----------------------|------------------------------------------|
//! | `LOGLINE_LEVEL`       | console floor; enables the console       |
//! | `LOGLINE_ANSI`        | `1`/`true` for colored console levels    |
//! | `LOGLINE_FILE`        | log file path; enables the file          |
//! | `LOGLINE_FILE_LEVEL`  | file floor (default `verbose`)           |
//! | `LOGLINE_FILE_FORMAT` | `json` (default) or `text`               |
//! | `LOGLINE_MODULES`     | `name=level` pairs, comma separated      |

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::destination::{ConsoleLogDestination, FileLogDestination, LogDestination};
use crate::error::{DestinationError, LogError, LogResult};
use crate::item_format::{JsonLogItemFormatter, StringLogItemFormatter};
use crate::level::Level;
use crate::level_format::{AnsiLevelFormatter, LevelFormatter, PlainLevelFormatter};
use crate::log::{ErrorHandler, Log};

pub const ENV_LEVEL: &str = "LOGLINE_LEVEL";
pub const ENV_ANSI: &str = "LOGLINE_ANSI";
pub const ENV_FILE: &str = "LOGLINE_FILE";
pub const ENV_FILE_LEVEL: &str = "LOGLINE_FILE_LEVEL";
pub const ENV_FILE_FORMAT: &str = "LOGLINE_FILE_FORMAT";
pub const ENV_MODULES: &str = "LOGLINE_MODULES";

/// Which destinations to set up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub console: Option<ConsoleConfig>,
    pub file: Option<FileConfig>,
    /// Modules accepted by [`Log::log_module`] and their floors
    #[serde(with = "level_map")]
    pub modules: BTreeMap<String, Level>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    #[serde(with = "level_name")]
    pub min_level: Level,
    /// Color level labels with ANSI escapes
    pub ansi: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            min_level: Level::Info,
            ansi: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub path: PathBuf,
    #[serde(with = "level_name", default = "verbose")]
    pub min_level: Level,
    #[serde(default)]
    pub format: FileFormat,
}

fn verbose() -> Level {
    Level::Verbose
}

/// Line format of a log file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    /// One JSON document per line
    #[default]
    Json,
    /// The default text layout with plain level labels
    Text,
}

impl FromStr for FileFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "jsonl" => Ok(FileFormat::Json),
            "text" | "txt" => Ok(FileFormat::Text),
            other => Err(LogError::Config(format!("unknown file format {:?}", other))),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Json => f.write_str("json"),
            FileFormat::Text => f.write_str("text"),
        }
    }
}

/// Levels in config files are names (`"warning"`), not raw integers.
mod level_name {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::level::Level;

    pub fn serialize<S: Serializer>(level: &Level, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&level.label().to_ascii_lowercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

/// Module floors keyed by module name, levels written as names.
mod level_map {
    use std::collections::BTreeMap;

    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::level::Level;

    pub fn serialize<S: Serializer>(
        modules: &BTreeMap<String, Level>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            modules
                .iter()
                .map(|(module, level)| (module, level.label().to_ascii_lowercase())),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Level>, D::Error> {
        BTreeMap::<String, String>::deserialize(deserializer)?
            .into_iter()
            .map(|(module, name)| -> Result<(String, Level), D::Error> {
                Ok((module, name.parse::<Level>().map_err(de::Error::custom)?))
            })
            .collect()
    }
}

/// Parse `storage=warning, net=debug`.
fn parse_modules(value: &str) -> LogResult<BTreeMap<String, Level>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| -> LogResult<(String, Level)> {
            let (module, level) = pair.split_once('=').ok_or_else(|| {
                LogError::Config(format!("expected module=level, got {:?}", pair))
            })?;
            Ok((module.trim().to_string(), level.trim().parse::<Level>()?))
        })
        .collect()
}

impl LogConfig {
    /// Load a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> LogResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Read the `LOGLINE_*` environment variables.
    pub fn from_env() -> LogResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `var`.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> LogResult<Self> {
        let console = match var(ENV_LEVEL) {
            Some(level) => Some(ConsoleConfig {
                min_level: level.parse()?,
                ansi: var(ENV_ANSI).map(|v| parse_flag(&v)).unwrap_or(false),
            }),
            None => None,
        };

        let file = match var(ENV_FILE) {
            Some(path) => Some(FileConfig {
                path: PathBuf::from(path),
                min_level: var(ENV_FILE_LEVEL)
                    .map(|level| level.parse::<Level>())
                    .transpose()?
                    .unwrap_or(Level::Verbose),
                format: var(ENV_FILE_FORMAT)
                    .map(|format| format.parse::<FileFormat>())
                    .transpose()?
                    .unwrap_or_default(),
            }),
            None => None,
        };

        let modules = var(ENV_MODULES)
            .map(|value| parse_modules(&value))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            console,
            file,
            modules,
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Builder for a [`Log`] with console and file destinations.
#[derive(Default)]
pub struct LoggingBuilder {
    config: LogConfig,
    error_handler: Option<ErrorHandler>,
}

impl LoggingBuilder {
    /// A builder with no destinations and no modules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded configuration.
    pub fn from_config(config: LogConfig) -> Self {
        Self {
            config,
            error_handler: None,
        }
    }

    /// Print items at or above `min_level` to stdout.
    pub fn console(mut self, min_level: Level, ansi: bool) -> Self {
        self.config.console = Some(ConsoleConfig { min_level, ansi });
        self
    }

    /// Disable console output.
    pub fn no_console(mut self) -> Self {
        self.config.console = None;
        self
    }

    /// Append items at or above `min_level` to `path`.
    pub fn file(mut self, path: impl Into<PathBuf>, min_level: Level, format: FileFormat) -> Self {
        self.config.file = Some(FileConfig {
            path: path.into(),
            min_level,
            format,
        });
        self
    }

    /// Accept calls tagged with `module` at or above `min_level`.
    pub fn module(mut self, module: impl Into<String>, min_level: Level) -> Self {
        self.config.modules.insert(module.into(), min_level);
        self
    }

    /// Observe delivery failures of the built [`Log`].
    pub fn on_error(mut self, handler: impl Fn(&DestinationError) + Send + Sync + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    /// The configuration `build` will apply.
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Create the [`Log`] and register the configured destinations and
    /// modules.
    pub fn build(self) -> LogResult<Log> {
        let log = Log::new();
        if let Some(handler) = self.error_handler {
            log.set_error_handler(move |error| handler(error));
        }

        if let Some(console) = &self.config.console {
            let level_formatter: Arc<dyn LevelFormatter> = if console.ansi {
                Arc::new(AnsiLevelFormatter)
            } else {
                Arc::new(PlainLevelFormatter)
            };
            let destination = ConsoleLogDestination::new(
                console.min_level,
                StringLogItemFormatter::with_level_formatter(level_formatter),
            )?;
            log.register(Arc::new(destination));
        }

        if let Some(file) = &self.config.file {
            let destination: Arc<dyn LogDestination> = match file.format {
                FileFormat::Json => Arc::new(FileLogDestination::new(
                    &file.path,
                    file.min_level,
                    JsonLogItemFormatter::new(),
                )?),
                FileFormat::Text => Arc::new(FileLogDestination::new(
                    &file.path,
                    file.min_level,
                    StringLogItemFormatter::default(),
                )?),
            };
            log.register(destination);
        }

        for (module, min_level) in &self.config.modules {
            log.register_module(module.as_str(), *min_level);
        }

        tracing::debug!(
            destinations = log.len(),
            modules = self.config.modules.len(),
            "Log built"
        );
        Ok(log)
    }
}
