//! logline CLI
//!
//! Thin wrapper around logline-core for command-line usage.
//!
//! ## Usage
//!
//! ```bash
//! # Print a log line to the console
//! logline emit --level warning "disk at 91%"
//!
//! # Also append it as JSON to a file, tagged with a module
//! logline emit --level error --module storage --file logs/app.jsonl "disk full"
//!
//! # Pretty-print a JSONL log file, warnings and above
//! logline read logs/app.jsonl --min-level warning --ansi
//!
//! # Show how each level is rendered
//! logline levels --ansi
//! ```
//!
//! Without `--config`, destinations start from the `LOGLINE_*` environment
//! variables; command-line flags take precedence.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use logline_core::config::{ConsoleConfig, FileConfig};
use logline_core::destination::ConsoleLogDestination;
use logline_core::item_format::read_json_lines;
use logline_core::{
    location, AnsiLevelFormatter, DestinationError, FailureHandler, FileFormat, Level,
    LevelFormatter, LogConfig, LogDestination, LogItem, LoggingBuilder, PlainLevelFormatter,
    StringLogItemFormatter,
};

/// logline - structured log lines from the command line
#[derive(Parser)]
#[command(name = "logline")]
#[command(version)]
#[command(about = "Emit, read and preview structured log lines")]
struct Cli {
    /// Increase verbosity of internal diagnostics (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log one message through the configured destinations
    Emit {
        /// Level of the message
        #[arg(short, long, default_value = "info")]
        level: Level,

        /// Console floor (default: from config, else verbose)
        #[arg(long)]
        min_level: Option<Level>,

        /// Color the console level with ANSI escapes
        #[arg(long)]
        ansi: bool,

        /// Do not print to the console
        #[arg(short, long)]
        quiet: bool,

        /// Append the item to this file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Floor for the file destination
        #[arg(long, default_value = "verbose")]
        file_level: Level,

        /// Write text lines instead of JSON to the file
        #[arg(long)]
        text: bool,

        /// Module to tag the item with (filtered by the config's module floors)
        #[arg(short, long)]
        module: Option<String>,

        /// JSON config file with console/file destinations
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Message words, joined with spaces
        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Print the items of a JSONL log file
    Read {
        /// JSONL file to read
        path: PathBuf,

        /// Only show items at or above this level
        #[arg(long, default_value = "verbose")]
        min_level: Level,

        /// Only show items tagged with this module
        #[arg(short, long)]
        module: Option<String>,

        /// Output layout
        #[arg(long, value_enum, default_value_t = Layout::Default)]
        format: Layout,

        /// Color level labels with ANSI escapes
        #[arg(long)]
        ansi: bool,
    },

    /// Show every level with its raw value and rendering
    Levels {
        /// Use ANSI escapes instead of emoji
        #[arg(long)]
        ansi: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Layout {
    /// `<level> <message> (<file>:<function>:<line>) [<thread>]`
    Default,
    /// Timestamp, module, level, thread, function, location and message
    Detailed,
    /// Only the message
    Message,
    /// The stored JSON document
    Json,
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

fn level_formatter(ansi: bool) -> Arc<dyn LevelFormatter> {
    if ansi {
        Arc::new(AnsiLevelFormatter)
    } else {
        Arc::new(PlainLevelFormatter)
    }
}

#[allow(clippy::too_many_arguments)]
fn run_emit(
    level: Level,
    min_level: Option<Level>,
    ansi: bool,
    quiet: bool,
    file: Option<PathBuf>,
    file_level: Level,
    text: bool,
    module: Option<String>,
    config: Option<PathBuf>,
    message: Vec<String>,
) -> Result<()> {
    let mut config = match config {
        Some(path) => LogConfig::from_json_file(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LogConfig::from_env()?,
    };

    if quiet {
        config.console = None;
    } else {
        let base = config.console.take().unwrap_or(ConsoleConfig {
            min_level: Level::Verbose,
            ansi: false,
        });
        config.console = Some(ConsoleConfig {
            min_level: min_level.unwrap_or(base.min_level),
            ansi: ansi || base.ansi,
        });
    }

    if let Some(path) = file {
        config.file = Some(FileConfig {
            path,
            min_level: file_level,
            format: if text { FileFormat::Text } else { FileFormat::Json },
        });
    }

    // A module named on the command line is accepted unless the config
    // gives it a floor.
    if let Some(module) = &module {
        config
            .modules
            .entry(module.clone())
            .or_insert(Level::Verbose);
    }

    let log = LoggingBuilder::from_config(config)
        .on_error(|error| eprintln!("Error: {}", error))
        .build()?;
    tracing::debug!(?log, "Destinations ready");

    let message = message.join(" ");
    match module {
        Some(module) => log.log_module(module, level, || message, location!()),
        None => log.log(level, || message, location!()),
    }
    log.flush();

    Ok(())
}

fn run_read(
    path: PathBuf,
    min_level: Level,
    module: Option<String>,
    layout: Layout,
    ansi: bool,
) -> Result<()> {
    let items = read_json_lines(&path)
        .with_context(|| format!("Failed to read log file {}", path.display()))?;
    tracing::info!(path = %path.display(), count = items.len(), "Read log file");

    let keep = |item: &LogItem| {
        item.level().passes(min_level)
            && module.as_deref().map_or(true, |m| item.module() == Some(m))
    };

    let formatter = match layout {
        Layout::Default => StringLogItemFormatter::with_level_formatter(level_formatter(ansi)),
        Layout::Detailed => StringLogItemFormatter::detailed(),
        Layout::Message => StringLogItemFormatter::message_only(),
        Layout::Json => {
            for item in items.iter().filter(|item| keep(*item)) {
                println!("{}", item.to_json_line()?);
            }
            return Ok(());
        }
    };

    let console = ConsoleLogDestination::new(min_level, formatter)?;
    let on_failure: FailureHandler =
        Arc::new(|error: DestinationError| eprintln!("Error: {}", error));
    for item in items.into_iter().filter(|item| keep(item)) {
        console.write(item, Arc::clone(&on_failure));
    }
    console.flush();

    Ok(())
}

fn run_levels(ansi: bool) {
    let formatter = level_formatter(ansi);
    for level in Level::ALL {
        println!(
            "{}\t{}{}{}{}",
            u8::from(level),
            formatter.color_escape(),
            formatter.color_string(level),
            formatter.label_string(level),
            formatter.color_reset()
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Emit {
            level,
            min_level,
            ansi,
            quiet,
            file,
            file_level,
            text,
            module,
            config,
            message,
        } => run_emit(
            level, min_level, ansi, quiet, file, file_level, text, module, config, message,
        )?,
        Commands::Read {
            path,
            min_level,
            module,
            format,
            ansi,
        } => run_read(path, min_level, module, format, ansi)?,
        Commands::Levels { ansi } => run_levels(ansi),
    }

    Ok(())
}
