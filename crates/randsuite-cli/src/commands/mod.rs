pub mod list;
pub mod run;

use std::fmt;

use clap::Args;
use randsuite_tests::{Battery, BatteryConfig, SignificanceLevel};

use crate::input::{self, LoadOptions};

/// Flags shared by every command that reads a sequence.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Input encoding: auto (ASCII if the file is only 0/1/whitespace), ascii, binary
    #[arg(long, default_value = "auto", value_parser = ["auto", "ascii", "binary"])]
    pub format: String,

    /// Reverse ASCII input so its last character becomes bit 0
    #[arg(long)]
    pub reverse: bool,

    /// Number of leading bits to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Test at most this many bits (after the offset)
    #[arg(long)]
    pub bits: Option<usize>,

    /// Significance level α; a p-value below it is judged non-random
    #[arg(long, default_value = "0.01")]
    pub level: f64,

    /// JSON file overriding per-test parameters
    #[arg(long)]
    pub config: Option<String>,

    /// Write the full results as JSON
    #[arg(long)]
    pub json: Option<String>,
}

impl InputArgs {
    fn load_options(&self) -> Result<LoadOptions, CliError> {
        Ok(LoadOptions {
            format: self.format.parse()?,
            reverse: self.reverse,
            offset: self.offset,
            limit: self.bits,
        })
    }
}

/// Anything that stops a command before it can print results.
#[derive(Debug)]
pub enum CliError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Json {
        path: String,
        source: serde_json::Error,
    },
    Suite(randsuite_tests::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{path}: {source}"),
            Self::Json { path, source } => write!(f, "{path}: {source}"),
            Self::Suite(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<randsuite_tests::Error> for CliError {
    fn from(e: randsuite_tests::Error) -> Self {
        Self::Suite(e)
    }
}

fn load_config(path: &str) -> Result<BatteryConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_string(),
        source,
    })
}

/// Load the sequence and configuration named by `args` into a battery.
pub fn build_battery(path: &str, args: &InputArgs) -> Result<Battery, CliError> {
    let options = args.load_options()?;
    let sequence = input::load(path, &options)?;
    let level = SignificanceLevel::new(args.level)?;
    log::info!("loaded {} bits from {path}", sequence.len());

    let battery = Battery::new(sequence, level);
    match &args.config {
        Some(config_path) => {
            let config = load_config(config_path)?;
            log::info!("using parameters from {config_path}");
            Ok(battery.with_config(config)?)
        }
        None => Ok(battery),
    }
}

/// Write `value` as pretty JSON when `--json` was given.
pub fn write_json<T: serde::Serialize>(path: Option<&str>, value: &T) -> Result<(), CliError> {
    let Some(path) = path else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(value).map_err(|source| CliError::Json {
        path: path.to_string(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })?;
    println!("\nResults saved to {path}");
    Ok(())
}
