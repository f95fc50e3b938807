use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stratify")]
#[command(about = "Stratify - options strategy screener and ranking engine")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Log output format (overrides the config file)
    #[arg(long, global = true, value_enum, env = "STRATIFY_LOG_FORMAT")]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Screen symbols and print the ranked strategies
    Screen {
        /// Symbols to screen; defaults to the configured watchlist
        symbols: Vec<String>,

        /// Path to the configuration file; built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Furthest expiration considered, in calendar days
        #[arg(long)]
        max_days: Option<u32>,

        /// Ranked strategies returned per symbol
        #[arg(long)]
        top_n: Option<usize>,

        /// Minimum out-of-the-money distance, in percent of spot
        #[arg(long)]
        otm_percent: Option<f64>,

        /// Minimum strike gap between spread legs
        #[arg(long)]
        spread_width: Option<f64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Serve the screening HTTP API
    Serve {
        /// Path to the configuration file
        #[arg(short, long, default_value = "stratify.yaml")]
        config: PathBuf,

        /// Override HTTP port
        #[arg(long)]
        http: Option<u16>,
    },

    /// Validate configuration without screening
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "stratify.yaml")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "stratify.yaml")]
        output: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table, one block per symbol
    Table,
    /// The screen response as JSON
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
    Compact,
}

impl LogFormatArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormatArg::Pretty => "pretty",
            LogFormatArg::Json => "json",
            LogFormatArg::Compact => "compact",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
