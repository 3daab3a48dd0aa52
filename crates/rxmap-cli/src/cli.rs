//! CLI argument definitions for the RxNorm mapper.

use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "rxnorm-mapper",
    version,
    about = "Moroccan medical products to RxNorm mapper",
    long_about = "Map Moroccan pharmaceutical products to RxNorm concepts.\n\n\
                  A language model proposes a concept for each product and RxNav\n\
                  validates it. Results are exported to a timestamped CSV file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow product names and ingredients in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// TOML settings file.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Map products from a listing and export the results.
    Process(ProcessArgs),

    /// Summarize an exported results file.
    Dashboard(DashboardArgs),
}

#[derive(Parser)]
pub struct ProcessArgs {
    /// Input listing: the medicines workbook or a delimited text export.
    #[arg(long = "input-file", value_name = "PATH")]
    pub input_file: Option<PathBuf>,

    /// Products per batch.
    #[arg(
        long = "batch-size",
        value_name = "N",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub batch_size: Option<usize>,

    /// Row index to start from.
    #[arg(long = "start-index", value_name = "N", default_value_t = 0)]
    pub start_index: usize,

    /// Only load the first N products.
    #[arg(long = "max-products", value_name = "N")]
    pub max_products: Option<usize>,

    /// Directory for the results file.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct DashboardArgs {
    /// Results CSV written by `process`.
    #[arg(value_name = "RESULTS_CSV")]
    pub results: PathBuf,

    /// Rows shown in the detail table.
    #[arg(long = "limit", value_name = "N", default_value_t = 50)]
    pub limit: usize,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
