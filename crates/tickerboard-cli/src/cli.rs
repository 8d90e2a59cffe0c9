//! CLI argument definitions for tickerboard.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `board` | Build the heatmap board for a holdings file |
//! | `detail` | Show name, last close and recent history for one symbol |
//! | `watch` | Rebuild the board on a fixed interval until Ctrl-C |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--mock` | `false` | Use deterministic offline quotes |
//! | `--columns` | `16` | Grid width in cells |
//! | `--concurrency` | `4` | Outstanding quote requests |
//! | `--rate-limit` | `120` | Quote requests per minute |
//! | `--timeout-ms` | `10000` | Request timeout in ms |
//! | `--scheme` | `fine` | Colour scheme (fine, coarse) |
//!
//! Numeric options and `--scheme` fall back to their `TICKERBOARD_*`
//! environment variables, then to the defaults above.
//!
//! # Examples
//!
//! ```bash
//! tickerboard board VOO.csv
//! tickerboard board VOO.csv --columns 8 --format json --pretty
//! tickerboard detail BRK.B
//! tickerboard watch VOO.csv --interval-secs 300
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tickerboard_core::{BoardConfig, Scheme};

/// Holdings heatmap for the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tickerboard",
    author,
    version,
    about = "Colour-coded daily move board for portfolio holdings"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Serve synthetic, deterministic quotes instead of calling Yahoo.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Number of cells per grid row.
    #[arg(long, global = true)]
    pub columns: Option<usize>,

    /// Maximum outstanding quote requests (1 = sequential).
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Quote requests allowed per minute.
    #[arg(long, global = true)]
    pub rate_limit: Option<u32>,

    /// Request timeout budget in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Bucket table used to colour cells.
    #[arg(long, global = true, value_enum)]
    pub scheme: Option<SchemeArg>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies explicit flags on top of an environment-derived config.
    pub fn apply_overrides(&self, mut config: BoardConfig) -> BoardConfig {
        if let Some(columns) = self.columns {
            config = config.with_columns(columns);
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_max_concurrency(concurrency);
        }
        if let Some(rate_limit) = self.rate_limit {
            config = config.with_rate_limit_per_minute(rate_limit);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_request_timeout_ms(timeout_ms);
        }
        if let Some(scheme) = self.scheme {
            config = config.with_scheme(scheme.into());
        }
        config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Coloured grid for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeArg {
    /// Ten buckets, with light shading for moves within one percent.
    Fine,
    /// Moves within one percent render neutral.
    Coarse,
}

impl From<SchemeArg> for Scheme {
    fn from(value: SchemeArg) -> Self {
        match value {
            SchemeArg::Fine => Self::Fine,
            SchemeArg::Coarse => Self::Coarse,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the board once and print it.
    ///
    /// # Examples
    ///
    ///   tickerboard board VOO.csv
    ///   tickerboard board VOO.csv --columns 8 --scheme coarse
    Board(BoardArgs),

    /// Show detail for a single symbol.
    ///
    /// The symbol is resolved first; unresolvable symbols report that no
    /// detail is available.
    ///
    /// # Examples
    ///
    ///   tickerboard detail AAPL
    ///   tickerboard detail '$BRK.B' --format json
    Detail(DetailArgs),

    /// Rebuild and print the board periodically until interrupted.
    ///
    /// The holdings file is re-read before every rebuild. A tick that
    /// arrives while a rebuild is still running is skipped.
    Watch(WatchArgs),
}

#[derive(Debug, Args)]
pub struct BoardArgs {
    /// Holdings CSV with a `Ticker` column.
    pub holdings: PathBuf,
}

#[derive(Debug, Args)]
pub struct DetailArgs {
    /// Ticker as it appears in the holdings file.
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Holdings CSV with a `Ticker` column.
    pub holdings: PathBuf,

    /// Seconds between rebuilds.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,
}
