mod board;
mod detail;
mod watch;

use std::process::ExitCode;
use std::sync::Arc;

use tickerboard_core::{BoardConfig, FixtureProvider, QuoteProvider, YahooProvider};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Exit code when a command ran but produced no usable data.
pub const EXIT_NO_DATA: u8 = 3;

/// Resolved settings and provider shared by every command.
pub struct Context {
    pub config: BoardConfig,
    pub provider: Arc<dyn QuoteProvider>,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let config = cli.apply_overrides(BoardConfig::from_env()?);
        config.validate()?;

        let provider: Arc<dyn QuoteProvider> = if cli.mock {
            Arc::new(FixtureProvider::seeded())
        } else {
            Arc::new(YahooProvider::default().with_timeout_ms(config.request_timeout_ms))
        };
        debug!(provider = provider.id(), ?config, "command context ready");

        Ok(Self { config, provider })
    }
}

pub async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let context = Context::from_cli(cli)?;

    match &cli.command {
        Command::Board(args) => board::run(args, &context, cli.format, cli.pretty).await,
        Command::Detail(args) => detail::run(args, &context, cli.format, cli.pretty).await,
        Command::Watch(args) => watch::run(args, &context, cli.format, cli.pretty).await,
    }
}
