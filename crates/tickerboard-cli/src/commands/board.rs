use std::process::ExitCode;

use tickerboard_core::{load_holdings, Board, BoardBuilder};

use crate::cli::{BoardArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{Context, EXIT_NO_DATA};

pub async fn run(
    args: &BoardArgs,
    context: &Context,
    format: OutputFormat,
    pretty: bool,
) -> Result<ExitCode, CliError> {
    let holdings = load_holdings(&args.holdings)?;
    let builder = BoardBuilder::from_config(context.provider.clone(), &context.config)?;

    let board = builder.build(&holdings).await;
    output::render_board(&board, format, pretty)?;

    Ok(exit_code_for(&board))
}

/// A board where nothing resolved usually means the provider is unreachable.
pub(super) fn exit_code_for(board: &Board) -> ExitCode {
    let summary = board.summary();
    if summary.total > 0 && summary.resolved == 0 {
        ExitCode::from(EXIT_NO_DATA)
    } else {
        ExitCode::SUCCESS
    }
}
