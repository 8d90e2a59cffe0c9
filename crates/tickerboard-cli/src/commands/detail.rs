use std::num::NonZeroUsize;
use std::process::ExitCode;

use tickerboard_core::{
    BoardBuilder, Classifier, DetailLookup, DetailOutcome, Holding, RequestThrottle,
};

use crate::cli::{DetailArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{Context, EXIT_NO_DATA};

/// Resolves the symbol as a one-cell board, then opens that cell.
pub async fn run(
    args: &DetailArgs,
    context: &Context,
    format: OutputFormat,
    pretty: bool,
) -> Result<ExitCode, CliError> {
    let throttle = RequestThrottle::from_config(&context.config);
    let builder = BoardBuilder::new(context.provider.clone(), NonZeroUsize::MIN)
        .with_classifier(Classifier::new(context.config.scheme));

    let board = builder.build(&[Holding::new(args.symbol.as_str())]).await;
    let cell = board
        .cells()
        .first()
        .ok_or_else(|| CliError::Command(String::from("board has no cell for the symbol")))?;

    let outcome = DetailLookup::new(context.provider.clone())
        .with_throttle(throttle)
        .lookup_cell(cell)
        .await;
    output::render_detail(&outcome, format, pretty)?;

    Ok(match outcome {
        DetailOutcome::Available(_) => ExitCode::SUCCESS,
        DetailOutcome::Unavailable { .. } => ExitCode::from(EXIT_NO_DATA),
    })
}
