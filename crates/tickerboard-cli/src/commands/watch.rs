use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tickerboard_core::{load_holdings, BoardBuilder, BoardStore, RefreshOutcome};
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::cli::{OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::Context;

pub async fn run(
    args: &WatchArgs,
    context: &Context,
    format: OutputFormat,
    pretty: bool,
) -> Result<ExitCode, CliError> {
    let mut holdings = load_holdings(&args.holdings)?;
    let builder = BoardBuilder::from_config(context.provider.clone(), &context.config)?;
    let store = Arc::new(BoardStore::new(builder));

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut builds = JoinSet::new();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        path = %args.holdings.display(),
        interval_secs = args.interval_secs,
        "watching holdings"
    );

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                if let Err(error) = signal {
                    warn!(%error, "failed to listen for ctrl-c");
                }
                info!("stopping watch");
                break;
            }
            _ = ticker.tick() => {
                match load_holdings(&args.holdings) {
                    Ok(fresh) => holdings = fresh,
                    Err(error) => warn!(%error, "holdings reload failed, keeping previous list"),
                }
                let store = Arc::clone(&store);
                let batch = holdings.clone();
                builds.spawn(async move { store.refresh(&batch).await });
            }
            Some(joined) = builds.join_next() => {
                match joined {
                    Ok(RefreshOutcome::Rebuilt { generation, board }) => {
                        output::render_board_refresh(&board, generation, format, pretty)?;
                    }
                    Ok(RefreshOutcome::Skipped) => {
                        info!("previous rebuild still running, tick skipped");
                    }
                    Err(error) => {
                        return Err(CliError::Command(format!("rebuild task failed: {error}")));
                    }
                }
            }
        }
    }

    builds.abort_all();
    Ok(ExitCode::SUCCESS)
}
