use std::io::{self, Write};

use serde_json::{json, Value};
use tickerboard_core::{Board, Cell, Color, DetailOutcome};

use crate::cli::OutputFormat;
use crate::error::CliError;

const MIN_CELL_WIDTH: usize = 8;
const RESET: &str = "\x1b[0m";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub fn render_board(board: &Board, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            let payload = json!({ "board": board, "summary": board.summary() });
            write_json(&mut out, &payload, pretty)?;
        }
        OutputFormat::Table => write_board_table(&mut out, board)?,
    }
    out.flush()?;
    Ok(())
}

/// Board redraw for `watch`: tables repaint the screen, JSON appends a line.
pub fn render_board_refresh(
    board: &Board,
    generation: u64,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            let payload = json!({
                "generation": generation,
                "board": board,
                "summary": board.summary(),
            });
            write_json(&mut out, &payload, pretty)?;
        }
        OutputFormat::Table => {
            write!(out, "{CLEAR_SCREEN}")?;
            writeln!(out, "refresh #{generation}")?;
            write_board_table(&mut out, board)?;
        }
    }
    out.flush()?;
    Ok(())
}

pub fn render_detail(
    outcome: &DetailOutcome,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            let payload = match outcome {
                DetailOutcome::Available(view) => json!({ "detail": view }),
                DetailOutcome::Unavailable { symbol, reason } => json!({
                    "detail": Value::Null,
                    "symbol": symbol,
                    "error": reason.to_string(),
                }),
            };
            write_json(&mut out, &payload, pretty)?;
        }
        OutputFormat::Table => write!(out, "{outcome}")?,
    }
    out.flush()?;
    Ok(())
}

fn write_json<W: Write>(out: &mut W, payload: &Value, pretty: bool) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(payload)?
    } else {
        serde_json::to_string(payload)?
    };
    writeln!(out, "{text}")?;
    Ok(())
}

/// Two terminal lines per grid row: symbols, then changes.
fn write_board_table<W: Write>(out: &mut W, board: &Board) -> io::Result<()> {
    let width = cell_width(board);

    for row in board.grid_rows() {
        for line in 0..2 {
            for cell in row {
                let text = label_line(cell, line);
                write!(out, "{}{:^width$}{RESET}", ansi(cell), text)?;
            }
            writeln!(out)?;
        }
    }

    let summary = board.summary();
    writeln!(
        out,
        "{} holdings, {} resolved, {} without data",
        summary.total, summary.resolved, summary.unavailable
    )?;
    for failure in &summary.failures {
        writeln!(
            out,
            "  #{} {}: {}",
            failure.position,
            display_symbol(failure.symbol.as_str()),
            failure.reason
        )?;
    }
    Ok(())
}

fn label_line(cell: &Cell, line: usize) -> &str {
    let (symbol, change) = cell.label().split_once('\n').unwrap_or((cell.label(), ""));
    if line == 0 {
        display_symbol(symbol)
    } else {
        change
    }
}

fn display_symbol(symbol: &str) -> &str {
    if symbol.is_empty() {
        "(blank)"
    } else {
        symbol
    }
}

fn cell_width(board: &Board) -> usize {
    board
        .cells()
        .iter()
        .flat_map(|cell| [label_line(cell, 0), label_line(cell, 1)])
        .map(|text| text.chars().count() + 2)
        .max()
        .unwrap_or(0)
        .max(MIN_CELL_WIDTH)
}

fn ansi(cell: &Cell) -> String {
    let colors = cell.colors();
    format!(
        "{}{}",
        sgr(38, colors.foreground),
        sgr(48, colors.background)
    )
}

fn sgr(selector: u8, color: Color) -> String {
    format!("\x1b[{selector};2;{};{};{}m", color.r, color.g, color.b)
}
