//! Behavior-driven tests for the quote-to-cell pipeline.
//!
//! These tests verify how holdings become positioned, classified cells, and
//! that one symbol's failure never leaks into another symbol's cell.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tickerboard_core::{
    Board, BoardBuilder, BoardConfig, Bucket, CanonicalSymbol, Classifier, FixtureProvider,
    Holding, Scheme, SourceError,
};

fn columns(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).expect("non-zero columns")
}

fn holdings(tickers: &[&str]) -> Vec<Holding> {
    tickers.iter().copied().map(Holding::from).collect()
}

fn symbols(board: &Board) -> Vec<&str> {
    board.cells().iter().map(|cell| cell.symbol().as_str()).collect()
}

// =============================================================================
// Reference board
// =============================================================================

#[tokio::test]
async fn when_reference_holdings_are_built_cells_match_expected_grid() {
    // Given: AAPL up 2%, BRK.B down 1.2%, and a symbol with no sessions
    let provider = FixtureProvider::new()
        .with_quote("AAPL", 100.0, 102.0)
        .with_quote("BRK-B", 50.0, 49.4);
    let builder = BoardBuilder::new(Arc::new(provider), columns(2));

    // When: The board is built two columns wide
    let board = builder.build(&holdings(&["AAPL", "BRK.B", "ZZZQQQ"])).await;

    // Then: Each cell has the expected bucket, label and position
    assert_eq!(board.len(), 3);

    let aapl = &board.cells()[0];
    assert_eq!(aapl.symbol().as_str(), "AAPL");
    assert_eq!(aapl.bucket(), Bucket::Gain);
    assert_eq!(aapl.label(), "AAPL\n2.00%");
    assert_eq!((aapl.row(), aapl.column()), (0, 0));
    assert!(aapl.is_selectable());

    let brk = &board.cells()[1];
    assert_eq!(brk.symbol().as_str(), "BRK-B");
    assert_eq!(brk.bucket(), Bucket::StrongLoss);
    assert_eq!(brk.label(), "BRK-B\n-1.20%");
    assert_eq!((brk.row(), brk.column()), (0, 1));

    let missing = &board.cells()[2];
    assert_eq!(missing.bucket(), Bucket::Missing);
    assert_eq!(missing.label(), "ZZZQQQ\nNo Data");
    assert_eq!((missing.row(), missing.column()), (1, 0));
    assert!(missing.quote_handle().is_none());
}

#[tokio::test]
async fn when_change_is_exactly_two_percent_cell_stays_below_strong_gain() {
    // Given: One holding up exactly 2% and one up 2.5%
    let provider = FixtureProvider::new()
        .with_quote("EDGE", 100.0, 102.0)
        .with_quote("OVER", 100.0, 102.5);
    let builder = BoardBuilder::new(Arc::new(provider), columns(2));

    // When: The board is built
    let board = builder.build(&holdings(&["EDGE", "OVER"])).await;

    // Then: The strict `> 2` threshold puts exactly 2% in Gain
    assert_eq!(board.cells()[0].bucket(), Bucket::Gain);
    assert_eq!(board.cells()[0].colors().background.to_string(), "#32CD32");
    assert_eq!(board.cells()[1].bucket(), Bucket::StrongGain);
}

#[tokio::test]
async fn when_board_is_serialized_cells_carry_colours_and_positions() {
    // Given: A one-cell board
    let provider = FixtureProvider::new().with_quote("AAPL", 100.0, 104.0);
    let builder = BoardBuilder::new(Arc::new(provider), columns(16));
    let board = builder.build(&holdings(&["AAPL"])).await;

    // When: The board is serialized for a renderer
    let json = serde_json::to_value(&board).expect("board serializes");

    // Then: The cell exposes its bucket and hex colours, but not the handle
    let cell = &json["cells"][0];
    assert_eq!(json["columns"], 16);
    assert_eq!(cell["bucket"], "big_gain");
    assert_eq!(cell["colors"]["background"], "#FFD700");
    assert_eq!(cell["colors"]["foreground"], "#000000");
    assert_eq!(cell["row"], 0);
    assert!(cell.get("quote_handle").is_none());
}

// =============================================================================
// Ordering and concurrency
// =============================================================================

#[tokio::test]
async fn when_early_symbols_are_slow_output_still_follows_input_order() {
    // Given: The first symbols answer last
    let provider = FixtureProvider::seeded()
        .with_delay("A", Duration::from_millis(60))
        .with_delay("B", Duration::from_millis(40))
        .with_delay("C", Duration::from_millis(20));
    let config = BoardConfig::default()
        .with_columns(3)
        .with_max_concurrency(4);
    let builder = BoardBuilder::from_config(Arc::new(provider), &config).expect("valid config");

    // When: Resolution runs in parallel
    let board = builder.build(&holdings(&["A", "B", "C", "D", "E"])).await;

    // Then: Cells are in input order and positions come from the input index
    assert_eq!(symbols(&board), vec!["A", "B", "C", "D", "E"]);
    for (index, cell) in board.cells().iter().enumerate() {
        assert_eq!(cell.row(), index / 3);
        assert_eq!(cell.column(), index % 3);
    }
}

#[tokio::test]
async fn when_concurrency_is_bounded_provider_never_sees_more_requests() {
    // Given: Eight slow symbols and a limit of two outstanding requests
    let tickers = ["S1", "S2", "S3", "S4", "S5", "S6", "S7", "S8"];
    let mut provider = FixtureProvider::seeded();
    for ticker in tickers {
        provider = provider.with_delay(ticker, Duration::from_millis(15));
    }
    let provider = Arc::new(provider);
    let config = BoardConfig::default().with_max_concurrency(2);
    let builder = BoardBuilder::from_config(provider.clone(), &config).expect("valid config");

    // When: The board is built
    let board = builder.build(&holdings(&tickers)).await;

    // Then: Every symbol was resolved exactly once with at most two in flight
    assert_eq!(board.len(), tickers.len());
    assert_eq!(provider.history_calls().len(), tickers.len());
    assert!(provider.max_in_flight() <= 2);
}

#[tokio::test]
async fn when_concurrency_is_one_requests_are_sequential_in_input_order() {
    // Given: A sequential builder
    let provider = Arc::new(FixtureProvider::seeded());
    let builder = BoardBuilder::new(provider.clone(), columns(4));

    // When: The board is built
    builder.build(&holdings(&["MSFT", "$BRK.B", "NVDA"])).await;

    // Then: The provider saw one request at a time, in input order
    assert_eq!(provider.max_in_flight(), 1);
    assert_eq!(provider.history_calls(), vec!["MSFT", "BRK-B", "NVDA"]);
}

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn when_one_symbol_fails_other_cells_are_unchanged() {
    // Given: The same holdings against a healthy and a partly failing provider
    let tickers = ["AAPL", "MSFT", "NVDA", "TSLA"];
    let healthy = FixtureProvider::new()
        .with_quote("AAPL", 100.0, 103.5)
        .with_quote("MSFT", 100.0, 100.4)
        .with_quote("NVDA", 100.0, 97.0)
        .with_quote("TSLA", 100.0, 99.8);
    let failing = FixtureProvider::new()
        .with_quote("AAPL", 100.0, 103.5)
        .with_history_error("MSFT", SourceError::unavailable("connection reset"))
        .with_quote("NVDA", 100.0, 97.0)
        .with_quote("TSLA", 100.0, 99.8);

    // When: Both boards are built
    let expected = BoardBuilder::new(Arc::new(healthy), columns(3))
        .build(&holdings(&tickers))
        .await;
    let actual = BoardBuilder::new(Arc::new(failing), columns(3))
        .build(&holdings(&tickers))
        .await;

    // Then: Only the failed symbol's cell differs
    assert_eq!(actual.len(), expected.len());
    for (index, (got, want)) in actual.cells().iter().zip(expected.cells()).enumerate() {
        if index == 1 {
            assert_eq!(got.bucket(), Bucket::Missing);
            assert_eq!(got.label(), "MSFT\nNo Data");
            assert_eq!((got.row(), got.column()), (want.row(), want.column()));
        } else {
            assert_eq!(got.bucket(), want.bucket());
            assert_eq!(got.label(), want.label());
            assert_eq!((got.row(), got.column()), (want.row(), want.column()));
        }
    }

    let summary = actual.summary();
    assert_eq!(summary.resolved, 3);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].position, 2);
    assert_eq!(summary.failures[0].symbol.as_str(), "MSFT");
}

#[tokio::test]
async fn when_every_symbol_fails_board_still_has_one_cell_per_holding() {
    // Given: A provider that knows nothing and a blank ticker
    let builder = BoardBuilder::new(Arc::new(FixtureProvider::new()), columns(2));

    // When: The board is built
    let board = builder.build(&holdings(&["X1", "", "X3"])).await;

    // Then: All cells are missing, in place
    assert_eq!(board.len(), 3);
    assert!(board.cells().iter().all(|cell| cell.bucket() == Bucket::Missing));
    assert_eq!(board.cells()[1].label(), "\nNo Data");
    let codes: Vec<&str> = board.failures().iter().map(|f| f.code).collect();
    assert_eq!(codes, vec!["symbol.no_sessions", "symbol.empty", "symbol.no_sessions"]);
}

#[tokio::test]
async fn when_open_price_is_zero_cell_is_missing_not_infinite() {
    // Given: A session that opened at zero
    let provider = FixtureProvider::new().with_quote("ZERO", 0.0, 1.0);
    let builder = BoardBuilder::new(Arc::new(provider), columns(1));

    // When: The board is built
    let board = builder.build(&holdings(&["ZERO"])).await;

    // Then: The cell has no percent change
    let cell = &board.cells()[0];
    assert_eq!(cell.bucket(), Bucket::Missing);
    assert_eq!(cell.percent_change(), None);
    assert_eq!(board.failures()[0].code, "symbol.zero_open");
}

// =============================================================================
// Schemes and normalization
// =============================================================================

#[tokio::test]
async fn when_coarse_scheme_is_used_small_moves_render_neutral() {
    // Given: A half-percent gain
    let provider = FixtureProvider::new().with_quote("KO", 100.0, 100.5);
    let builder = BoardBuilder::new(Arc::new(provider), columns(1))
        .with_classifier(Classifier::new(Scheme::Coarse));

    // When: The board is built with the coarse table
    let board = builder.build(&holdings(&["KO"])).await;

    // Then: The cell is neutral but keeps its label
    assert_eq!(board.cells()[0].bucket(), Bucket::Neutral);
    assert_eq!(board.cells()[0].label(), "KO\n0.50%");
}

#[test]
fn normalization_is_idempotent_and_removes_every_dot() {
    for raw in ["BRK.B", " $BF.B ", "$$A.B.C", "  ", "", "$", "RDS.A\t", "msft"] {
        let once = CanonicalSymbol::normalize(raw);
        let twice = CanonicalSymbol::normalize(once.as_str());

        assert_eq!(once, twice, "raw {raw:?}");
        assert!(!once.as_str().contains('.'), "raw {raw:?}");
    }
    assert_eq!(CanonicalSymbol::normalize(" $BF.B ").as_str(), "BF-B");
}
