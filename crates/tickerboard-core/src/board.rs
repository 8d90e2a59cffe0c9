//! Board Builder: holdings in, positioned cells out.
//!
//! Each holding runs through normalize, resolve, classify. Resolution may run
//! concurrently (bounded by `max_concurrency`), but results are collected in
//! input order and grid coordinates are derived from the input index only:
//! `row = index / columns`, `column = index % columns`.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::classifier::{Bucket, Classifier, ColorPair};
use crate::config::BoardConfig;
use crate::detail::NO_DATA;
use crate::provider::QuoteProvider;
use crate::resolver::{QuoteHandle, QuoteResolver, QuoteResult};
use crate::throttling::RequestThrottle;
use crate::{CanonicalSymbol, Holding, ValidationError};

/// Render-ready board cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    symbol: CanonicalSymbol,
    label: String,
    bucket: Bucket,
    colors: ColorPair,
    percent_change: Option<f64>,
    row: usize,
    column: usize,
    #[serde(skip)]
    quote_handle: Option<QuoteHandle>,
}

impl Cell {
    pub fn symbol(&self) -> &CanonicalSymbol {
        &self.symbol
    }

    /// `SYMBOL\n+1.23%` or `SYMBOL\nNo Data`.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub const fn bucket(&self) -> Bucket {
        self.bucket
    }

    pub const fn colors(&self) -> ColorPair {
        self.colors
    }

    pub const fn percent_change(&self) -> Option<f64> {
        self.percent_change
    }

    pub const fn row(&self) -> usize {
        self.row
    }

    pub const fn column(&self) -> usize {
        self.column
    }

    pub fn quote_handle(&self) -> Option<&QuoteHandle> {
        self.quote_handle.as_ref()
    }

    /// Only resolved cells can be opened for detail.
    pub const fn is_selectable(&self) -> bool {
        self.quote_handle.is_some()
    }
}

/// A symbol that could not be resolved during a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildFailure {
    /// 1-based position in the holdings input.
    pub position: usize,
    pub symbol: CanonicalSymbol,
    pub code: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub total: usize,
    pub resolved: usize,
    pub unavailable: usize,
    pub buckets: BTreeMap<Bucket, usize>,
    pub failures: Vec<BuildFailure>,
}

/// Immutable result of one build pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Board {
    columns: NonZeroUsize,
    cells: Vec<Cell>,
    #[serde(skip)]
    failures: Vec<BuildFailure>,
}

impl Board {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub const fn columns(&self) -> usize {
        self.columns.get()
    }

    pub fn rows(&self) -> usize {
        self.cells.len().div_ceil(self.columns.get())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells grouped by grid row, top to bottom.
    pub fn grid_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.columns.get())
    }

    pub fn cell_at(&self, row: usize, column: usize) -> Option<&Cell> {
        if column >= self.columns.get() {
            return None;
        }
        row.checked_mul(self.columns.get())
            .and_then(|start| start.checked_add(column))
            .and_then(|index| self.cells.get(index))
    }

    /// First cell whose symbol matches `raw` after normalization.
    pub fn find(&self, raw: &str) -> Option<&Cell> {
        let symbol = CanonicalSymbol::normalize(raw);
        self.cells.iter().find(|cell| cell.symbol == symbol)
    }

    pub fn failures(&self) -> &[BuildFailure] {
        &self.failures
    }

    pub fn summary(&self) -> BoardSummary {
        let mut buckets = BTreeMap::new();
        for cell in &self.cells {
            *buckets.entry(cell.bucket).or_insert(0) += 1;
        }
        let resolved = self.cells.iter().filter(|cell| cell.is_selectable()).count();

        BoardSummary {
            total: self.cells.len(),
            resolved,
            unavailable: self.cells.len() - resolved,
            buckets,
            failures: self.failures.clone(),
        }
    }
}

/// Orchestrates the per-holding pipeline.
#[derive(Debug, Clone)]
pub struct BoardBuilder {
    resolver: QuoteResolver,
    classifier: Classifier,
    columns: NonZeroUsize,
    max_concurrency: usize,
}

impl BoardBuilder {
    /// Sequential, unthrottled builder with the fine colour scheme.
    pub fn new(provider: Arc<dyn QuoteProvider>, columns: NonZeroUsize) -> Self {
        Self {
            resolver: QuoteResolver::new(provider),
            classifier: Classifier::default(),
            columns,
            max_concurrency: 1,
        }
    }

    pub fn from_config(
        provider: Arc<dyn QuoteProvider>,
        config: &BoardConfig,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            resolver: QuoteResolver::new(provider)
                .with_throttle(RequestThrottle::from_config(config)),
            classifier: Classifier::new(config.scheme),
            columns: config.grid_columns()?,
            max_concurrency: config.max_concurrency,
        })
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub const fn columns(&self) -> usize {
        self.columns.get()
    }

    pub fn resolver(&self) -> &QuoteResolver {
        &self.resolver
    }

    /// Runs the full pipeline from holding #0. Never fails: unresolved
    /// holdings become `Missing` cells in place.
    pub async fn build(&self, holdings: &[Holding]) -> Board {
        let started = Instant::now();

        let symbols: Vec<CanonicalSymbol> = holdings
            .iter()
            .map(|holding| CanonicalSymbol::normalize(&holding.raw_ticker))
            .collect();

        let results: Vec<QuoteResult> = stream::iter(symbols)
            .map(|symbol| self.resolver.resolve(symbol))
            .buffered(self.max_concurrency.max(1))
            .collect()
            .await;

        let board = self.assemble(results);
        info!(
            total = board.len(),
            resolved = board.len() - board.failures.len(),
            unavailable = board.failures.len(),
            columns = board.columns(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "board built"
        );
        board
    }

    /// Turns input-ordered results into positioned cells.
    fn assemble(&self, results: Vec<QuoteResult>) -> Board {
        let columns = self.columns.get();
        let mut cells = Vec::with_capacity(results.len());
        let mut failures = Vec::new();

        for (index, result) in results.into_iter().enumerate() {
            let percent_change = result.percent_change();
            let bucket = self.classifier.classify(percent_change);

            let (symbol, quote_handle) = match result {
                QuoteResult::Success { symbol, handle, .. } => (symbol, Some(handle)),
                QuoteResult::Unavailable { symbol, reason } => {
                    warn!(
                        symbol = %symbol,
                        position = index + 1,
                        code = reason.code(),
                        error = %reason,
                        "symbol unresolvable, rendering as missing"
                    );
                    failures.push(BuildFailure {
                        position: index + 1,
                        symbol: symbol.clone(),
                        code: reason.code(),
                        reason: reason.to_string(),
                    });
                    (symbol, None)
                }
            };

            cells.push(Cell {
                label: cell_label(&symbol, percent_change),
                symbol,
                bucket,
                colors: bucket.colors(),
                percent_change,
                row: index / columns,
                column: index % columns,
                quote_handle,
            });
        }

        Board {
            columns: self.columns,
            cells,
            failures,
        }
    }
}

fn cell_label(symbol: &CanonicalSymbol, percent_change: Option<f64>) -> String {
    match percent_change {
        Some(change) => format!("{symbol}\n{change:.2}%"),
        None => format!("{symbol}\n{NO_DATA}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SourceError;
    use crate::FixtureProvider;

    fn columns(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).expect("non-zero")
    }

    #[test]
    fn labels_use_two_decimals_or_no_data() {
        let symbol = CanonicalSymbol::normalize("AAPL");
        assert_eq!(cell_label(&symbol, Some(2.0)), "AAPL\n2.00%");
        assert_eq!(cell_label(&symbol, Some(-1.2345)), "AAPL\n-1.23%");
        assert_eq!(cell_label(&symbol, None), "AAPL\nNo Data");
    }

    #[tokio::test]
    async fn coordinates_follow_row_major_fill() {
        let builder = BoardBuilder::new(Arc::new(FixtureProvider::seeded()), columns(3));
        let holdings: Vec<Holding> = ["A", "B", "C", "D", "E", "F", "G"]
            .into_iter()
            .map(Holding::from)
            .collect();

        let board = builder.build(&holdings).await;

        assert_eq!(board.len(), 7);
        assert_eq!(board.rows(), 3);
        for (index, cell) in board.cells().iter().enumerate() {
            assert_eq!(cell.row(), index / 3);
            assert_eq!(cell.column(), index % 3);
        }
        assert_eq!(board.cell_at(2, 0).map(|c| c.symbol().as_str()), Some("G"));
        assert!(board.cell_at(2, 1).is_none());
        assert!(board.cell_at(0, 3).is_none());
    }

    #[tokio::test]
    async fn failed_symbol_becomes_missing_cell_in_place() {
        let provider = FixtureProvider::new()
            .with_quote("AAPL", 100.0, 102.0)
            .with_history_error("BAD", SourceError::malformed("bad payload"))
            .with_quote("MSFT", 200.0, 201.0);
        let builder = BoardBuilder::new(Arc::new(provider), columns(2));
        let holdings: Vec<Holding> = ["AAPL", "BAD", "MSFT"].into_iter().map(Holding::from).collect();

        let board = builder.build(&holdings).await;

        let bad = &board.cells()[1];
        assert_eq!(bad.bucket(), Bucket::Missing);
        assert_eq!(bad.label(), "BAD\nNo Data");
        assert!(!bad.is_selectable());
        assert_eq!(board.cells()[2].bucket(), Bucket::SmallGain);
        assert_eq!((board.cells()[2].row(), board.cells()[2].column()), (1, 0));

        let summary = board.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.resolved, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].position, 2);
        assert_eq!(summary.failures[0].code, "source.malformed");
        assert_eq!(summary.buckets.get(&Bucket::Missing), Some(&1));
    }

    #[tokio::test]
    async fn empty_holdings_build_an_empty_board() {
        let builder = BoardBuilder::new(Arc::new(FixtureProvider::new()), columns(4));

        let board = builder.build(&[]).await;

        assert!(board.is_empty());
        assert_eq!(board.rows(), 0);
        assert_eq!(board.summary().total, 0);
    }

    #[tokio::test]
    async fn find_normalizes_the_query() {
        let provider = FixtureProvider::new().with_quote("BRK.B", 50.0, 49.4);
        let builder = BoardBuilder::new(Arc::new(provider), columns(2));

        let board = builder.build(&[Holding::new("$BRK.B")]).await;

        let cell = board.find(" BRK.B ").expect("present");
        assert_eq!(cell.symbol().as_str(), "BRK-B");
        assert_eq!(cell.bucket(), Bucket::StrongLoss);
    }

    #[test]
    fn cell_at_out_of_range_rows_return_none() {
        let board = BoardBuilder::new(Arc::new(FixtureProvider::new()), columns(3))
            .assemble(Vec::new());

        assert!(board.cell_at(usize::MAX, 0).is_none());
        assert!(board.cell_at(usize::MAX / 2, 2).is_none());
    }

    #[tokio::test]
    async fn build_runs_inside_a_spawned_task() {
        let builder = Arc::new(
            BoardBuilder::new(Arc::new(FixtureProvider::seeded()), columns(2))
                .with_max_concurrency(2),
        );
        let holdings: Vec<Holding> = ["AAPL", "MSFT", "NVDA"].into_iter().map(Holding::from).collect();

        let task = {
            let builder = Arc::clone(&builder);
            tokio::spawn(async move { builder.build(&holdings).await })
        };
        let board = task.await.expect("build task");

        assert_eq!(board.len(), 3);
        assert_eq!(board.cells()[2].symbol().as_str(), "NVDA");
    }

    #[test]
    fn from_config_rejects_zero_columns() {
        let config = BoardConfig::default().with_columns(0);
        let result = BoardBuilder::from_config(Arc::new(FixtureProvider::new()), &config);
        assert!(matches!(result, Err(ValidationError::ZeroColumns)));
    }
}
