//! # Tickerboard Core
//!
//! Quote-to-cell pipeline for the tickerboard holdings heatmap.
//!
//! ## Overview
//!
//! This crate turns an ordered list of holdings into an immutable [`Board`]
//! of colour-coded cells:
//!
//! - **Ticker normalization** of raw holdings symbols ([`CanonicalSymbol`])
//! - **Quote resolution** into typed results, isolating per-symbol failures
//! - **Classification** of percent changes into fixed colour buckets
//! - **Board building** with deterministic row-major grid coordinates
//! - **Detail lookup** for a single selected cell
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Quote providers (Yahoo, in-memory fixture) |
//! | [`board`] | Board Builder, cells and build summary |
//! | [`classifier`] | Buckets, colour table and classification schemes |
//! | [`config`] | Board configuration with environment overrides |
//! | [`detail`] | Detail Lookup and its text layout |
//! | [`domain`] | Symbols, holdings, sessions, info maps |
//! | [`error`] | Core error types |
//! | [`holdings`] | CSV holdings source |
//! | [`http_client`] | HTTP client abstraction |
//! | [`provider`] | Quote provider trait and provider errors |
//! | [`refresh`] | Single-flight board refresh |
//! | [`resolver`] | Quote Resolver |
//! | [`throttling`] | Bounded, rate-limited provider access |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickerboard_core::{load_holdings, BoardBuilder, BoardConfig, YahooProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BoardConfig::from_env()?;
//!     let holdings = load_holdings("VOO.csv")?;
//!
//!     let builder = BoardBuilder::from_config(Arc::new(YahooProvider::default()), &config)?;
//!     let board = builder.build(&holdings).await;
//!
//!     for cell in board.cells() {
//!         println!("({}, {}) {:?}", cell.row(), cell.column(), cell.label());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Holdings (CSV)  │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Board Builder   │────▶│ Classifier       │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Quote Resolver  │────▶│ Request Throttle │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Quote Provider  │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! The board pipeline never returns an error. A symbol that cannot be
//! resolved becomes a `Missing` cell and is listed in the board summary:
//!
//! ```rust,ignore
//! use tickerboard_core::Board;
//!
//! fn report(board: &Board) {
//!     for failure in board.summary().failures {
//!         eprintln!("#{} {}: {}", failure.position, failure.symbol, failure.reason);
//!     }
//! }
//! ```

pub mod adapters;
pub mod board;
pub mod classifier;
pub mod config;
pub mod detail;
pub mod domain;
pub mod error;
pub mod holdings;
pub mod http_client;
pub mod provider;
pub mod refresh;
pub mod resolver;
pub mod throttling;

// Adapter implementations
pub use adapters::{FixtureProvider, YahooProvider, FIXTURE_DATE};

// Board Builder
pub use board::{Board, BoardBuilder, BoardSummary, BuildFailure, Cell};

// Classification
pub use classifier::{classify, Bucket, Classifier, Color, ColorPair, Scheme};

// Configuration
pub use config::BoardConfig;

// Detail Lookup
pub use detail::{DetailLookup, DetailOutcome, DetailView, PriceHistory};

// Domain models
pub use domain::{CanonicalSymbol, ClosePoint, Holding, InfoMap, Period, Session};

// Error types
pub use error::{CoreError, DetailUnavailable, UnresolvableReason, ValidationError};

// Holdings source
pub use holdings::{load_holdings, read_holdings};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Provider contract
pub use provider::{ProviderFuture, QuoteProvider, SourceError, SourceErrorKind};

// Refresh
pub use refresh::{BoardStore, RefreshOutcome};

// Quote Resolver
pub use resolver::{percent_change, QuoteHandle, QuoteResolver, QuoteResult};

// Throttling
pub use throttling::{RequestThrottle, ThrottlePermit};
