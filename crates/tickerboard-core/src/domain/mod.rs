//! # Domain Models
//!
//! Value types shared by the quote-to-cell pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CanonicalSymbol`] | Normalized tradable ticker |
//! | [`Holding`] | One input row from the holdings source |
//! | [`Session`] | Daily open/close pair for one trading date |
//! | [`ClosePoint`] | Dated close shown in price history |
//! | [`Period`] | History window (`1d`, `5d`) |
//! | [`InfoMap`] | Loosely-typed descriptive fields for a symbol |

mod holding;
mod session;
mod symbol;

pub use holding::Holding;
pub use session::{ClosePoint, InfoMap, Period, Session};
pub use symbol::CanonicalSymbol;
