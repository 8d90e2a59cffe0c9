mod fixture;
mod yahoo;

pub use fixture::{FixtureProvider, FIXTURE_DATE};
pub use yahoo::YahooProvider;
