pub mod cache;
pub mod fx;
pub mod series;

// Re-export the core types for convenient access (e.g. `use crate::market_data::PriceSeries`).
pub use cache::{SeriesCache, SeriesKey};
pub use fx::{convert_series, Currency};
pub use series::{Bar, DerivedSeries, PriceSeries, SeriesError};
