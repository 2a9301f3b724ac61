pub mod analyzers;
pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod model;
pub mod output;
pub mod parser;

pub use analyzers::{AggregateSeries, SeriesPoint, aggregate, aggregate_all, distinct_values};
pub use error::{LoadError, ResourceFetchError};
pub use loader::{Loader, PartialLoad};
pub use model::{DecimalFormat, Dimension, RawResource, Record, UnifiedCollection};
