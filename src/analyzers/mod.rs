//! Grouped delay statistics.
//!
//! Filters the unified collection on a dimension and selector, groups on the
//! other dimension and averages delays per group.

pub mod aggregate;
pub mod types;
pub mod utility;

pub use aggregate::{aggregate, aggregate_all, distinct_field_values, distinct_values};
pub use types::{AggregateSeries, SeriesPoint};
