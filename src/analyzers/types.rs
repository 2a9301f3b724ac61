//! Data types produced by the aggregation pipeline.

use serde::Serialize;

use crate::model::Dimension;

pub const DELAY_AXIS_LABEL: &str = "Mean delay (min)";

/// Mean delay of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub category: String,
    pub mean_delay: f64,
    /// Number of records averaged.
    pub count: usize,
}

/// Category/value series for one dimension and selector, sorted by category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSeries {
    pub dimension: Dimension,
    pub selector: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<SeriesPoint>,
}

impl AggregateSeries {
    pub fn categories(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.category.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.mean_delay).collect()
    }

    /// `(category, mean)` pairs in category order.
    pub fn pairs(&self) -> Vec<(&str, f64)> {
        self.points
            .iter()
            .map(|p| (p.category.as_str(), p.mean_delay))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
