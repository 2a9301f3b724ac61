//! Load failures surfaced to callers.

use thiserror::Error;

/// A resource whose text could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch `{identifier}`: {reason}")]
pub struct ResourceFetchError {
    pub identifier: String,
    pub reason: String,
}

impl ResourceFetchError {
    pub fn new(identifier: impl Into<String>, err: &anyhow::Error) -> Self {
        Self {
            identifier: identifier.into(),
            reason: format!("{err:#}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    /// At least one resource failed; no collection was built.
    #[error("{count} of {total} resources could not be fetched", count = .failures.len())]
    Fetch {
        failures: Vec<ResourceFetchError>,
        total: usize,
    },
    #[error("invalid source configuration: {0}")]
    Config(String),
}

impl LoadError {
    /// The failed resources, if this is a fetch failure.
    pub fn failures(&self) -> &[ResourceFetchError] {
        match self {
            LoadError::Fetch { failures, .. } => failures,
            LoadError::Config(_) => &[],
        }
    }
}
