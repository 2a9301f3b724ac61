//! Builds the [`UnifiedCollection`] from a list of resources.
//!
//! Resources are fetched concurrently, each into its own buffer, and merged
//! in declaration order once every fetch has finished.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::{LoadError, ResourceFetchError};
use crate::fetch::TextSource;
use crate::model::{RawResource, Record, UnifiedCollection};
use crate::parser::{ColumnNames, parse_resource};

pub const DEFAULT_CONCURRENCY: usize = 4;

/// A collection built from the resources that loaded, plus the ones that did not.
#[derive(Debug)]
pub struct PartialLoad {
    pub collection: UnifiedCollection,
    pub failures: Vec<ResourceFetchError>,
}

impl PartialLoad {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Rejects the load if any resource failed.
    pub fn into_result(self, total: usize) -> Result<UnifiedCollection, LoadError> {
        if self.failures.is_empty() {
            Ok(self.collection)
        } else {
            Err(LoadError::Fetch {
                failures: self.failures,
                total,
            })
        }
    }
}

pub struct Loader<S> {
    source: Arc<S>,
    columns: ColumnNames,
    concurrency: usize,
}

impl<S: TextSource + 'static> Loader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            columns: ColumnNames::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_columns(mut self, columns: ColumnNames) -> Self {
        self.columns = columns;
        self
    }

    /// Maximum number of resources fetched at once, clamped to
    /// `1..=Semaphore::MAX_PERMITS`.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    /// Loads every resource, failing if any of them cannot be fetched.
    pub async fn load_all(&self, resources: &[RawResource]) -> Result<UnifiedCollection, LoadError> {
        self.load_partial(resources)
            .await
            .into_result(resources.len())
    }

    /// Loads every resource that can be fetched and reports the others.
    #[tracing::instrument(skip_all, fields(resources = resources.len(), concurrency = self.concurrency))]
    pub async fn load_partial(&self, resources: &[RawResource]) -> PartialLoad {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(resources.len());

        for resource in resources {
            let sem = semaphore.clone();
            let source = self.source.clone();
            let columns = self.columns.clone();
            let resource = resource.clone();

            let span = tracing::info_span!("load_resource", identifier = %resource.identifier);

            let task = tokio::spawn(
                async move {
                    let _permit = sem.acquire_owned().await;
                    load_one(&*source, &resource, &columns).await
                }
                .instrument(span),
            );

            tasks.push(task);
        }

        let mut parts = Vec::with_capacity(resources.len());
        let mut failures = Vec::new();

        // Await in declaration order so merging never depends on completion order.
        for (resource, task) in resources.iter().zip(tasks) {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => Err(ResourceFetchError {
                    identifier: resource.identifier.clone(),
                    reason: format!("load task failed: {e}"),
                }),
            };

            match outcome {
                Ok(records) => parts.push((resource.identifier.clone(), records)),
                Err(e) => {
                    error!(identifier = %e.identifier, reason = %e.reason, "Resource fetch failed");
                    failures.push(e);
                }
            }
        }

        let collection = UnifiedCollection::from_parts(parts);
        info!(
            records = collection.len(),
            loaded = collection.segments().len(),
            failed = failures.len(),
            "Dataset loaded"
        );

        PartialLoad {
            collection,
            failures,
        }
    }
}

async fn load_one<S: TextSource + ?Sized>(
    source: &S,
    resource: &RawResource,
    columns: &ColumnNames,
) -> Result<Vec<Record>, ResourceFetchError> {
    let text = source
        .fetch_text(&resource.identifier)
        .await
        .map_err(|e| ResourceFetchError::new(&resource.identifier, &e))?;

    let records = parse_resource(&text, resource, columns);
    if records.is_empty() {
        warn!("Resource contains no data rows");
    } else {
        debug!(records = records.len(), "Resource parsed");
    }

    Ok(records)
}
