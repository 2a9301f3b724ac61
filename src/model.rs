//! Core data types: resources, normalized records and the unified collection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// How a resource writes fractional delay values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimalFormat {
    /// `12,5` means twelve and a half; commas become points before parsing.
    Comma,
    /// `12.5`; the text is parsed as-is.
    Point,
}

/// A named input file plus the parse conventions that apply to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResource {
    pub identifier: String,
    pub fallback_locality: Option<String>,
    pub decimal: DecimalFormat,
    pub delimiter: u8,
}

impl RawResource {
    /// Creates a comma-delimited resource whose fallback locality is derived
    /// from the identifier.
    pub fn new(identifier: impl Into<String>, decimal: DecimalFormat) -> Self {
        let identifier = identifier.into();
        let fallback_locality = fallback_locality_for(&identifier);
        Self {
            identifier,
            fallback_locality,
            decimal,
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Replaces the derived fallback locality.
    pub fn with_fallback_locality(mut self, locality: Option<String>) -> Self {
        self.fallback_locality = locality;
        self
    }
}

/// Derives a locality from a file-like identifier: the last path segment,
/// cut at its first `_`.
///
/// `albi_retard_arrivee_intercites.csv` gives `albi`. A name without `_` is
/// returned whole.
pub fn fallback_locality_for(identifier: &str) -> Option<String> {
    let file_name = identifier.rsplit('/').next().unwrap_or(identifier);
    let token = file_name.split('_').next().unwrap_or(file_name).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// One normalized data row.
///
/// `fields` holds every raw column of the row keyed by its lower-cased header;
/// the typed fields are derived from it during parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub locality: Option<String>,
    pub cause: Option<String>,
    pub delay: Option<f64>,
    pub fields: BTreeMap<String, String>,
}

impl Record {
    /// Raw value of a column, if the row had it.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Whether the record can take part in an aggregation.
    pub fn is_aggregatable(&self) -> bool {
        self.cause.is_some() && self.delay.is_some()
    }
}

/// The records contributed by a single resource, as a range of the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub identifier: String,
    pub range: Range<usize>,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Every record of every loaded resource, in resource declaration order.
///
/// Built once by the loader and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct UnifiedCollection {
    records: Vec<Record>,
    segments: Vec<Segment>,
}

impl UnifiedCollection {
    /// Concatenates per-resource record buffers in the order given.
    pub fn from_parts(parts: Vec<(String, Vec<Record>)>) -> Self {
        let total = parts.iter().map(|(_, records)| records.len()).sum();
        let mut records = Vec::with_capacity(total);
        let mut segments = Vec::with_capacity(parts.len());

        for (identifier, part) in parts {
            let start = records.len();
            records.extend(part);
            segments.push(Segment {
                identifier,
                range: start..records.len(),
            });
        }

        Self { records, segments }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Identifier of the resource the record at `index` came from.
    pub fn source_of(&self, index: usize) -> Option<&str> {
        self.segments
            .iter()
            .find(|s| s.range.contains(&index))
            .map(|s| s.identifier.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a UnifiedCollection {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Which field partitions an aggregation.
///
/// The selector filters on this field; groups are formed on the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    ByLocality,
    ByCause,
}

impl Dimension {
    /// The field the selector is compared against.
    pub fn key<'r>(&self, record: &'r Record) -> Option<&'r str> {
        match self {
            Dimension::ByLocality => record.locality.as_deref(),
            Dimension::ByCause => record.cause.as_deref(),
        }
    }

    /// The field records are grouped on.
    pub fn group_key<'r>(&self, record: &'r Record) -> Option<&'r str> {
        match self {
            Dimension::ByLocality => record.cause.as_deref(),
            Dimension::ByCause => record.locality.as_deref(),
        }
    }

    /// Axis label for the categories of a series along this dimension.
    pub fn category_label(&self) -> &'static str {
        match self {
            Dimension::ByLocality => "Causes",
            Dimension::ByCause => "Localities",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::ByLocality => write!(f, "locality"),
            Dimension::ByCause => write!(f, "cause"),
        }
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "locality" | "ville" | "by_locality" => Ok(Dimension::ByLocality),
            "cause" | "by_cause" => Ok(Dimension::ByCause),
            other => Err(format!(
                "unknown dimension `{other}` (expected `locality` or `cause`)"
            )),
        }
    }
}
