//! Delimited-text parser for delay exports.
//!
//! The first line is the header; every following line is mapped onto it
//! positionally. Nothing in here fails: short rows lose their trailing keys
//! and unparseable delays become absent.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::model::{DecimalFormat, RawResource, Record};

/// Header names that feed the typed fields of a [`Record`].
///
/// For each field the first listed column holding a non-empty value wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub locality: Vec<String>,
    pub cause: Vec<String>,
    pub delay: Vec<String>,
    /// Upper-case localities so that a file-name fallback (`nimes`) and a
    /// column value (`Nimes`) land in the same group. Off by default.
    pub normalize_locality: bool,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            locality: vec!["ville".into(), "locality".into()],
            cause: vec!["cause".into()],
            delay: vec!["retard".into(), "delay".into()],
            normalize_locality: false,
        }
    }
}

/// Per-resource parse settings.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub delimiter: u8,
    pub decimal: DecimalFormat,
    pub columns: ColumnNames,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            decimal: DecimalFormat::Point,
            columns: ColumnNames::default(),
        }
    }
}

impl ParseOptions {
    pub fn for_resource(resource: &RawResource, columns: &ColumnNames) -> Self {
        Self {
            delimiter: resource.delimiter,
            decimal: resource.decimal,
            columns: columns.clone(),
        }
    }
}

/// Parses a whole resource into records.
///
/// `fallback_locality` fills in the locality of rows that have none.
pub fn parse(text: &str, fallback_locality: Option<&str>, options: &ParseOptions) -> Vec<Record> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text).trim_end();
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(text.as_bytes());

    let mut rows = reader.records();
    let headers: Vec<String> = match rows.next() {
        Some(Ok(header)) => header.iter().map(|h| h.trim().to_lowercase()).collect(),
        _ => return Vec::new(),
    };

    let mut records = Vec::new();
    let mut short_rows = 0usize;

    for row in rows {
        // Input is already valid UTF-8 and quoting is off, so rows cannot fail.
        let Ok(row) = row else { continue };

        if row.len() == 1 && row[0].trim().is_empty() {
            continue;
        }
        if row.len() < headers.len() {
            short_rows += 1;
        }

        let fields: BTreeMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .map(|(h, v)| (h.clone(), v.trim().to_string()))
            .collect();

        records.push(normalize(fields, fallback_locality, options));
    }

    debug!(
        columns = headers.len(),
        records = records.len(),
        short_rows,
        "Parsed resource"
    );

    records
}

/// Parses a resource using the conventions declared on it.
pub fn parse_resource(text: &str, resource: &RawResource, columns: &ColumnNames) -> Vec<Record> {
    parse(
        text,
        resource.fallback_locality.as_deref(),
        &ParseOptions::for_resource(resource, columns),
    )
}

/// Converts a delay cell to minutes.
///
/// Empty, non-numeric and non-finite values give `None`.
pub fn coerce_delay(raw: &str, decimal: DecimalFormat) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = match decimal {
        DecimalFormat::Comma => raw.replace(',', ".").parse::<f64>(),
        DecimalFormat::Point => raw.parse::<f64>(),
    };

    parsed.ok().filter(|v| v.is_finite())
}

fn normalize(
    fields: BTreeMap<String, String>,
    fallback_locality: Option<&str>,
    options: &ParseOptions,
) -> Record {
    let columns = &options.columns;

    let locality = first_non_empty(&fields, &columns.locality)
        .or(fallback_locality)
        .map(|l| {
            if columns.normalize_locality {
                l.trim().to_uppercase()
            } else {
                l.to_string()
            }
        })
        .filter(|l| !l.is_empty());
    let cause = first_non_empty(&fields, &columns.cause).map(str::to_string);
    let delay = first_non_empty(&fields, &columns.delay)
        .and_then(|raw| coerce_delay(raw, options.decimal));

    Record {
        locality,
        cause,
        delay,
        fields,
    }
}

fn first_non_empty<'f>(fields: &'f BTreeMap<String, String>, names: &[String]) -> Option<&'f str> {
    names
        .iter()
        .filter_map(|name| fields.get(name))
        .map(String::as_str)
        .find(|v| !v.is_empty())
}
