//! Output formatting and persistence for aggregate series.
//!
//! Supports pretty-printing, JSON reports and CSV export.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use tracing::{debug, info};

use crate::analyzers::AggregateSeries;
use crate::model::Dimension;

/// Series wrapped with the time they were computed, as written to JSON.
#[derive(Debug, Serialize)]
pub struct SeriesReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub series: &'a [AggregateSeries],
}

impl<'a> SeriesReport<'a> {
    pub fn new(series: &'a [AggregateSeries]) -> Self {
        Self {
            generated_at: Utc::now(),
            series,
        }
    }
}

/// One CSV row: a category of a series.
#[derive(Debug, Serialize)]
struct SeriesRow<'a> {
    dimension: Dimension,
    selector: &'a str,
    category: &'a str,
    mean_delay: f64,
    count: usize,
}

/// Logs a series using Rust's debug pretty-print format.
pub fn print_pretty(series: &AggregateSeries) {
    debug!("{:#?}", series);
}

/// Renders a series as an aligned text table.
pub fn render_table(series: &AggregateSeries) -> String {
    let mut out = format!("{}\n", series.title);
    if series.is_empty() {
        out.push_str("(no matching records)\n");
        return out;
    }

    let width = series
        .points
        .iter()
        .map(|p| p.category.chars().count())
        .chain(std::iter::once(series.x_label.chars().count()))
        .max()
        .unwrap_or(0);

    out.push_str(&format!("{:<width$}  {}  n\n", series.x_label, series.y_label));
    for point in &series.points {
        out.push_str(&format!(
            "{:<width$}  {:>16.2}  {}\n",
            point.category, point.mean_delay, point.count
        ));
    }
    out
}

/// Serializes series as a pretty-printed JSON report.
pub fn to_json(series: &[AggregateSeries]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&SeriesReport::new(series))?)
}

/// Writes series as a JSON report, replacing any existing file.
pub fn write_json(path: &str, series: &[AggregateSeries]) -> Result<()> {
    std::fs::write(path, to_json(series)?)?;
    info!(path, series = series.len(), "JSON report written");
    Ok(())
}

/// Writes series to a CSV file, one row per category, replacing any existing file.
pub fn write_csv(path: &str, series: &[AggregateSeries]) -> Result<()> {
    let rows = write_csv_to(File::create(path)?, series)?;
    debug!(path, rows, "CSV written");
    Ok(())
}

/// Writes series as CSV to any writer and returns the number of data rows.
pub fn write_csv_to<W: Write>(out: W, series: &[AggregateSeries]) -> Result<usize> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(out);

    let mut rows = 0usize;
    for s in series {
        for point in &s.points {
            writer.serialize(SeriesRow {
                dimension: s.dimension,
                selector: &s.selector,
                category: &point.category,
                mean_delay: point.mean_delay,
                count: point.count,
            })?;
            rows += 1;
        }
    }
    writer.flush()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::SeriesPoint;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn series() -> AggregateSeries {
        AggregateSeries {
            dimension: Dimension::ByLocality,
            selector: "albi".into(),
            title: "Mean delay by cause in albi".into(),
            x_label: "Causes".into(),
            y_label: "Mean delay (min)".into(),
            points: vec![
                SeriesPoint {
                    category: "Greve".into(),
                    mean_delay: 3.0,
                    count: 1,
                },
                SeriesPoint {
                    category: "Meteo".into(),
                    mean_delay: 7.5,
                    count: 2,
                },
            ],
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&series());
    }

    #[test]
    fn test_render_table_lists_every_category() {
        let table = render_table(&series());
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Mean delay by cause in albi");
        assert!(lines[2].starts_with("Greve"));
        assert!(lines[3].contains("7.50"));
    }

    #[test]
    fn test_render_table_empty_series() {
        let mut s = series();
        s.points.clear();
        assert!(render_table(&s).contains("no matching records"));
    }

    #[test]
    fn test_to_json_wraps_series() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&[series()]).unwrap()).unwrap();
        assert!(json["generated_at"].is_string());
        assert_eq!(json["series"][0]["selector"], "albi");
        assert_eq!(json["series"][0]["points"][0]["category"], "Greve");
    }

    #[test]
    fn test_write_json_creates_file() {
        let path = temp_path("train_delays_test_report.json");
        let _ = fs::remove_file(&path);

        write_json(&path, &[series()]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"mean_delay\": 7.5"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_csv_one_row_per_point() {
        let path = temp_path("train_delays_test_series.csv");
        let _ = fs::remove_file(&path);

        write_csv(&path, &[series(), series()]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        // 1 header + 2 points per series
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "dimension,selector,category,mean_delay,count");
        assert_eq!(lines[1], "by_locality,albi,Greve,3.0,1");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_csv_to_writer() {
        let mut buf = Vec::new();
        let rows = write_csv_to(&mut buf, &[series()]).unwrap();
        assert_eq!(rows, 2);

        let content = String::from_utf8(buf).unwrap();
        assert_eq!(
            content,
            "dimension,selector,category,mean_delay,count\n\
             by_locality,albi,Greve,3.0,1\n\
             by_locality,albi,Meteo,7.5,2\n"
        );
    }

    #[test]
    fn test_write_csv_replaces_existing_file() {
        let path = temp_path("train_delays_test_replace.csv");
        write_csv(&path, &[series()]).unwrap();
        write_csv(&path, &[series()]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.starts_with("dimension")).count();
        assert_eq!(header_count, 1);

        fs::remove_file(&path).unwrap();
    }
}
