use train_delays::analyzers::{aggregate, aggregate_all, distinct_field_values, distinct_values};
use train_delays::config::SourceConfig;
use train_delays::fetch::FileSource;
use train_delays::parser::ColumnNames;
use train_delays::{DecimalFormat, Dimension, LoadError, Loader, RawResource, UnifiedCollection};

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_config() -> SourceConfig {
    SourceConfig::load(&format!("{FIXTURES}/sources.json")).expect("fixture config")
}

async fn load_fixtures() -> UnifiedCollection {
    let config = fixture_config();
    let resources = config.raw_resources().unwrap();
    Loader::new(FileSource::new(FIXTURES))
        .with_concurrency(config.concurrency)
        .load_all(&resources)
        .await
        .expect("fixtures load")
}

#[tokio::test]
async fn test_full_pipeline_record_counts() {
    let collection = load_fixtures().await;

    assert_eq!(collection.len(), 11);
    let counts: Vec<_> = collection.segments().iter().map(|s| s.len()).collect();
    assert_eq!(counts, vec![4, 4, 3]);
    assert_eq!(
        collection.source_of(10),
        Some("toulouse_matabiau_retard_arrivee+depart_tgv.csv")
    );
}

#[tokio::test]
async fn test_full_pipeline_normalization() {
    let collection = load_fixtures().await;
    let records = collection.records();

    // albi has no locality column
    assert_eq!(records[0].locality.as_deref(), Some("albi"));
    assert_eq!(records[0].get("date"), Some("2023-01"));
    // a comma decimal in a comma-delimited file is cut at the separator
    assert_eq!(records[0].delay, Some(12.0));
    assert_eq!(records[3].cause, None);

    // nimes is `;`-delimited with comma decimals
    assert_eq!(records[4].delay, Some(3.5));
    assert_eq!(records[6].locality.as_deref(), Some("nimes"));
    assert_eq!(records[7].delay, None);
    assert_eq!(records[7].get("train"), Some("IC 4757"));

    // toulouse has a BOM, CRLF endings and a short last row
    assert_eq!(records[8].get("ville"), Some("Toulouse"));
    assert_eq!(records[8].delay, Some(10.5));
    assert_eq!(records[10].delay, None);
}

#[tokio::test]
async fn test_full_pipeline_distinct_values() {
    let collection = load_fixtures().await;

    assert_eq!(
        distinct_values(&collection, Dimension::ByLocality),
        vec!["Nimes", "Toulouse", "albi", "nimes"]
    );
    assert_eq!(
        distinct_values(&collection, Dimension::ByCause),
        vec!["Greve", "Meteo", "Travaux"]
    );
    assert_eq!(distinct_field_values(&collection, "train").len(), 4);
}

#[tokio::test]
async fn test_full_pipeline_aggregates() {
    let collection = load_fixtures().await;

    let albi = aggregate(&collection, Dimension::ByLocality, "albi");
    assert_eq!(albi.pairs(), vec![("Meteo", 9.5), ("Travaux", 4.0)]);

    let nimes = aggregate(&collection, Dimension::ByLocality, "Nimes");
    assert_eq!(nimes.pairs(), vec![("Greve", 20.0), ("Meteo", 3.5)]);

    let meteo = aggregate(&collection, Dimension::ByCause, "Meteo");
    assert_eq!(
        meteo.pairs(),
        vec![("Nimes", 3.5), ("Toulouse", 2.0), ("albi", 9.5), ("nimes", 1.5)]
    );

    let travaux = aggregate(&collection, Dimension::ByCause, "Travaux");
    assert_eq!(travaux.pairs(), vec![("Toulouse", 10.5), ("albi", 4.0)]);
    assert_eq!(travaux.points[0].count, 1);
}

#[tokio::test]
async fn test_full_pipeline_report_covers_every_cause() {
    let collection = load_fixtures().await;
    let report = aggregate_all(&collection, Dimension::ByCause);

    let selectors: Vec<_> = report.iter().map(|s| s.selector.as_str()).collect();
    assert_eq!(selectors, vec!["Greve", "Meteo", "Travaux"]);
    assert!(report.iter().all(|s| !s.is_empty()));
}

#[tokio::test]
async fn test_missing_resource_fails_the_load() {
    let mut resources = fixture_config().raw_resources().unwrap();
    resources.insert(1, RawResource::new("beziers_retard_arrivee_intercites.csv", DecimalFormat::Comma));

    let err = Loader::new(FileSource::new(FIXTURES))
        .load_all(&resources)
        .await
        .unwrap_err();

    match err {
        LoadError::Fetch { failures, total } => {
            assert_eq!(total, 4);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].identifier, "beziers_retard_arrivee_intercites.csv");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_resource_partial_load_is_flagged() {
    let mut resources = fixture_config().raw_resources().unwrap();
    resources.push(RawResource::new("cerbere_retard_arrivee_intercites.csv", DecimalFormat::Comma));

    let partial = Loader::new(FileSource::new(FIXTURES))
        .load_partial(&resources)
        .await;

    assert_eq!(partial.collection.len(), 11);
    assert_eq!(partial.failures.len(), 1);
    assert!(!partial.is_complete());
}

#[tokio::test]
async fn test_normalized_localities_merge_across_resources() {
    let config = fixture_config();
    let resources = config.raw_resources().unwrap();
    let collection = Loader::new(FileSource::new(FIXTURES))
        .with_columns(ColumnNames {
            normalize_locality: true,
            ..Default::default()
        })
        .load_all(&resources)
        .await
        .unwrap();

    assert_eq!(
        distinct_values(&collection, Dimension::ByLocality),
        vec!["ALBI", "NIMES", "TOULOUSE"]
    );

    let meteo = aggregate(&collection, Dimension::ByCause, "Meteo");
    assert_eq!(
        meteo.pairs(),
        vec![("ALBI", 9.5), ("NIMES", 2.5), ("TOULOUSE", 2.0)]
    );
    assert_eq!(meteo.points[1].count, 2);

    let nimes = aggregate(&collection, Dimension::ByLocality, "NIMES");
    assert_eq!(nimes.pairs(), vec![("Greve", 20.0), ("Meteo", 2.5)]);
}

#[tokio::test]
async fn test_latin1_resource_loads_with_replacement_characters() {
    let resources = vec![
        RawResource::new("beziers_latin1.csv", DecimalFormat::Comma).with_delimiter(b';'),
    ];

    let collection = Loader::new(FileSource::new(FIXTURES))
        .load_all(&resources)
        .await
        .expect("non-UTF-8 resource still loads");

    assert_eq!(collection.len(), 2);
    let first = &collection.records()[0];
    assert_eq!(first.locality.as_deref(), Some("B\u{fffd}ziers"));
    assert_eq!(first.cause.as_deref(), Some("M\u{fffd}t\u{fffd}o"));
    assert_eq!(first.delay, Some(4.5));
    assert_eq!(collection.records()[1].delay, Some(2.0));
}
