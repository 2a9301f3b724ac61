use crate::analyzers::types::{AggregateSeries, DELAY_AXIS_LABEL, SeriesPoint};
use crate::analyzers::utility::mean;
use crate::model::{Dimension, UnifiedCollection};
use std::collections::{BTreeMap, BTreeSet};

/// Sorted, deduplicated values of the dimension's own field.
///
/// Records without a value for the field are skipped.
pub fn distinct_values(collection: &UnifiedCollection, dimension: Dimension) -> Vec<String> {
    collection
        .iter()
        .filter_map(|r| dimension.key(r))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Sorted, deduplicated values of a raw column.
pub fn distinct_field_values(collection: &UnifiedCollection, field: &str) -> Vec<String> {
    collection
        .iter()
        .filter_map(|r| r.get(field))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Mean delay per group for the records matching `selector` on `dimension`.
///
/// Only records carrying both a cause and a delay take part, whatever the
/// dimension. A selector nothing matches gives an empty series.
pub fn aggregate(collection: &UnifiedCollection, dimension: Dimension, selector: &str) -> AggregateSeries {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for record in collection.iter().filter(|r| r.is_aggregatable()) {
        if dimension.key(record) != Some(selector) {
            continue;
        }
        let (Some(group), Some(delay)) = (dimension.group_key(record), record.delay) else {
            continue;
        };
        groups.entry(group).or_default().push(delay);
    }

    let points = groups
        .into_iter()
        .map(|(category, delays)| SeriesPoint {
            category: category.to_string(),
            mean_delay: mean(&delays),
            count: delays.len(),
        })
        .collect();

    AggregateSeries {
        dimension,
        selector: selector.to_string(),
        title: title(dimension, selector),
        x_label: dimension.category_label().to_string(),
        y_label: DELAY_AXIS_LABEL.to_string(),
        points,
    }
}

/// One series per distinct value of the dimension, in selector order.
pub fn aggregate_all(collection: &UnifiedCollection, dimension: Dimension) -> Vec<AggregateSeries> {
    distinct_values(collection, dimension)
        .iter()
        .map(|selector| aggregate(collection, dimension, selector))
        .collect()
}

fn title(dimension: Dimension, selector: &str) -> String {
    match dimension {
        Dimension::ByLocality => format!("Mean delay by cause in {selector}"),
        Dimension::ByCause => format!("Mean delay by locality for cause {selector}"),
    }
}
