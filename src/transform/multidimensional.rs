//! Multidimensional merge of series sharing an experiment's stamp chain

use super::{MaterializedSeries, TransformError, TransformationOutput};
use crate::graph_api::NodeId;
use crate::signals::kind::SeriesType;
use crate::signals::models::{SignalPointIn, SignalValueIn, StampDescriptor};
use serde_json::Value;
use std::collections::HashMap;

struct Row {
    stamp: StampDescriptor,
    values: Vec<Value>,
    sources: Vec<NodeId>,
}

/// Merge N series into one row per distinct stamp.
///
/// Stamps are matched by node identity, not by value. Every distinct stamp
/// of any input produces a row holding the values present at it, in input
/// series order; rows follow chain (ascending stamp) order.
pub fn multidimensional(
    sources: &[MaterializedSeries],
) -> Result<TransformationOutput, TransformError> {
    if sources.is_empty() {
        return Err(TransformError::InvalidInput(
            "multidimensional merge needs at least one series".into(),
        ));
    }

    let shape = sources[0].series_type.shape();
    if let Some(other) = sources.iter().find(|s| s.series_type.shape() != shape) {
        return Err(TransformError::InvalidInput(format!(
            "series {} has a different stamp shape than series {}",
            other.id, sources[0].id
        )));
    }

    let mut rows: Vec<Row> = Vec::new();
    let mut by_stamp: HashMap<&[NodeId], usize> = HashMap::new();
    for series in sources {
        for point in &series.points {
            let index = *by_stamp.entry(point.stamp_ids.as_slice()).or_insert_with(|| {
                rows.push(Row {
                    stamp: point.stamp,
                    values: Vec::new(),
                    sources: Vec::new(),
                });
                rows.len() - 1
            });
            rows[index].values.push(point.value.clone());
            rows[index].sources.push(point.value_id);
        }
    }

    // Stable, so equal stamps keep first-seen order
    rows.sort_by(|a, b| {
        let (a, b) = (a.stamp.scalars(), b.stamp.scalars());
        a.iter()
            .zip(&b)
            .map(|(x, y)| x.total_cmp(y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let series_type = if sources.iter().all(|s| s.series_type == sources[0].series_type) {
        sources[0].series_type
    } else {
        SeriesType::IrregularlySpaced
    };

    let (points, provenance) = rows
        .into_iter()
        .map(|row| {
            (
                SignalPointIn::from_descriptor(row.stamp, SignalValueIn::new(row.values)),
                row.sources,
            )
        })
        .unzip();

    Ok(TransformationOutput {
        series_type,
        points,
        provenance,
    })
}
