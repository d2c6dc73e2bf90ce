//! Quadrant classification of two co-indexed series

use super::{numeric, MaterializedSeries, TransformError, TransformationOutput};
use crate::signals::models::{SignalPointIn, SignalValueIn};

/// Quadrant (1..=4) of a point relative to an origin; values on an axis
/// belong to the non-negative side.
pub fn quadrant(x: f64, y: f64, origin_x: f64, origin_y: f64) -> u8 {
    match (x >= origin_x, y >= origin_y) {
        (true, true) => 1,
        (false, true) => 2,
        (false, false) => 3,
        (true, false) => 4,
    }
}

/// Classify each index of `x` / `y` into a quadrant around the origin.
///
/// Both series must sit on the same stamps, index by index.
pub fn quadrants(
    x: &MaterializedSeries,
    y: &MaterializedSeries,
    origin_x: f64,
    origin_y: f64,
) -> Result<TransformationOutput, TransformError> {
    if x.points.len() != y.points.len() {
        return Err(TransformError::InvalidInput(format!(
            "series {} and {} have different lengths ({} vs {})",
            x.id,
            y.id,
            x.points.len(),
            y.points.len()
        )));
    }

    let mut points = Vec::with_capacity(x.points.len());
    let mut provenance = Vec::with_capacity(x.points.len());
    for (index, (px, py)) in x.points.iter().zip(&y.points).enumerate() {
        if px.stamp_ids != py.stamp_ids {
            return Err(TransformError::InvalidInput(format!(
                "series {} and {} are not aligned at index {}",
                x.id, y.id, index
            )));
        }

        let (Some(vx), Some(vy)) = (numeric(&px.value), numeric(&py.value)) else {
            return Err(TransformError::Runtime(format!(
                "non-numeric signal value at index {}",
                index
            )));
        };

        points.push(SignalPointIn::from_descriptor(
            px.stamp,
            SignalValueIn::new(quadrant(vx, vy, origin_x, origin_y)),
        ));
        provenance.push(vec![px.value_id, py.value_id]);
    }

    Ok(TransformationOutput {
        series_type: x.series_type,
        points,
        provenance,
    })
}
