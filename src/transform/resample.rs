//! Nearest-neighbour resampling

use super::{MaterializedSeries, TransformError, TransformationOutput};
use crate::signals::kind::SeriesType;
use crate::signals::models::{SignalPointIn, SignalValueIn, StampDescriptor};

/// Upper bound on generated points
const MAX_OUTPUT_POINTS: usize = 1_000_000;
/// Finest decimal precision the stamp grid snaps to
const MAX_DECIMALS: usize = 12;
/// Largest integer an `f64` holds exactly
const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

/// Output stamps `start + step * period`.
///
/// When `start` and `period` are short decimals the grid is computed in
/// scaled integers, so `0.1 * 3` lands on the same `f64` as a stamp written
/// `0.3` and deduplicates against it in the chain.
struct StampGrid {
    start: f64,
    period: f64,
    scale: Option<f64>,
}

impl StampGrid {
    fn new(start: f64, period: f64, end: f64) -> Self {
        let decimals = decimal_places(start).max(decimal_places(period));
        let scale = (decimals <= MAX_DECIMALS)
            .then(|| 10f64.powi(decimals as i32))
            .filter(|scale| (start.abs().max(end.abs()) + period) * scale < MAX_EXACT);
        Self {
            start,
            period,
            scale,
        }
    }

    fn at(&self, step: usize) -> f64 {
        match self.scale {
            Some(scale) => {
                let start = (self.start * scale).round();
                let period = (self.period * scale).round();
                (start + step as f64 * period) / scale
            }
            None => self.start + step as f64 * self.period,
        }
    }
}

/// Digits after the decimal point in the shortest representation of `x`
fn decimal_places(x: f64) -> usize {
    x.abs()
        .to_string()
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len())
}

/// Resample `source` to stamps `start, start + period, …` below `end`.
///
/// `start` defaults to the first stamp and `end` to the last stamp plus one
/// period. Each output takes the value of the closest source sample; on a
/// tie the earlier sample wins. Epochs are measured from their start.
pub fn resample(
    source: &MaterializedSeries,
    period: f64,
    start: Option<f64>,
    end: Option<f64>,
) -> Result<TransformationOutput, TransformError> {
    if period.is_nan() || period <= 0.0 {
        return Err(TransformError::parameter("period", "must be positive"));
    }
    let (Some(first), Some(last)) = (source.points.first(), source.points.last()) else {
        return Err(TransformError::Runtime(format!(
            "series {} has no signal values to resample",
            source.id
        )));
    };

    let start = start.unwrap_or_else(|| first.stamp.representative());
    let end = end.unwrap_or_else(|| last.stamp.representative() + period);
    if end <= start {
        return Err(TransformError::parameter(
            "end_timestamp",
            "must be greater than the start",
        ));
    }

    let count = ((end - start) / period).ceil();
    if count > MAX_OUTPUT_POINTS as f64 {
        return Err(TransformError::parameter(
            "period",
            format!("would produce more than {} points", MAX_OUTPUT_POINTS),
        ));
    }

    let grid = StampGrid::new(start, period, end);
    let mut points = Vec::new();
    let mut provenance = Vec::new();
    for step in 0..count as usize {
        let stamp = grid.at(step);
        if stamp >= end {
            break;
        }

        let mut nearest = first;
        let mut best = (first.stamp.representative() - stamp).abs();
        for candidate in &source.points[1..] {
            let distance = (candidate.stamp.representative() - stamp).abs();
            if distance < best {
                best = distance;
                nearest = candidate;
            }
        }

        points.push(SignalPointIn::from_descriptor(
            StampDescriptor::Point(stamp),
            SignalValueIn::new(nearest.value.clone()),
        ));
        provenance.push(vec![nearest.value_id]);
    }

    Ok(TransformationOutput {
        series_type: SeriesType::RegularlySpaced,
        points,
        provenance,
    })
}
