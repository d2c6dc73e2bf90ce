//! Signal-series transformations
//!
//! Pure functions over fully materialized series. Each transformation
//! produces the points of a new, unsaved series plus one provenance group
//! per output point: the ids of the source signal values it derives from.
//!
//! - [`resample`] - nearest-neighbour resampling to a fixed period
//! - [`quadrants`] - quadrant classification of two co-indexed series
//! - [`multidimensional`] - merge of N series by shared stamp

pub mod multidimensional;
pub mod params;
pub mod quadrants;
pub mod resample;

pub use params::TransformationParams;

use crate::graph_api::NodeId;
use crate::signals::error::SignalError;
use crate::signals::kind::SeriesType;
use crate::signals::models::{SignalPointIn, SignalSeriesOut, StampDescriptor};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised by the transformation engine
#[derive(Error, Debug, PartialEq)]
pub enum TransformError {
    #[error("unknown transformation '{0}'")]
    UnknownTransformation(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Runtime(String),
}

impl TransformError {
    pub fn parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<TransformError> for SignalError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::Runtime(message) => SignalError::Transformation(message),
            other => SignalError::Validation(other.to_string()),
        }
    }
}

/// Supported transformations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationName {
    Resample,
    Quadrants,
    Multidimensional,
}

impl TransformationName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resample => "resample_nearest",
            Self::Quadrants => "quadrants",
            Self::Multidimensional => "multidimensional",
        }
    }
}

impl FromStr for TransformationName {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resample_nearest" | "resample" => Ok(Self::Resample),
            "quadrants" => Ok(Self::Quadrants),
            "multidimensional" => Ok(Self::Multidimensional),
            _ => Err(TransformError::UnknownTransformation(s.to_string())),
        }
    }
}

impl fmt::Display for TransformationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Materialized input
// ============================================================================

/// One stored point with the node ids needed for provenance
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedPoint {
    pub value_id: NodeId,
    pub value: Value,
    pub stamp_ids: Vec<NodeId>,
    pub stamp: StampDescriptor,
}

/// A stored series read back in chain order
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedSeries {
    pub id: NodeId,
    pub series_type: SeriesType,
    pub points: Vec<MaterializedPoint>,
}

impl TryFrom<&SignalSeriesOut> for MaterializedSeries {
    type Error = TransformError;

    fn try_from(series: &SignalSeriesOut) -> Result<Self, Self::Error> {
        let points = series
            .signal_values
            .iter()
            .map(|point| {
                let stamp = match point.stamp_values().as_slice() {
                    [stamp] => StampDescriptor::Point(*stamp),
                    [start, end] => StampDescriptor::Interval {
                        start: *start,
                        end: *end,
                    },
                    other => {
                        return Err(TransformError::Runtime(format!(
                            "signal value {} has {} stamps",
                            point.signal_value.id,
                            other.len()
                        )))
                    }
                };
                Ok(MaterializedPoint {
                    value_id: point.signal_value.id,
                    value: point.signal_value.value.clone(),
                    stamp_ids: point.stamps.iter().map(|s| s.id).collect(),
                    stamp,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: series.id,
            series_type: series.series_type,
            points,
        })
    }
}

/// Result of a transformation: points to save plus provenance groups
#[derive(Debug, Clone, PartialEq)]
pub struct TransformationOutput {
    pub series_type: SeriesType,
    pub points: Vec<SignalPointIn>,
    pub provenance: Vec<Vec<NodeId>>,
}

/// Read a signal value as a number (numbers and numeric strings)
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

/// Run a transformation over materialized sources
pub fn apply(
    name: TransformationName,
    sources: &[MaterializedSeries],
    params: &TransformationParams<'_>,
) -> Result<TransformationOutput, TransformError> {
    match name {
        TransformationName::Resample => {
            let [source] = sources else {
                return Err(TransformError::InvalidInput(format!(
                    "resampling takes exactly one series, got {}",
                    sources.len()
                )));
            };
            let period = params
                .number(params::PERIOD)?
                .ok_or_else(|| TransformError::parameter(params::PERIOD, "is required"))?;
            resample::resample(
                source,
                period,
                params.number(params::START)?,
                params.number(params::END)?,
            )
        }
        TransformationName::Quadrants => {
            let [x, y] = sources else {
                return Err(TransformError::InvalidInput(format!(
                    "quadrants take exactly two series, got {}",
                    sources.len()
                )));
            };
            let origin_x = params.number(params::ORIGIN_X)?.unwrap_or(0.0);
            let origin_y = params.number(params::ORIGIN_Y)?.unwrap_or(0.0);
            quadrants::quadrants(x, y, origin_x, origin_y)
        }
        TransformationName::Multidimensional => multidimensional::multidimensional(sources),
    }
}
