//! Signal-series request and response records

use super::error::{Result, SignalError};
use super::kind::{SeriesType, StampShape};
use crate::graph_api::{NodeId, Property};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Input
// ============================================================================

/// Value carried by one signal value node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalValueIn {
    pub value: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_properties: Vec<Property>,
}

impl SignalValueIn {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            additional_properties: Vec::new(),
        }
    }
}

/// One (stamp, value) pair of a series being saved.
///
/// Frequency-domain payloads use `frequency` / `start_frequency` /
/// `end_frequency`, accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPointIn {
    #[serde(default, alias = "frequency", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(
        default,
        alias = "start_frequency",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_timestamp: Option<f64>,
    #[serde(default, alias = "end_frequency", skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<f64>,
    pub signal_value: SignalValueIn,
}

impl SignalPointIn {
    pub fn point(stamp: f64, value: impl Into<Value>) -> Self {
        Self {
            timestamp: Some(stamp),
            start_timestamp: None,
            end_timestamp: None,
            signal_value: SignalValueIn::new(value),
        }
    }

    pub fn interval(start: f64, end: f64, value: impl Into<Value>) -> Self {
        Self {
            timestamp: None,
            start_timestamp: Some(start),
            end_timestamp: Some(end),
            signal_value: SignalValueIn::new(value),
        }
    }

    pub fn from_descriptor(descriptor: StampDescriptor, value: SignalValueIn) -> Self {
        match descriptor {
            StampDescriptor::Point(stamp) => Self {
                timestamp: Some(stamp),
                start_timestamp: None,
                end_timestamp: None,
                signal_value: value,
            },
            StampDescriptor::Interval { start, end } => Self {
                timestamp: None,
                start_timestamp: Some(start),
                end_timestamp: Some(end),
                signal_value: value,
            },
        }
    }

    /// Stamp descriptor for a series of the given shape
    pub fn descriptor(&self, shape: StampShape) -> Result<StampDescriptor> {
        match (shape, self.timestamp, self.start_timestamp, self.end_timestamp) {
            (StampShape::Point, Some(stamp), None, None) => Ok(StampDescriptor::Point(stamp)),
            (StampShape::Interval, None, Some(start), Some(end)) if start <= end => {
                Ok(StampDescriptor::Interval { start, end })
            }
            (StampShape::Interval, None, Some(start), Some(end)) => Err(SignalError::validation(
                format!("epoch start {} is after its end {}", start, end),
            )),
            (StampShape::Point, ..) => Err(SignalError::validation(
                "point series values need exactly one stamp",
            )),
            (StampShape::Interval, ..) => Err(SignalError::validation(
                "epoch values need a start and an end stamp",
            )),
        }
    }
}

/// Position of a value in the ordering dimension
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StampDescriptor {
    Point(f64),
    Interval { start: f64, end: f64 },
}

impl StampDescriptor {
    /// Stamp scalars in relation order
    pub fn scalars(&self) -> Vec<f64> {
        match *self {
            Self::Point(stamp) => vec![stamp],
            Self::Interval { start, end } => vec![start, end],
        }
    }

    /// Scalar used for ordering and distance (the start of an interval)
    pub fn representative(&self) -> f64 {
        match *self {
            Self::Point(stamp) => stamp,
            Self::Interval { start, .. } => start,
        }
    }
}

/// Signal series submitted for saving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSeriesIn {
    pub experiment_id: NodeId,
    #[serde(rename = "type")]
    pub series_type: SeriesType,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub measure_id: Option<NodeId>,
    #[serde(default)]
    pub observable_information_id: Option<NodeId>,
    #[serde(default)]
    pub additional_properties: Vec<Property>,
    #[serde(default)]
    pub signal_values: Vec<SignalPointIn>,
}

/// Read options of `get_signal_series`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesRead {
    pub depth: i64,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl SeriesRead {
    /// Full read with every signal value
    pub fn full() -> Self {
        Self {
            depth: 1,
            ..Default::default()
        }
    }
}

/// Transformation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationIn {
    pub transformation_name: String,
    #[serde(alias = "time_series_ids", alias = "frequency_domain_series_ids")]
    pub series_ids: Vec<NodeId>,
    #[serde(default)]
    pub additional_properties: Vec<Property>,
}

// ============================================================================
// Output
// ============================================================================

/// A stamp node of an experiment's chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampNode {
    pub id: NodeId,
    pub value: f64,
}

/// A stored signal value node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalValueNode {
    pub id: NodeId,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_properties: Vec<Property>,
}

/// One stored chain position: the value node and its stamp(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPointOut {
    pub signal_value: SignalValueNode,
    pub stamps: Vec<StampNode>,
}

impl SignalPointOut {
    pub fn stamp_values(&self) -> Vec<f64> {
        self.stamps.iter().map(|s| s.value).collect()
    }
}

/// Stored signal series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSeriesOut {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub series_type: SeriesType,
    pub source: Option<String>,
    pub experiment_id: Option<NodeId>,
    pub measure_id: Option<NodeId>,
    pub observable_information_id: Option<NodeId>,
    pub additional_properties: Vec<Property>,
    pub signal_values: Vec<SignalPointOut>,
}
