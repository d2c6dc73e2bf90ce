//! Series kinds
//!
//! A series is characterised by its domain (time or frequency) and its type.
//! [`SeriesKind`] is the strategy table the persistence engine dispatches on:
//! node labels, the stamp property key, and the relation names linking a
//! signal value to its stamp(s).

use crate::graph_api::GraphNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label of every signal value node
pub const SIGNAL_VALUE_LABEL: &str = "Signal Value";
/// Label of experiment nodes (owners of stamp chains)
pub const EXPERIMENT_LABEL: &str = "Experiment";
/// Label of measure nodes
pub const MEASURE_LABEL: &str = "Measure";
/// Label of observable information nodes
pub const OBSERVABLE_INFORMATION_LABEL: &str = "Observable Information";

/// Relationship names used by the signal-series engine
pub mod relation {
    pub const NEXT: &str = "next";
    pub const TAKES: &str = "takes";
    pub const HAS_SIGNAL: &str = "hasSignal";
    pub const IN_EXPERIMENT: &str = "inExperiment";
    pub const HAS_MEASURE: &str = "hasMeasure";
    pub const HAS_OBSERVABLE_INFORMATION: &str = "hasObservableInformation";
    pub const TRANSFORMED_FROM: &str = "transformedFrom";
    pub const BASED_ON: &str = "basedOn";
}

/// Ordering dimension of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesDomain {
    Time,
    Frequency,
}

impl SeriesDomain {
    /// Label of series nodes in this domain
    pub fn series_label(self) -> &'static str {
        match self {
            Self::Time => "Time Series",
            Self::Frequency => "Frequency Domain Series",
        }
    }

    /// Label of stamp nodes in this domain
    pub fn stamp_label(self) -> &'static str {
        match self {
            Self::Time => "Timestamp",
            Self::Frequency => "Frequencystamp",
        }
    }

    /// Property holding the stamp scalar
    pub fn stamp_key(self) -> &'static str {
        match self {
            Self::Time => "timestamp",
            Self::Frequency => "frequency",
        }
    }

    /// Value → stamp relation for point-shaped series
    pub fn point_relation(self) -> &'static str {
        match self {
            Self::Time => "inSec",
            Self::Frequency => "inHz",
        }
    }

    /// Value → (start, end) stamp relations for interval-shaped series
    pub fn interval_relations(self) -> [&'static str; 2] {
        match self {
            Self::Time => ["startInSec", "endInSec"],
            Self::Frequency => ["startInHz", "endInHz"],
        }
    }

    /// Every relation that makes a stamp "in use"
    pub fn stamp_relations(self) -> [&'static str; 3] {
        let [start, end] = self.interval_relations();
        [self.point_relation(), start, end]
    }

    /// Read the scalar value of a stamp node
    pub fn stamp_scalar(self, stamp: &GraphNode) -> Option<f64> {
        let value = stamp.property(self.stamp_key())?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
    }
}

impl fmt::Display for SeriesDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.series_label())
    }
}

/// How many stamps a signal value points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampShape {
    Point,
    Interval,
}

/// Declared type of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesType {
    #[serde(rename = "Timestamp")]
    Timestamp,
    #[serde(rename = "Frequencystamp")]
    Frequencystamp,
    #[serde(rename = "Epoch")]
    Epoch,
    #[serde(rename = "Irregularly-spaced")]
    IrregularlySpaced,
    #[serde(rename = "Regularly-spaced")]
    RegularlySpaced,
}

impl SeriesType {
    pub fn shape(self) -> StampShape {
        match self {
            Self::Epoch => StampShape::Interval,
            Self::Timestamp
            | Self::Frequencystamp
            | Self::IrregularlySpaced
            | Self::RegularlySpaced => StampShape::Point,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timestamp => "Timestamp",
            Self::Frequencystamp => "Frequencystamp",
            Self::Epoch => "Epoch",
            Self::IrregularlySpaced => "Irregularly-spaced",
            Self::RegularlySpaced => "Regularly-spaced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Timestamp" => Some(Self::Timestamp),
            "Frequencystamp" => Some(Self::Frequencystamp),
            "Epoch" => Some(Self::Epoch),
            "Irregularly-spaced" => Some(Self::IrregularlySpaced),
            "Regularly-spaced" => Some(Self::RegularlySpaced),
            _ => None,
        }
    }
}

/// Domain + type: everything kind-specific the engine needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesKind {
    pub domain: SeriesDomain,
    pub series_type: SeriesType,
}

impl SeriesKind {
    pub fn new(domain: SeriesDomain, series_type: SeriesType) -> Self {
        Self {
            domain,
            series_type,
        }
    }

    pub fn shape(&self) -> StampShape {
        self.series_type.shape()
    }

    /// Relation names from a value node to its stamps, in stamp order
    pub fn relation_names(&self) -> Vec<&'static str> {
        match self.shape() {
            StampShape::Point => vec![self.domain.point_relation()],
            StampShape::Interval => self.domain.interval_relations().to_vec(),
        }
    }
}
