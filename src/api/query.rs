//! Query parameter structs

use crate::signals::SeriesRead;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Helper to deserialize numbers from query string (which are always strings)
fn deserialize_from_str<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if !s.is_empty() => s.parse().map_err(D::Error::custom),
        _ => Ok(T::default()),
    }
}

/// Helper to deserialize optional numbers from query string
fn deserialize_option_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if !s.is_empty() => s.parse().map(Some).map_err(D::Error::custom),
        _ => Ok(None),
    }
}

/// Dataset selector accepted by every route
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DatasetParams {
    /// Graph database to work in (default: the configured dataset)
    pub dataset_name: Option<String>,
}

/// Read options of the series GET routes
#[derive(Debug, Deserialize, Default, Clone)]
pub struct SeriesQuery {
    pub dataset_name: Option<String>,
    /// 0 returns the series properties only
    #[serde(default, deserialize_with = "deserialize_from_str")]
    pub depth: i64,
    /// Lowest stamp value to include (inclusive)
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub signal_min_value: Option<f64>,
    /// Highest stamp value to include (inclusive)
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub signal_max_value: Option<f64>,
}

impl SeriesQuery {
    pub fn read(&self) -> SeriesRead {
        SeriesRead {
            depth: self.depth,
            min_value: self.signal_min_value,
            max_value: self.signal_max_value,
        }
    }
}
