//! Transformation parameters
//!
//! Parameters travel as the flat `additional_properties` key/value list of
//! the request; numbers may be given as JSON numbers or numeric strings.

use super::TransformError;
use crate::graph_api::Property;
use serde_json::Value;

pub const PERIOD: &str = "period";
pub const START: &str = "start_timestamp";
pub const END: &str = "end_timestamp";
pub const ORIGIN_X: &str = "origin_x";
pub const ORIGIN_Y: &str = "origin_y";
/// Marker echoed into the saved output series
pub const TRANSFORMATION_NAME: &str = "transformation_name";

/// Accepted spellings per parameter
const ALIASES: &[(&str, &str)] = &[(START, "start_frequency"), (END, "end_frequency")];

/// Read-only view over the request's parameter list
pub struct TransformationParams<'a> {
    properties: &'a [Property],
}

impl<'a> TransformationParams<'a> {
    pub fn new(properties: &'a [Property]) -> Self {
        Self { properties }
    }

    fn raw(&self, key: &str) -> Option<&'a Value> {
        let alias = ALIASES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, alias)| *alias);
        self.properties
            .iter()
            .find(|p| p.key == key || Some(p.key.as_str()) == alias)
            .map(|p| &p.value)
    }

    /// Numeric parameter; missing, null or empty means `None`
    pub fn number(&self, key: &str) -> Result<Option<f64>, TransformError> {
        let parsed = match self.raw(key) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };
        match parsed {
            Some(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(TransformError::parameter(key, "must be a finite number")),
        }
    }
}
