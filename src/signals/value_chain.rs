//! Signal value chain manager
//!
//! The values of one series form their own `next` chain anchored at the
//! series node by `hasSignal`.

use super::error::Result;
use super::kind::{relation, SIGNAL_VALUE_LABEL};
use super::models::{SignalValueIn, SignalValueNode};
use crate::graph_api::{GraphStore, NodeId, Property};

/// Property key of the value stored on a signal value node
pub const VALUE_KEY: &str = "value";

/// Value chain of one series
pub struct ValueChain<'a> {
    graph: &'a dyn GraphStore,
    dataset: &'a str,
    series_id: NodeId,
}

impl<'a> ValueChain<'a> {
    pub fn new(graph: &'a dyn GraphStore, dataset: &'a str, series_id: NodeId) -> Self {
        Self {
            graph,
            dataset,
            series_id,
        }
    }

    /// Append a signal value after `previous` (or as the first value).
    ///
    /// The first failing graph call is returned as is; nothing created before
    /// it is removed.
    pub async fn create_signal_value(
        &self,
        value: &SignalValueIn,
        previous: Option<NodeId>,
    ) -> Result<SignalValueNode> {
        let id = self
            .graph
            .create_node(SIGNAL_VALUE_LABEL, self.dataset)
            .await?;

        let mut properties = Vec::with_capacity(value.additional_properties.len() + 1);
        properties.push(Property::new(VALUE_KEY, value.value.clone()));
        properties.extend(
            value
                .additional_properties
                .iter()
                .filter(|p| p.key != VALUE_KEY)
                .cloned(),
        );
        self.graph
            .create_properties(id, &properties, self.dataset)
            .await?;

        match previous {
            None => {
                self.graph
                    .create_relationship(self.series_id, id, relation::HAS_SIGNAL, self.dataset)
                    .await?
            }
            Some(previous) => {
                self.graph
                    .create_relationship(previous, id, relation::NEXT, self.dataset)
                    .await?
            }
        };

        Ok(SignalValueNode {
            id,
            value: value.value.clone(),
            additional_properties: value
                .additional_properties
                .iter()
                .filter(|p| p.key != VALUE_KEY)
                .cloned()
                .collect(),
        })
    }
}
