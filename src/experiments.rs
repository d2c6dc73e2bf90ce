//! Experiment nodes
//!
//! An experiment owns the stamp chains its series share. Only the anchor
//! node itself is managed here.

use crate::graph_api::{GraphStore, NodeId, Property};
use crate::signals::kind::EXPERIMENT_LABEL;
use crate::signals::{Result, SignalError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

const NAME_KEY: &str = "experiment_name";

/// Experiment submitted for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentIn {
    pub experiment_name: String,
    #[serde(default)]
    pub additional_properties: Vec<Property>,
}

/// Stored experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOut {
    pub id: NodeId,
    pub experiment_name: Option<String>,
    pub additional_properties: Vec<Property>,
}

pub async fn create_experiment(
    graph: &dyn GraphStore,
    experiment: &ExperimentIn,
    dataset: &str,
) -> Result<ExperimentOut> {
    let additional_properties: Vec<Property> = experiment
        .additional_properties
        .iter()
        .filter(|p| p.key != NAME_KEY)
        .cloned()
        .collect();

    let id = graph.create_node(EXPERIMENT_LABEL, dataset).await?;
    let mut properties = vec![Property::new(NAME_KEY, experiment.experiment_name.as_str())];
    properties.extend(additional_properties.iter().cloned());
    graph.create_properties(id, &properties, dataset).await?;

    info!(experiment_id = id, dataset, "Created experiment");
    Ok(ExperimentOut {
        id,
        experiment_name: Some(experiment.experiment_name.clone()),
        additional_properties,
    })
}

/// Get an experiment; `NotFound` if missing or not an experiment
pub async fn get_experiment(graph: &dyn GraphStore, id: NodeId, dataset: &str) -> Result<ExperimentOut> {
    let node = graph
        .get_node(id, dataset)
        .await?
        .filter(|node| node.has_label(EXPERIMENT_LABEL))
        .ok_or_else(|| SignalError::not_found(EXPERIMENT_LABEL, id))?;

    Ok(ExperimentOut {
        id,
        experiment_name: node
            .property(NAME_KEY)
            .and_then(Value::as_str)
            .map(str::to_string),
        additional_properties: node
            .properties
            .into_iter()
            .filter(|p| p.key != NAME_KEY)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_api::mock::MockGraphStore;

    #[tokio::test]
    async fn test_create_and_get_experiment() {
        let store = MockGraphStore::new();
        let created = create_experiment(
            &store,
            &ExperimentIn {
                experiment_name: "eeg-1".into(),
                additional_properties: vec![Property::new("room", "B2")],
            },
            "test",
        )
        .await
        .unwrap();

        let read = get_experiment(&store, created.id, "test").await.unwrap();
        assert_eq!(read, created);
        assert_eq!(read.additional_properties, vec![Property::new("room", "B2")]);
    }

    #[tokio::test]
    async fn test_get_experiment_checks_label() {
        let store = MockGraphStore::new();
        let other = store.seed_node("Measure", vec![], "test").await;

        let err = get_experiment(&store, other, "test").await.unwrap_err();
        assert!(matches!(err, SignalError::NotFound { .. }));
        // Experiments are per dataset
        let created = create_experiment(
            &store,
            &ExperimentIn {
                experiment_name: "x".into(),
                additional_properties: vec![],
            },
            "a",
        )
        .await
        .unwrap();
        assert!(get_experiment(&store, created.id, "b").await.is_err());
    }
}
