//! Test helper factories and mock state builders
#![allow(dead_code)]

use crate::api::create_router;
use crate::api::handlers::ServerState;
use crate::graph_api::mock::MockGraphStore;
use crate::signals::kind::EXPERIMENT_LABEL;
use crate::{AppState, Config};
use std::sync::Arc;

/// Dataset every mock state defaults to
pub const TEST_DATASET: &str = "test";

fn mock_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        graph_api_url: "http://mock:9000".to_string(),
        graph_api_timeout_secs: 1,
        default_dataset: TEST_DATASET.to_string(),
    }
}

/// Create a mock AppState with an empty in-memory graph
pub fn mock_app_state() -> AppState {
    mock_app_state_with(Arc::new(MockGraphStore::new()))
}

/// Create a mock AppState over an existing (possibly seeded) graph
pub fn mock_app_state_with(graph: Arc<MockGraphStore>) -> AppState {
    AppState {
        graph,
        config: Arc::new(mock_config()),
    }
}

/// Router over a mock graph, returned with the graph for assertions
pub fn test_app() -> (axum::Router, Arc<MockGraphStore>) {
    let graph = Arc::new(MockGraphStore::new());
    let state = Arc::new(ServerState::new(mock_app_state_with(graph.clone())));
    (create_router(state), graph)
}

/// Seed an experiment node in the default test dataset
pub async fn seed_experiment(graph: &MockGraphStore) -> i64 {
    graph.seed_node(EXPERIMENT_LABEL, vec![], TEST_DATASET).await
}
