//! GraphStore trait definition
//!
//! Abstract interface over the Graph API. The signal-series engine only
//! talks to the graph through this trait, which allows testing against the
//! in-memory mock. Every call carries the dataset (database) name.

use crate::graph_api::models::*;
use anyhow::Result;
use async_trait::async_trait;

/// Graph mutation and query operations exposed by the Graph API.
#[async_trait]
pub trait GraphStore: Send + Sync {
    // ========================================================================
    // Nodes
    // ========================================================================

    /// Create a node with a single label, returning its id
    async fn create_node(&self, label: &str, dataset: &str) -> Result<NodeId>;

    /// Get a node by id (`None` if it does not exist)
    async fn get_node(&self, id: NodeId, dataset: &str) -> Result<Option<GraphNode>>;

    /// Set properties on an existing node
    async fn create_properties(
        &self,
        id: NodeId,
        properties: &[Property],
        dataset: &str,
    ) -> Result<()>;

    /// Delete a node together with all relationships attached to it
    async fn delete_node(&self, id: NodeId, dataset: &str) -> Result<()>;

    // ========================================================================
    // Relationships
    // ========================================================================

    /// Create a named relationship `start -> end`, returning its id
    async fn create_relationship(
        &self,
        start: NodeId,
        end: NodeId,
        name: &str,
        dataset: &str,
    ) -> Result<NodeId>;

    /// Set properties on an existing relationship
    async fn create_relationship_properties(
        &self,
        id: NodeId,
        properties: &[Property],
        dataset: &str,
    ) -> Result<()>;

    /// Delete a relationship
    async fn delete_relationship(&self, id: NodeId, dataset: &str) -> Result<()>;

    /// All relationships (incoming and outgoing) attached to a node
    async fn get_node_relationships(&self, id: NodeId, dataset: &str)
        -> Result<Vec<Relationship>>;

    // ========================================================================
    // Queries
    // ========================================================================

    /// Run a declarative pattern query
    async fn get_nodes_by_query(&self, query: &NodesQuery, dataset: &str) -> Result<QueryRows>;
}
