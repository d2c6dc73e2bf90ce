//! In-memory mock implementation of GraphStore for testing.
//!
//! Keeps one node/relationship map per dataset behind `tokio::sync::RwLock`
//! and evaluates pattern queries with a small backtracking matcher.

use crate::graph_api::models::*;
use crate::graph_api::traits::GraphStore;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default, Clone)]
pub struct MockDataset {
    pub nodes: BTreeMap<NodeId, GraphNode>,
    pub relationships: BTreeMap<NodeId, Relationship>,
}

/// In-memory mock implementation of GraphStore for testing.
pub struct MockGraphStore {
    pub datasets: RwLock<HashMap<String, MockDataset>>,
    next_id: AtomicI64,
    /// Relationship names whose creation fails (error injection)
    failing_relationships: RwLock<HashSet<String>>,
}

impl Default for MockGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGraphStore {
    /// Create a new empty MockGraphStore.
    pub fn new() -> Self {
        Self {
            datasets: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            failing_relationships: RwLock::new(HashSet::new()),
        }
    }

    fn allocate_id(&self) -> NodeId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Make every `create_relationship` call with this name fail.
    pub async fn fail_relationship(&self, name: &str) {
        self.failing_relationships
            .write()
            .await
            .insert(name.to_string());
    }

    /// Seed a node with properties, returning its id.
    pub async fn seed_node(&self, label: &str, properties: Vec<Property>, dataset: &str) -> NodeId {
        let id = self.allocate_id();
        self.datasets
            .write()
            .await
            .entry(dataset.to_string())
            .or_default()
            .nodes
            .insert(
                id,
                GraphNode {
                    id,
                    labels: vec![label.to_string()],
                    properties,
                },
            );
        id
    }

    /// Snapshot of a dataset for assertions.
    pub async fn snapshot(&self, dataset: &str) -> MockDataset {
        self.datasets
            .read()
            .await
            .get(dataset)
            .cloned()
            .unwrap_or_default()
    }

    /// Count nodes carrying a label.
    pub async fn count_label(&self, label: &str, dataset: &str) -> usize {
        self.snapshot(dataset)
            .await
            .nodes
            .values()
            .filter(|n| n.has_label(label))
            .count()
    }
}

/// Nodes reachable from `from` over `name` edges in `[min, max]` hops,
/// ordered by hop count then relationship id.
fn reachable(
    ds: &MockDataset,
    from: NodeId,
    name: &str,
    min_hops: u32,
    max_hops: Option<u32>,
    outgoing: bool,
) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut visited = HashSet::from([from]);
    let mut queue = VecDeque::from([(from, 0u32)]);

    while let Some((node, depth)) = queue.pop_front() {
        if depth >= min_hops {
            found.push(node);
        }
        if max_hops.is_some_and(|max| depth >= max) {
            continue;
        }
        for rel in ds.relationships.values() {
            let next = if outgoing && rel.is_outgoing(node, name) {
                rel.end_node
            } else if !outgoing && rel.is_incoming(node, name) {
                rel.start_node
            } else {
                continue;
            };
            if visited.insert(next) {
                queue.push_back((next, depth + 1));
            }
        }
    }
    found
}

fn extend_match(
    ds: &MockDataset,
    query: &NodesQuery,
    relation_index: usize,
    binding: &mut [Option<NodeId>],
    rows: &mut Vec<Vec<GraphNode>>,
) {
    let Some(relation) = query.relations.get(relation_index) else {
        if binding.iter().all(Option::is_some) {
            let row = query
                .nodes
                .iter()
                .zip(binding.iter())
                .filter(|(slot, _)| slot.result)
                .filter_map(|(_, id)| id.and_then(|id| ds.nodes.get(&id).cloned()))
                .collect();
            rows.push(row);
        }
        return;
    };

    // Walk from whichever end is already bound
    let (from, target_slot, outgoing) = match (binding[relation.begin], binding[relation.end]) {
        (Some(begin), _) => (begin, relation.end, true),
        (None, Some(end)) => (end, relation.begin, false),
        (None, None) => return,
    };
    let already_bound = binding[target_slot];

    for candidate in reachable(
        ds,
        from,
        &relation.name,
        relation.min_hops,
        relation.max_hops,
        outgoing,
    ) {
        if let Some(bound) = already_bound {
            if bound == candidate {
                extend_match(ds, query, relation_index + 1, binding, rows);
            }
            continue;
        }
        let matches = ds
            .nodes
            .get(&candidate)
            .is_some_and(|node| query.nodes[target_slot].matches(node));
        if matches {
            binding[target_slot] = Some(candidate);
            extend_match(ds, query, relation_index + 1, binding, rows);
            binding[target_slot] = None;
        }
    }
}

/// Evaluate a pattern query: slot 0 is the root, every relation must touch
/// an already bound slot.
fn run_query(ds: &MockDataset, query: &NodesQuery) -> Vec<Vec<GraphNode>> {
    let mut rows = Vec::new();
    let Some(root) = query.nodes.first() else {
        return rows;
    };

    let roots: Vec<NodeId> = ds
        .nodes
        .values()
        .filter(|node| root.matches(node))
        .map(|node| node.id)
        .collect();

    for id in roots {
        let mut binding = vec![None; query.nodes.len()];
        binding[0] = Some(id);
        extend_match(ds, query, 0, &mut binding, &mut rows);
    }
    rows
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn create_node(&self, label: &str, dataset: &str) -> Result<NodeId> {
        Ok(self.seed_node(label, Vec::new(), dataset).await)
    }

    async fn get_node(&self, id: NodeId, dataset: &str) -> Result<Option<GraphNode>> {
        Ok(self
            .datasets
            .read()
            .await
            .get(dataset)
            .and_then(|ds| ds.nodes.get(&id).cloned()))
    }

    async fn create_properties(
        &self,
        id: NodeId,
        properties: &[Property],
        dataset: &str,
    ) -> Result<()> {
        let mut datasets = self.datasets.write().await;
        let node = datasets
            .get_mut(dataset)
            .and_then(|ds| ds.nodes.get_mut(&id))
            .ok_or_else(|| anyhow!("create properties failed: node {} not found", id))?;
        for property in properties {
            node.properties.retain(|p| p.key != property.key);
            node.properties.push(property.clone());
        }
        Ok(())
    }

    async fn delete_node(&self, id: NodeId, dataset: &str) -> Result<()> {
        let mut datasets = self.datasets.write().await;
        let ds = datasets
            .get_mut(dataset)
            .ok_or_else(|| anyhow!("delete node failed: node {} not found", id))?;
        if ds.nodes.remove(&id).is_none() {
            bail!("delete node failed: node {} not found", id);
        }
        ds.relationships
            .retain(|_, rel| rel.start_node != id && rel.end_node != id);
        Ok(())
    }

    async fn create_relationship(
        &self,
        start: NodeId,
        end: NodeId,
        name: &str,
        dataset: &str,
    ) -> Result<NodeId> {
        if self.failing_relationships.read().await.contains(name) {
            bail!("create relationship failed: {} rejected", name);
        }
        let id = self.allocate_id();
        let mut datasets = self.datasets.write().await;
        let ds = datasets.entry(dataset.to_string()).or_default();
        if !ds.nodes.contains_key(&start) || !ds.nodes.contains_key(&end) {
            bail!(
                "create relationship failed: missing endpoint {} -> {}",
                start,
                end
            );
        }
        ds.relationships.insert(
            id,
            Relationship {
                id,
                start_node: start,
                end_node: end,
                name: name.to_string(),
                properties: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn create_relationship_properties(
        &self,
        id: NodeId,
        properties: &[Property],
        dataset: &str,
    ) -> Result<()> {
        let mut datasets = self.datasets.write().await;
        let rel = datasets
            .get_mut(dataset)
            .and_then(|ds| ds.relationships.get_mut(&id))
            .ok_or_else(|| anyhow!("relationship {} not found", id))?;
        for property in properties {
            rel.properties.retain(|p| p.key != property.key);
            rel.properties.push(property.clone());
        }
        Ok(())
    }

    async fn delete_relationship(&self, id: NodeId, dataset: &str) -> Result<()> {
        let mut datasets = self.datasets.write().await;
        datasets
            .get_mut(dataset)
            .and_then(|ds| ds.relationships.remove(&id))
            .map(|_| ())
            .ok_or_else(|| anyhow!("delete relationship failed: {} not found", id))
    }

    async fn get_node_relationships(
        &self,
        id: NodeId,
        dataset: &str,
    ) -> Result<Vec<Relationship>> {
        Ok(self
            .datasets
            .read()
            .await
            .get(dataset)
            .map(|ds| {
                ds.relationships
                    .values()
                    .filter(|rel| rel.start_node == id || rel.end_node == id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_nodes_by_query(&self, query: &NodesQuery, dataset: &str) -> Result<QueryRows> {
        let datasets = self.datasets.read().await;
        let rows = datasets
            .get(dataset)
            .map(|ds| run_query(ds, query))
            .unwrap_or_default();
        Ok(QueryRows { rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DS: &str = "test";

    /// a -> b -> c chain of "Item" nodes with a "value" property
    async fn seeded_chain(store: &MockGraphStore) -> (NodeId, Vec<NodeId>) {
        let head = store.seed_node("Head", vec![], DS).await;
        let mut items = Vec::new();
        for value in [1, 2, 3] {
            items.push(
                store
                    .seed_node("Item", vec![Property::new("value", value)], DS)
                    .await,
            );
        }
        store.create_relationship(head, items[0], "first", DS).await.unwrap();
        store.create_relationship(items[0], items[1], "next", DS).await.unwrap();
        store.create_relationship(items[1], items[2], "next", DS).await.unwrap();
        (head, items)
    }

    #[tokio::test]
    async fn test_variable_length_query_returns_chain_in_order() {
        let store = MockGraphStore::new();
        let (head, items) = seeded_chain(&store).await;

        let mut query = NodesQuery::new();
        let h = query.node(QueryNode::labeled("Head").with_id(head));
        let first = query.node(QueryNode::labeled("Item"));
        let item = query.node(QueryNode::labeled("Item").returned());
        query.relation(h, first, "first");
        query.hops(first, item, "next", 0, None);

        let rows = store.get_nodes_by_query(&query, DS).await.unwrap().rows;
        let ids: Vec<NodeId> = rows.iter().map(|row| row[0].id).collect();
        assert_eq!(ids, items);
    }

    #[tokio::test]
    async fn test_query_filters_prune_rows() {
        let store = MockGraphStore::new();
        let (head, items) = seeded_chain(&store).await;

        let mut query = NodesQuery::new();
        let h = query.node(QueryNode::labeled("Head").with_id(head));
        let first = query.node(QueryNode::labeled("Item"));
        let item = query.node(
            QueryNode::labeled("Item")
                .filter("value", FilterOperator::GreaterOrEqual, 2)
                .returned(),
        );
        query.relation(h, first, "first");
        query.hops(first, item, "next", 0, None);

        let rows = store.get_nodes_by_query(&query, DS).await.unwrap().rows;
        let ids: Vec<NodeId> = rows.iter().map(|row| row[0].id).collect();
        assert_eq!(ids, items[1..].to_vec());
    }

    #[tokio::test]
    async fn test_delete_node_detaches_relationships() {
        let store = MockGraphStore::new();
        let (_, items) = seeded_chain(&store).await;

        store.delete_node(items[1], DS).await.unwrap();
        assert!(store.get_node_relationships(items[0], DS).await.unwrap()
            .iter()
            .all(|rel| rel.name != "next"));
        assert!(store.get_node(items[1], DS).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_datasets_are_isolated() {
        let store = MockGraphStore::new();
        let id = store.create_node("Item", "a").await.unwrap();
        assert!(store.get_node(id, "a").await.unwrap().is_some());
        assert!(store.get_node(id, "b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failing_relationship_injection() {
        let store = MockGraphStore::new();
        let a = store.create_node("Item", DS).await.unwrap();
        let b = store.create_node("Item", DS).await.unwrap();
        store.fail_relationship("next").await;
        assert!(store.create_relationship(a, b, "next", DS).await.is_err());
        assert!(store.create_relationship(a, b, "other", DS).await.is_ok());
    }
}
