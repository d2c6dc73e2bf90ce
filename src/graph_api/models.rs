//! Wire models of the Graph API
//!
//! Nodes, relationships and the declarative pattern query accepted by
//! `POST /nodes_query`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier assigned by the graph to nodes and relationships
pub type NodeId = i64;

// ============================================================================
// Nodes and relationships
// ============================================================================

/// A single key/value property on a node or relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: Value,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A node as returned by `GET /nodes/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl GraphNode {
    /// Whether the node carries the given label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Look up a property value by key
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| &p.value)
    }
}

/// A directed, named relationship between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: NodeId,
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub name: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Relationship {
    /// Outgoing edge of `node` named `name`
    pub fn is_outgoing(&self, node: NodeId, name: &str) -> bool {
        self.start_node == node && self.name == name
    }

    /// Incoming edge of `node` named `name`
    pub fn is_incoming(&self, node: NodeId, name: &str) -> bool {
        self.end_node == node && self.name == name
    }
}

// ============================================================================
// Pattern queries
// ============================================================================

/// Comparison applied by a [`PropertyFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    GreaterOrEqual,
    LessOrEqual,
}

impl FilterOperator {
    /// Evaluate the operator against a stored property value.
    ///
    /// Ordering operators only apply to numbers; anything else never matches.
    pub fn matches(self, stored: &Value, expected: &Value) -> bool {
        match self {
            FilterOperator::Equals => match (stored.as_f64(), expected.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => stored == expected,
            },
            FilterOperator::GreaterOrEqual => match (stored.as_f64(), expected.as_f64()) {
                (Some(a), Some(b)) => a >= b,
                _ => false,
            },
            FilterOperator::LessOrEqual => match (stored.as_f64(), expected.as_f64()) {
                (Some(a), Some(b)) => a <= b,
                _ => false,
            },
        }
    }
}

/// Per-node property predicate pushed into the pattern query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub key: String,
    pub operator: FilterOperator,
    pub value: Value,
}

/// One node slot of a pattern
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<PropertyFilter>,
    /// Matched node is returned in each row
    #[serde(default)]
    pub result: bool,
}

impl QueryNode {
    pub fn labeled(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn returned(mut self) -> Self {
        self.result = true;
        self
    }

    pub fn filter(mut self, key: &str, operator: FilterOperator, value: impl Into<Value>) -> Self {
        self.filters.push(PropertyFilter {
            key: key.to_string(),
            operator,
            value: value.into(),
        });
        self
    }

    /// Whether `node` satisfies id, label and property filters
    pub fn matches(&self, node: &GraphNode) -> bool {
        if self.id.is_some_and(|id| id != node.id) {
            return false;
        }
        if let Some(label) = &self.label {
            if !node.has_label(label) {
                return false;
            }
        }
        self.filters.iter().all(|f| {
            node.property(&f.key)
                .is_some_and(|stored| f.operator.matches(stored, &f.value))
        })
    }
}

/// One relation slot of a pattern, between two node slots (by index)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRelation {
    pub begin: usize,
    pub end: usize,
    pub name: String,
    #[serde(default = "default_hops")]
    pub min_hops: u32,
    /// `None` means unbounded
    #[serde(default = "default_max_hops")]
    pub max_hops: Option<u32>,
}

fn default_hops() -> u32 {
    1
}

fn default_max_hops() -> Option<u32> {
    Some(1)
}

/// Declarative node/relation pattern for `POST /nodes_query`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodesQuery {
    pub nodes: Vec<QueryNode>,
    pub relations: Vec<QueryRelation>,
}

impl NodesQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node slot, returning its index
    pub fn node(&mut self, node: QueryNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Add a single-hop relation between two slots
    pub fn relation(&mut self, begin: usize, end: usize, name: &str) -> &mut Self {
        self.hops(begin, end, name, 1, Some(1))
    }

    /// Add a variable-length relation between two slots
    pub fn hops(
        &mut self,
        begin: usize,
        end: usize,
        name: &str,
        min_hops: u32,
        max_hops: Option<u32>,
    ) -> &mut Self {
        self.relations.push(QueryRelation {
            begin,
            end,
            name: name.to_string(),
            min_hops,
            max_hops,
        });
        self
    }
}

/// Result of a pattern query: one row per match, containing the
/// `result: true` nodes in slot order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRows {
    #[serde(default)]
    pub rows: Vec<Vec<GraphNode>>,
}
