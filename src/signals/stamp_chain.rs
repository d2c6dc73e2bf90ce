//! Stamp chain manager
//!
//! Every experiment owns one ascending, singly linked chain of stamp nodes
//! per domain:
//!
//! ```text
//! Experiment ──takes──► s(0) ──next──► s(5) ──next──► s(9) ──next──► …
//! ```
//!
//! Stamps are shared by every series of the experiment and deduplicated by
//! exact value. The manager locates or inserts stamps while keeping the
//! chain ordered, and unlinks stamps nobody references anymore.

use super::error::Result;
use super::kind::{relation, SeriesDomain};
use super::models::StampNode;
use crate::graph_api::{GraphStore, NodeId, Property};
use tracing::{debug, warn};

/// Walking position inside a chain during a save.
///
/// `head` is the chain head together with the `takes` edge pointing at it;
/// `position` is the last stamp resolved by the walk.
#[derive(Debug, Clone, Default)]
pub struct ChainCursor {
    pub head: Option<(NodeId, StampNode)>,
    pub position: Option<StampNode>,
}

impl ChainCursor {
    /// Cursor sitting at the head of a chain
    pub fn at_head(head: Option<(NodeId, StampNode)>) -> Self {
        let position = head.as_ref().map(|(_, stamp)| stamp.clone());
        Self { head, position }
    }
}

/// Stamp chain of one experiment in one domain
pub struct StampChain<'a> {
    graph: &'a dyn GraphStore,
    dataset: &'a str,
    experiment_id: NodeId,
    domain: SeriesDomain,
}

impl<'a> StampChain<'a> {
    pub fn new(
        graph: &'a dyn GraphStore,
        dataset: &'a str,
        experiment_id: NodeId,
        domain: SeriesDomain,
    ) -> Self {
        Self {
            graph,
            dataset,
            experiment_id,
            domain,
        }
    }

    /// Load a stamp node, `None` if missing or from another domain
    async fn load_stamp(&self, id: NodeId) -> Result<Option<StampNode>> {
        let Some(node) = self.graph.get_node(id, self.dataset).await? else {
            return Ok(None);
        };
        if !node.has_label(self.domain.stamp_label()) {
            return Ok(None);
        }
        match self.domain.stamp_scalar(&node) {
            Some(value) => Ok(Some(StampNode { id, value })),
            None => {
                warn!(stamp_id = id, "Stamp node without a readable value");
                Ok(None)
            }
        }
    }

    /// Current head of the chain and the `takes` edge pointing at it
    pub async fn head(&self) -> Result<Option<(NodeId, StampNode)>> {
        let relationships = self
            .graph
            .get_node_relationships(self.experiment_id, self.dataset)
            .await?;

        for rel in relationships
            .iter()
            .filter(|r| r.is_outgoing(self.experiment_id, relation::TAKES))
        {
            if let Some(stamp) = self.load_stamp(rel.end_node).await? {
                return Ok(Some((rel.id, stamp)));
            }
        }
        Ok(None)
    }

    /// Successor of a stamp and the `next` edge leading to it
    pub async fn successor(&self, stamp: &StampNode) -> Result<Option<(NodeId, StampNode)>> {
        let relationships = self
            .graph
            .get_node_relationships(stamp.id, self.dataset)
            .await?;

        match relationships
            .iter()
            .find(|r| r.is_outgoing(stamp.id, relation::NEXT))
        {
            Some(rel) => Ok(self.load_stamp(rel.end_node).await?.map(|s| (rel.id, s))),
            None => Ok(None),
        }
    }

    /// Every stamp of the chain, following `next` from the head
    pub async fn stamps(&self) -> Result<Vec<StampNode>> {
        let mut stamps = Vec::new();
        let mut current = self.head().await?.map(|(_, stamp)| stamp);
        while let Some(stamp) = current {
            current = self.successor(&stamp).await?.map(|(_, s)| s);
            stamps.push(stamp);
        }
        Ok(stamps)
    }

    async fn create_stamp(&self, value: f64) -> Result<StampNode> {
        let id = self
            .graph
            .create_node(self.domain.stamp_label(), self.dataset)
            .await?;
        self.graph
            .create_properties(
                id,
                &[Property::new(self.domain.stamp_key(), value)],
                self.dataset,
            )
            .await?;
        Ok(StampNode { id, value })
    }

    async fn link_next(&self, from: NodeId, to: NodeId) -> Result<NodeId> {
        Ok(self
            .graph
            .create_relationship(from, to, relation::NEXT, self.dataset)
            .await?)
    }

    /// Point the experiment's `takes` edge at a new head, dropping the old edge
    pub async fn replace_head(&self, old_edge: Option<NodeId>, new_head: NodeId) -> Result<NodeId> {
        if let Some(edge) = old_edge {
            self.graph.delete_relationship(edge, self.dataset).await?;
        }
        debug!(
            experiment_id = self.experiment_id,
            stamp_id = new_head,
            "Stamp chain head replaced"
        );
        Ok(self
            .graph
            .create_relationship(self.experiment_id, new_head, relation::TAKES, self.dataset)
            .await?)
    }

    /// Locate or create the stamp with exactly `value` next to `current`.
    ///
    /// * no `current`: the chain is empty, the new stamp is unlinked
    /// * `current.value == value`: `current` is returned
    /// * `current.value < value`: a stamp is spliced in after `current`;
    ///   the caller has walked so that the successor (if any) is greater
    /// * `current.value > value`: `current` is the head and the new stamp is
    ///   linked in front of it; the caller repoints `takes`
    pub async fn get_or_create_stamp(
        &self,
        value: f64,
        current: Option<&StampNode>,
    ) -> Result<StampNode> {
        let Some(current) = current else {
            return self.create_stamp(value).await;
        };

        if current.value == value {
            return Ok(current.clone());
        }

        if current.value < value {
            let successor = self.successor(current).await?;
            let stamp = self.create_stamp(value).await?;
            self.link_next(current.id, stamp.id).await?;
            if let Some((stale_edge, next)) = successor {
                self.link_next(stamp.id, next.id).await?;
                self.graph
                    .delete_relationship(stale_edge, self.dataset)
                    .await?;
            }
            debug!(value, after = current.value, "Stamp spliced into chain");
            return Ok(stamp);
        }

        let stamp = self.create_stamp(value).await?;
        self.link_next(stamp.id, current.id).await?;
        debug!(value, before = current.value, "Stamp inserted as chain head");
        Ok(stamp)
    }

    /// Resolve the stamp for `value`, walking forward from the cursor.
    ///
    /// A value behind the cursor restarts the walk from the head. The cursor
    /// ends on the resolved stamp and tracks head replacements.
    pub async fn locate(&self, value: f64, cursor: &mut ChainCursor) -> Result<StampNode> {
        let start = match (&cursor.position, &cursor.head) {
            (Some(position), _) if position.value <= value => Some(position.clone()),
            (_, Some((_, head))) => Some(head.clone()),
            _ => None,
        };

        let mut current = match start {
            None => {
                let stamp = self.get_or_create_stamp(value, None).await?;
                let edge = self.replace_head(None, stamp.id).await?;
                cursor.head = Some((edge, stamp.clone()));
                cursor.position = Some(stamp.clone());
                return Ok(stamp);
            }
            Some(head) if head.value > value => {
                let stamp = self.get_or_create_stamp(value, Some(&head)).await?;
                let old_edge = cursor.head.as_ref().map(|(edge, _)| *edge);
                let edge = self.replace_head(old_edge, stamp.id).await?;
                cursor.head = Some((edge, stamp.clone()));
                cursor.position = Some(stamp.clone());
                return Ok(stamp);
            }
            Some(start) => start,
        };

        while current.value < value {
            match self.successor(&current).await? {
                Some((_, next)) if next.value <= value => current = next,
                _ => break,
            }
        }

        let stamp = self.get_or_create_stamp(value, Some(&current)).await?;
        cursor.position = Some(stamp.clone());
        Ok(stamp)
    }

    /// Delete a stamp that no signal value references anymore.
    ///
    /// The predecessor is relinked to the successor, or the experiment's
    /// `takes` edge moves to the successor when the stamp was the head.
    /// Returns whether the stamp was removed.
    pub async fn remove_if_orphaned(&self, stamp_id: NodeId) -> Result<bool> {
        let relationships = self
            .graph
            .get_node_relationships(stamp_id, self.dataset)
            .await?;

        let in_use = self
            .domain
            .stamp_relations()
            .iter()
            .any(|name| relationships.iter().any(|r| r.is_incoming(stamp_id, name)));
        if in_use {
            return Ok(false);
        }

        let predecessor = relationships
            .iter()
            .find(|r| r.is_incoming(stamp_id, relation::NEXT))
            .map(|r| r.start_node);
        let successor = relationships
            .iter()
            .find(|r| r.is_outgoing(stamp_id, relation::NEXT))
            .map(|r| r.end_node);
        let owners: Vec<NodeId> = relationships
            .iter()
            .filter(|r| r.is_incoming(stamp_id, relation::TAKES))
            .map(|r| r.start_node)
            .collect();

        self.graph.delete_node(stamp_id, self.dataset).await?;

        match (predecessor, successor) {
            (Some(previous), Some(next)) => {
                self.link_next(previous, next).await?;
            }
            (None, Some(next)) => {
                for owner in owners {
                    self.graph
                        .create_relationship(owner, next, relation::TAKES, self.dataset)
                        .await?;
                }
            }
            _ => {}
        }

        debug!(stamp_id, "Orphaned stamp removed from chain");
        Ok(true)
    }
}
