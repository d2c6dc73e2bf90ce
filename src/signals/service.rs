//! Signal series persistence engine
//!
//! Orchestrates the stamp and value chain managers for save, read, delete
//! and transformation. Every chain mutation of an experiment runs under that
//! experiment's mutex, so concurrent saves never interleave their splices.

use super::error::{Result, SignalError};
use super::kind::{
    relation, SeriesDomain, SeriesKind, SeriesType, EXPERIMENT_LABEL, MEASURE_LABEL,
    OBSERVABLE_INFORMATION_LABEL, SIGNAL_VALUE_LABEL,
};
use super::models::{
    SeriesRead, SignalPointOut, SignalSeriesIn, SignalSeriesOut, SignalValueNode, StampDescriptor,
    StampNode, TransformationIn,
};
use super::stamp_chain::{ChainCursor, StampChain};
use super::value_chain::{ValueChain, VALUE_KEY};
use crate::graph_api::{
    FilterOperator, GraphNode, GraphStore, NodeId, NodesQuery, Property, QueryNode,
};
use crate::transform::{self, params, MaterializedSeries, TransformationName, TransformationParams};
use anyhow::anyhow;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

/// Series node property holding the declared type
const TYPE_KEY: &str = "type";
/// Series node property holding the source
const SOURCE_KEY: &str = "source";
/// `transformedFrom` property holding the source position
const ORDER_KEY: &str = "order";

type LockKey = (String, NodeId);

/// Save, read, delete and transform signal series
pub struct SignalSeriesService {
    graph: Arc<dyn GraphStore>,
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
}

/// Held lock on one experiment's stamp chain.
///
/// Releasing the last holder drops the experiment's entry from the lock map.
struct ExperimentGuard<'a> {
    locks: &'a DashMap<LockKey, Arc<Mutex<()>>>,
    key: LockKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ExperimentGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold a clone, so a count of 1 means the map owns the only one
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl SignalSeriesService {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self {
            graph,
            locks: DashMap::new(),
        }
    }

    /// Exclusive access to one experiment's stamp chain
    async fn lock_experiment(&self, dataset: &str, experiment_id: NodeId) -> ExperimentGuard<'_> {
        let key = (dataset.to_string(), experiment_id);
        let lock = self.locks.entry(key.clone()).or_default().clone();
        let guard = lock.lock_owned().await;
        ExperimentGuard {
            locks: &self.locks,
            key,
            guard: Some(guard),
        }
    }

    /// Fetch a node and check its label
    async fn require_node(
        &self,
        id: NodeId,
        label: &'static str,
        dataset: &str,
    ) -> Result<GraphNode> {
        self.graph
            .get_node(id, dataset)
            .await?
            .filter(|node| node.has_label(label))
            .ok_or_else(|| SignalError::not_found(label, id))
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// Save a series and append its values to the experiment's stamp chain.
    ///
    /// Points are expected in ascending stamp order. Stamp shapes are checked
    /// before anything is written; after that the first failing graph call
    /// aborts the save and leaves what was already created in place.
    pub async fn save_signal_series(
        &self,
        domain: SeriesDomain,
        series: &SignalSeriesIn,
        dataset: &str,
    ) -> Result<SignalSeriesOut> {
        let kind = SeriesKind::new(domain, series.series_type);
        let descriptors = series
            .signal_values
            .iter()
            .map(|point| point.descriptor(kind.shape()))
            .collect::<Result<Vec<_>>>()?;

        let _guard = self.lock_experiment(dataset, series.experiment_id).await;

        self.require_node(series.experiment_id, EXPERIMENT_LABEL, dataset)
            .await?;
        if let Some(measure_id) = series.measure_id {
            self.require_node(measure_id, MEASURE_LABEL, dataset).await?;
        }
        if let Some(information_id) = series.observable_information_id {
            self.require_node(information_id, OBSERVABLE_INFORMATION_LABEL, dataset)
                .await?;
        }

        let series_id = self
            .graph
            .create_node(domain.series_label(), dataset)
            .await?;
        self.graph
            .create_properties(series_id, &series_properties(series), dataset)
            .await?;

        let links = [
            (Some(series.experiment_id), relation::IN_EXPERIMENT),
            (series.measure_id, relation::HAS_MEASURE),
            (
                series.observable_information_id,
                relation::HAS_OBSERVABLE_INFORMATION,
            ),
        ];
        for (target, name) in links {
            if let Some(target) = target {
                self.graph
                    .create_relationship(series_id, target, name, dataset)
                    .await?;
            }
        }

        let chain = StampChain::new(self.graph.as_ref(), dataset, series.experiment_id, domain);
        let values = ValueChain::new(self.graph.as_ref(), dataset, series_id);
        let mut cursor = ChainCursor::at_head(chain.head().await?);
        let mut previous = None;
        let mut points = Vec::with_capacity(descriptors.len());

        for (point, descriptor) in series.signal_values.iter().zip(descriptors) {
            let value = values
                .create_signal_value(&point.signal_value, previous)
                .await?;

            let stamps = match descriptor {
                StampDescriptor::Point(stamp) => vec![chain.locate(stamp, &mut cursor).await?],
                StampDescriptor::Interval { start, end } => {
                    let first = chain.locate(start, &mut cursor).await?;
                    // The end is resolved ahead of the cursor, which stays
                    // on the start for the next epoch
                    let mut lookahead = cursor.clone();
                    let last = chain.locate(end, &mut lookahead).await?;
                    cursor.head = lookahead.head;
                    vec![first, last]
                }
            };

            for (name, stamp) in kind.relation_names().into_iter().zip(&stamps) {
                self.graph
                    .create_relationship(value.id, stamp.id, name, dataset)
                    .await?;
            }

            previous = Some(value.id);
            points.push(SignalPointOut {
                signal_value: value,
                stamps,
            });
        }

        info!(
            series_id,
            experiment_id = series.experiment_id,
            values = points.len(),
            "Saved {}",
            domain
        );

        Ok(SignalSeriesOut {
            id: series_id,
            series_type: series.series_type,
            source: series.source.clone(),
            experiment_id: Some(series.experiment_id),
            measure_id: series.measure_id,
            observable_information_id: series.observable_information_id,
            additional_properties: echoed_properties(&series.additional_properties),
            signal_values: points,
        })
    }

    // ========================================================================
    // Read
    // ========================================================================

    /// Read a series; values and stamps are included when `depth != 0`.
    ///
    /// The value range filters stamps (the start stamp for `min_value`, the
    /// end stamp for `max_value`) inside the pattern query.
    pub async fn get_signal_series(
        &self,
        domain: SeriesDomain,
        id: NodeId,
        read: SeriesRead,
        dataset: &str,
    ) -> Result<SignalSeriesOut> {
        let node = self.require_node(id, domain.series_label(), dataset).await?;

        let series_type = node
            .property(TYPE_KEY)
            .and_then(Value::as_str)
            .and_then(SeriesType::parse)
            .ok_or_else(|| anyhow!("{} {} has no readable type", domain, id))?;
        let source = node
            .property(SOURCE_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);

        let relationships = self.graph.get_node_relationships(id, dataset).await?;
        let linked = |name: &str| {
            relationships
                .iter()
                .find(|r| r.is_outgoing(id, name))
                .map(|r| r.end_node)
        };

        let signal_values = if read.depth != 0 {
            self.read_points(SeriesKind::new(domain, series_type), id, read, dataset)
                .await?
        } else {
            Vec::new()
        };

        Ok(SignalSeriesOut {
            id,
            series_type,
            source,
            experiment_id: linked(relation::IN_EXPERIMENT),
            measure_id: linked(relation::HAS_MEASURE),
            observable_information_id: linked(relation::HAS_OBSERVABLE_INFORMATION),
            additional_properties: echoed_properties(&node.properties),
            signal_values,
        })
    }

    /// Values and stamps of a series in one pattern query, in chain order
    async fn read_points(
        &self,
        kind: SeriesKind,
        series_id: NodeId,
        read: SeriesRead,
        dataset: &str,
    ) -> Result<Vec<SignalPointOut>> {
        let domain = kind.domain;
        let relations = kind.relation_names();

        let mut query = NodesQuery::new();
        let series = query.node(QueryNode::labeled(domain.series_label()).with_id(series_id));
        let first = query.node(QueryNode::labeled(SIGNAL_VALUE_LABEL));
        let value = query.node(QueryNode::labeled(SIGNAL_VALUE_LABEL).returned());
        query
            .relation(series, first, relation::HAS_SIGNAL)
            .hops(first, value, relation::NEXT, 0, None);

        let last = relations.len() - 1;
        for (index, name) in relations.iter().enumerate() {
            let mut stamp = QueryNode::labeled(domain.stamp_label()).returned();
            if let (0, Some(min)) = (index, read.min_value) {
                stamp = stamp.filter(domain.stamp_key(), FilterOperator::GreaterOrEqual, min);
            }
            if index == last {
                if let Some(max) = read.max_value {
                    stamp = stamp.filter(domain.stamp_key(), FilterOperator::LessOrEqual, max);
                }
            }
            let slot = query.node(stamp);
            query.relation(value, slot, name);
        }

        let rows = self.graph.get_nodes_by_query(&query, dataset).await?;
        debug!(series_id, rows = rows.rows.len(), "Series pattern query");

        rows.rows
            .into_iter()
            .map(|row| -> Result<SignalPointOut> {
                let [value, stamps @ ..] = row.as_slice() else {
                    return Err(anyhow!("empty row for series {}", series_id).into());
                };
                if stamps.len() != relations.len() {
                    return Err(anyhow!(
                        "signal value {} returned {} stamps, expected {}",
                        value.id,
                        stamps.len(),
                        relations.len()
                    )
                    .into());
                }
                let stamps = stamps
                    .iter()
                    .map(|stamp| {
                        domain
                            .stamp_scalar(stamp)
                            .map(|scalar| StampNode {
                                id: stamp.id,
                                value: scalar,
                            })
                            .ok_or_else(|| {
                                SignalError::from(anyhow!("stamp {} has no readable value", stamp.id))
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(SignalPointOut {
                    signal_value: SignalValueNode {
                        id: value.id,
                        value: value.property(VALUE_KEY).cloned().unwrap_or(Value::Null),
                        additional_properties: value
                            .properties
                            .iter()
                            .filter(|p| p.key != VALUE_KEY)
                            .cloned()
                            .collect(),
                    },
                    stamps,
                })
            })
            .collect()
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Delete a series with its values and unlink stamps left unreferenced.
    ///
    /// Returns the series as it was before deletion.
    pub async fn delete_signal_series(
        &self,
        domain: SeriesDomain,
        id: NodeId,
        dataset: &str,
    ) -> Result<SignalSeriesOut> {
        let header = self
            .get_signal_series(domain, id, SeriesRead::default(), dataset)
            .await?;
        let _guard = match header.experiment_id {
            Some(experiment_id) => Some(self.lock_experiment(dataset, experiment_id).await),
            None => None,
        };

        let series = self
            .get_signal_series(domain, id, SeriesRead::full(), dataset)
            .await?;

        for point in &series.signal_values {
            self.graph
                .delete_node(point.signal_value.id, dataset)
                .await?;
        }
        self.graph.delete_node(id, dataset).await?;

        let mut removed = 0usize;
        if let Some(experiment_id) = series.experiment_id {
            let chain = StampChain::new(self.graph.as_ref(), dataset, experiment_id, domain);
            let mut seen = HashSet::new();
            for stamp in series.signal_values.iter().flat_map(|p| &p.stamps) {
                if seen.insert(stamp.id) && chain.remove_if_orphaned(stamp.id).await? {
                    removed += 1;
                }
            }
        }

        info!(
            series_id = id,
            values = series.signal_values.len(),
            stamps_removed = removed,
            "Deleted {}",
            domain
        );
        Ok(series)
    }

    // ========================================================================
    // Transform
    // ========================================================================

    /// Run a transformation over stored series and save the result.
    ///
    /// The new series joins the sources' experiment, echoes the request
    /// parameters, and is linked to its sources by `transformedFrom`
    /// (with an `order` property) and per value by `basedOn`.
    pub async fn transform_signal_series(
        &self,
        domain: SeriesDomain,
        request: &TransformationIn,
        dataset: &str,
    ) -> Result<SignalSeriesOut> {
        let name: TransformationName = request.transformation_name.parse()?;
        if request.series_ids.is_empty() {
            return Err(SignalError::validation(
                "a transformation needs at least one source series",
            ));
        }

        let mut sources = Vec::with_capacity(request.series_ids.len());
        for id in &request.series_ids {
            sources.push(
                self.get_signal_series(domain, *id, SeriesRead::full(), dataset)
                    .await?,
            );
        }

        let experiment_id = sources[0].experiment_id.ok_or_else(|| {
            SignalError::validation(format!(
                "series {} is not linked to an experiment",
                sources[0].id
            ))
        })?;
        if let Some(other) = sources
            .iter()
            .find(|s| s.experiment_id != Some(experiment_id))
        {
            return Err(SignalError::validation(format!(
                "series {} belongs to a different experiment than series {}",
                other.id, sources[0].id
            )));
        }

        let materialized = sources
            .iter()
            .map(MaterializedSeries::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let output = transform::apply(
            name,
            &materialized,
            &TransformationParams::new(&request.additional_properties),
        )?;

        let mut additional_properties: Vec<Property> = request
            .additional_properties
            .iter()
            .filter(|p| p.key != params::TRANSFORMATION_NAME)
            .cloned()
            .collect();
        additional_properties.push(Property::new(params::TRANSFORMATION_NAME, name.as_str()));

        let saved = self
            .save_signal_series(
                domain,
                &SignalSeriesIn {
                    experiment_id,
                    series_type: output.series_type,
                    source: None,
                    measure_id: None,
                    observable_information_id: None,
                    additional_properties,
                    signal_values: output.points,
                },
                dataset,
            )
            .await?;

        for (order, source) in sources.iter().enumerate() {
            let edge = self
                .graph
                .create_relationship(saved.id, source.id, relation::TRANSFORMED_FROM, dataset)
                .await?;
            self.graph
                .create_relationship_properties(edge, &[Property::new(ORDER_KEY, order)], dataset)
                .await?;
        }
        for (point, group) in saved.signal_values.iter().zip(&output.provenance) {
            for source_value in group {
                self.graph
                    .create_relationship(
                        point.signal_value.id,
                        *source_value,
                        relation::BASED_ON,
                        dataset,
                    )
                    .await?;
            }
        }

        info!(
            series_id = saved.id,
            transformation = %name,
            sources = sources.len(),
            "Transformed {}",
            domain
        );
        Ok(saved)
    }
}

/// Properties written on a new series node
fn series_properties(series: &SignalSeriesIn) -> Vec<Property> {
    let mut properties = vec![Property::new(TYPE_KEY, series.series_type.as_str())];
    if let Some(source) = &series.source {
        properties.push(Property::new(SOURCE_KEY, source.as_str()));
    }
    properties.extend(echoed_properties(&series.additional_properties));
    properties
}

/// Free-form properties, without the keys the engine owns
fn echoed_properties(properties: &[Property]) -> Vec<Property> {
    properties
        .iter()
        .filter(|p| p.key != TYPE_KEY && p.key != SOURCE_KEY)
        .cloned()
        .collect()
}
