//! Experiment handlers

use super::handlers::{AppError, GriseraState};
use super::query::DatasetParams;
use crate::experiments::{self, ExperimentIn, ExperimentOut};
use crate::graph_api::NodeId;
use axum::{
    extract::{Path, Query, State},
    Json,
};

pub async fn create_experiment(
    State(state): State<GriseraState>,
    Query(params): Query<DatasetParams>,
    Json(experiment): Json<ExperimentIn>,
) -> Result<Json<ExperimentOut>, AppError> {
    let dataset = state.dataset(params.dataset_name.as_deref());
    let created =
        experiments::create_experiment(state.app.graph.as_ref(), &experiment, dataset).await?;
    Ok(Json(created))
}

pub async fn get_experiment(
    State(state): State<GriseraState>,
    Path(id): Path<NodeId>,
    Query(params): Query<DatasetParams>,
) -> Result<Json<ExperimentOut>, AppError> {
    let dataset = state.dataset(params.dataset_name.as_deref());
    let experiment = experiments::get_experiment(state.app.graph.as_ref(), id, dataset).await?;
    Ok(Json(experiment))
}
