//! Time series and frequency-domain series handlers
//!
//! Both domains expose the same four operations; each route is a thin
//! wrapper naming its [`SeriesDomain`].

use super::handlers::{AppError, GriseraState};
use super::query::{DatasetParams, SeriesQuery};
use crate::graph_api::NodeId;
use crate::signals::{SeriesDomain, SignalSeriesIn, SignalSeriesOut, TransformationIn};
use axum::{
    extract::{Path, Query, State},
    Json,
};

type SeriesResponse = Result<Json<SignalSeriesOut>, AppError>;

async fn save(
    state: GriseraState,
    domain: SeriesDomain,
    params: DatasetParams,
    series: SignalSeriesIn,
) -> SeriesResponse {
    let dataset = state.dataset(params.dataset_name.as_deref());
    let saved = state
        .signals
        .save_signal_series(domain, &series, dataset)
        .await?;
    Ok(Json(saved))
}

async fn get(state: GriseraState, domain: SeriesDomain, id: NodeId, query: SeriesQuery) -> SeriesResponse {
    let dataset = state.dataset(query.dataset_name.as_deref());
    let series = state
        .signals
        .get_signal_series(domain, id, query.read(), dataset)
        .await?;
    Ok(Json(series))
}

async fn delete(
    state: GriseraState,
    domain: SeriesDomain,
    id: NodeId,
    params: DatasetParams,
) -> SeriesResponse {
    let dataset = state.dataset(params.dataset_name.as_deref());
    let deleted = state
        .signals
        .delete_signal_series(domain, id, dataset)
        .await?;
    Ok(Json(deleted))
}

async fn transform(
    state: GriseraState,
    domain: SeriesDomain,
    params: DatasetParams,
    request: TransformationIn,
) -> SeriesResponse {
    let dataset = state.dataset(params.dataset_name.as_deref());
    let result = state
        .signals
        .transform_signal_series(domain, &request, dataset)
        .await?;
    Ok(Json(result))
}

// ============================================================================
// Time series
// ============================================================================

pub async fn save_time_series(
    State(state): State<GriseraState>,
    Query(params): Query<DatasetParams>,
    Json(series): Json<SignalSeriesIn>,
) -> SeriesResponse {
    save(state, SeriesDomain::Time, params, series).await
}

pub async fn get_time_series(
    State(state): State<GriseraState>,
    Path(id): Path<NodeId>,
    Query(query): Query<SeriesQuery>,
) -> SeriesResponse {
    get(state, SeriesDomain::Time, id, query).await
}

pub async fn delete_time_series(
    State(state): State<GriseraState>,
    Path(id): Path<NodeId>,
    Query(params): Query<DatasetParams>,
) -> SeriesResponse {
    delete(state, SeriesDomain::Time, id, params).await
}

pub async fn transform_time_series(
    State(state): State<GriseraState>,
    Query(params): Query<DatasetParams>,
    Json(request): Json<TransformationIn>,
) -> SeriesResponse {
    transform(state, SeriesDomain::Time, params, request).await
}

// ============================================================================
// Frequency-domain series
// ============================================================================

pub async fn save_frequency_domain_series(
    State(state): State<GriseraState>,
    Query(params): Query<DatasetParams>,
    Json(series): Json<SignalSeriesIn>,
) -> SeriesResponse {
    save(state, SeriesDomain::Frequency, params, series).await
}

pub async fn get_frequency_domain_series(
    State(state): State<GriseraState>,
    Path(id): Path<NodeId>,
    Query(query): Query<SeriesQuery>,
) -> SeriesResponse {
    get(state, SeriesDomain::Frequency, id, query).await
}

pub async fn delete_frequency_domain_series(
    State(state): State<GriseraState>,
    Path(id): Path<NodeId>,
    Query(params): Query<DatasetParams>,
) -> SeriesResponse {
    delete(state, SeriesDomain::Frequency, id, params).await
}

pub async fn transform_frequency_domain_series(
    State(state): State<GriseraState>,
    Query(params): Query<DatasetParams>,
    Json(request): Json<TransformationIn>,
) -> SeriesResponse {
    transform(state, SeriesDomain::Frequency, params, request).await
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::{seed_experiment, test_app};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt; // oneshot

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_time_series_lifecycle() {
        let (app, graph) = test_app();
        let experiment = seed_experiment(&graph).await;

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/time_series",
                json!({
                    "experiment_id": experiment,
                    "type": "Timestamp",
                    "source": "ecg",
                    "signal_values": [
                        {"timestamp": 0, "signal_value": {"value": 0.5}},
                        {"timestamp": 10, "signal_value": {"value": 0.7}}
                    ]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let saved = json_body(resp).await;
        let id = saved["id"].as_i64().unwrap();
        assert_eq!(saved["signal_values"].as_array().unwrap().len(), 2);

        // depth defaults to 0
        let resp = app
            .clone()
            .oneshot(empty("GET", &format!("/api/time_series/{}", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let shallow = json_body(resp).await;
        assert_eq!(shallow["signal_values"], json!([]));
        assert_eq!(shallow["type"], "Timestamp");
        assert_eq!(shallow["experiment_id"], experiment);

        let resp = app
            .clone()
            .oneshot(empty(
                "GET",
                &format!("/api/time_series/{}?depth=1&signal_min_value=5", id),
            ))
            .await
            .unwrap();
        let filtered = json_body(resp).await;
        let values = filtered["signal_values"].as_array().unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["signal_value"]["value"], 0.7);
        assert_eq!(values[0]["stamps"][0]["value"], 10.0);

        let resp = app
            .clone()
            .oneshot(empty("DELETE", &format!("/api/time_series/{}", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(graph.count_label("Timestamp", "test").await, 0);

        let resp = app
            .oneshot(empty("GET", &format!("/api/time_series/{}", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(json_body(resp).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_frequency_series_with_dataset() {
        let (app, graph) = test_app();
        let experiment = graph.seed_node("Experiment", vec![], "lab").await;

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/frequency_domain_series?dataset_name=lab",
                json!({
                    "experiment_id": experiment,
                    "type": "Epoch",
                    "signal_values": [
                        {"start_frequency": 8, "end_frequency": 12, "signal_value": {"value": "alpha"}}
                    ]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let id = json_body(resp).await["id"].as_i64().unwrap();
        assert_eq!(graph.count_label("Frequencystamp", "lab").await, 2);

        // Wrong domain and wrong dataset are both misses
        let resp = app
            .clone()
            .oneshot(empty("GET", &format!("/api/time_series/{}?dataset_name=lab", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let resp = app
            .oneshot(empty("GET", &format!("/api/frequency_domain_series/{}", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_validation_errors_are_422() {
        let (app, graph) = test_app();
        let experiment = seed_experiment(&graph).await;

        // Point series given an epoch
        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/time_series",
                json!({
                    "experiment_id": experiment,
                    "type": "Timestamp",
                    "signal_values": [
                        {"start_timestamp": 1, "end_timestamp": 2, "signal_value": {"value": 1}}
                    ]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // Non-integer ids fail deserialization
        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/time_series/transformation",
                json!({"transformation_name": "quadrants", "time_series_ids": ["a"]}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = app
            .oneshot(post_json(
                "/api/time_series/transformation",
                json!({"transformation_name": "wavelet", "time_series_ids": [1]}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(resp).await["error"]
            .as_str()
            .unwrap()
            .contains("wavelet"));
    }

    #[tokio::test]
    async fn test_quadrants_transformation_route() {
        let (app, graph) = test_app();
        let experiment = seed_experiment(&graph).await;

        let mut ids = Vec::new();
        for values in [[5, 5, 10, -5, -10], [10, -5, 5, -5, -5]] {
            let points: Vec<Value> = values
                .iter()
                .enumerate()
                .map(|(i, v)| json!({"timestamp": i, "signal_value": {"value": v}}))
                .collect();
            let resp = app
                .clone()
                .oneshot(post_json(
                    "/api/time_series",
                    json!({"experiment_id": experiment, "type": "Regularly-spaced", "signal_values": points}),
                ))
                .await
                .unwrap();
            ids.push(json_body(resp).await["id"].as_i64().unwrap());
        }

        let resp = app
            .oneshot(post_json(
                "/api/time_series/transformation",
                json!({
                    "transformation_name": "quadrants",
                    "time_series_ids": ids,
                    "additional_properties": [{"key": "origin_x", "value": "0"}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let result = json_body(resp).await;
        let quadrants: Vec<Value> = result["signal_values"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["signal_value"]["value"].clone())
            .collect();
        assert_eq!(quadrants, vec![json!(1), json!(4), json!(1), json!(3), json!(3)]);
        assert_eq!(result["type"], "Regularly-spaced");
    }

    #[tokio::test]
    async fn test_transformation_runtime_error_is_500() {
        let (app, graph) = test_app();
        let experiment = seed_experiment(&graph).await;

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/time_series",
                json!({"experiment_id": experiment, "type": "Timestamp", "signal_values": []}),
            ))
            .await
            .unwrap();
        let id = json_body(resp).await["id"].as_i64().unwrap();

        let resp = app
            .oneshot(post_json(
                "/api/time_series/transformation",
                json!({
                    "transformation_name": "resample_nearest",
                    "time_series_ids": [id],
                    "additional_properties": [{"key": "period", "value": 1}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json_body(resp).await["error"]
            .as_str()
            .unwrap()
            .contains("no signal values"));
    }
}
