//! HTTP client for the Graph API
//!
//! Every response carries an `errors` field; a non-null value is turned into
//! an error naming the failed call. No call is retried.

use super::models::*;
use super::traits::GraphStore;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Client for the Graph API
pub struct GraphApiClient {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct IdResponse {
    id: Option<NodeId>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Deserialize)]
struct ErrorsResponse {
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Deserialize)]
struct NodeResponse {
    id: Option<NodeId>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    properties: Vec<Property>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Deserialize)]
struct RelationshipsResponse {
    #[serde(default)]
    relationships: Vec<Relationship>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Deserialize)]
struct RowsResponse {
    #[serde(default)]
    rows: Vec<Vec<GraphNode>>,
    #[serde(default)]
    errors: Option<Value>,
}

/// Fail when the Graph API reported errors for `call`
fn check_errors(errors: Option<Value>, call: &str) -> Result<()> {
    match errors {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Array(items)) if items.is_empty() => Ok(()),
        Some(Value::String(message)) => bail!("{} failed: {}", call, message),
        Some(other) => bail!("{} failed: {}", call, other),
    }
}

impl GraphApiClient {
    /// Create a new client for the Graph API at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Graph API HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request with the dataset discriminator and decode the JSON body
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        dataset: &str,
        call: &str,
    ) -> Result<T> {
        let response = request
            .query(&[("database_name", dataset)])
            .send()
            .await
            .with_context(|| format!("{} request failed", call))?;

        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            bail!("{} failed with status {}: {}", call, status, body);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("{} returned an unreadable body", call))
    }
}

#[async_trait]
impl GraphStore for GraphApiClient {
    async fn create_node(&self, label: &str, dataset: &str) -> Result<NodeId> {
        let request = self
            .http
            .post(self.url("/nodes"))
            .json(&json!({ "labels": [label] }));
        let body: IdResponse = self.send(request, dataset, "create node").await?;
        check_errors(body.errors, "create node")?;
        body.id.context("create node returned no id")
    }

    async fn get_node(&self, id: NodeId, dataset: &str) -> Result<Option<GraphNode>> {
        let response = self
            .http
            .get(self.url(&format!("/nodes/{}", id)))
            .query(&[("database_name", dataset)])
            .send()
            .await
            .context("get node request failed")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if status.is_server_error() {
            bail!("get node failed with status {}", status);
        }

        let body: NodeResponse = response
            .json()
            .await
            .context("get node returned an unreadable body")?;
        check_errors(body.errors, "get node")?;

        Ok(body.id.map(|id| GraphNode {
            id,
            labels: body.labels,
            properties: body.properties,
        }))
    }

    async fn create_properties(
        &self,
        id: NodeId,
        properties: &[Property],
        dataset: &str,
    ) -> Result<()> {
        let request = self
            .http
            .post(self.url(&format!("/nodes/{}/properties", id)))
            .json(properties);
        let body: ErrorsResponse = self.send(request, dataset, "create properties").await?;
        check_errors(body.errors, "create properties")
    }

    async fn delete_node(&self, id: NodeId, dataset: &str) -> Result<()> {
        let request = self.http.delete(self.url(&format!("/nodes/{}", id)));
        let body: ErrorsResponse = self.send(request, dataset, "delete node").await?;
        check_errors(body.errors, "delete node")
    }

    async fn create_relationship(
        &self,
        start: NodeId,
        end: NodeId,
        name: &str,
        dataset: &str,
    ) -> Result<NodeId> {
        let request = self.http.post(self.url("/relationships")).json(&json!({
            "start_node": start,
            "end_node": end,
            "name": name,
        }));
        let body: IdResponse = self.send(request, dataset, "create relationship").await?;
        check_errors(body.errors, "create relationship")?;
        body.id.context("create relationship returned no id")
    }

    async fn create_relationship_properties(
        &self,
        id: NodeId,
        properties: &[Property],
        dataset: &str,
    ) -> Result<()> {
        let request = self
            .http
            .post(self.url(&format!("/relationships/{}/properties", id)))
            .json(properties);
        let body: ErrorsResponse = self
            .send(request, dataset, "create relationship properties")
            .await?;
        check_errors(body.errors, "create relationship properties")
    }

    async fn delete_relationship(&self, id: NodeId, dataset: &str) -> Result<()> {
        let request = self
            .http
            .delete(self.url(&format!("/relationships/{}", id)));
        let body: ErrorsResponse = self.send(request, dataset, "delete relationship").await?;
        check_errors(body.errors, "delete relationship")
    }

    async fn get_node_relationships(
        &self,
        id: NodeId,
        dataset: &str,
    ) -> Result<Vec<Relationship>> {
        let request = self
            .http
            .get(self.url(&format!("/nodes/{}/relationships", id)));
        let body: RelationshipsResponse = self
            .send(request, dataset, "get node relationships")
            .await?;
        check_errors(body.errors, "get node relationships")?;
        Ok(body.relationships)
    }

    async fn get_nodes_by_query(&self, query: &NodesQuery, dataset: &str) -> Result<QueryRows> {
        let request = self.http.post(self.url("/nodes_query")).json(query);
        let body: RowsResponse = self.send(request, dataset, "nodes query").await?;
        check_errors(body.errors, "nodes query")?;
        Ok(QueryRows { rows: body.rows })
    }
}
