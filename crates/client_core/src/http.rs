use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::{Namespace, RepositoryReference},
    protocol::{
        endpoint_url, ingest_route, query_route, Answer, IngestAck, IngestRequest, QueryRequest,
        QueryResponse,
    },
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{error::ServiceError, RemoteService};

/// [`RemoteService`] backed by the ingestion/query HTTP API.
pub struct HttpRemoteService {
    http: Client,
    ingest_url: Url,
    query_url: Url,
}

impl HttpRemoteService {
    pub fn new(service_url: &str, request_timeout: Option<Duration>) -> Result<Self> {
        let base = Url::parse(service_url)
            .with_context(|| format!("invalid service url '{service_url}'"))?;
        let ingest_url = endpoint_url(&base, ingest_route())
            .with_context(|| format!("failed to build ingestion endpoint from '{base}'"))?;
        let query_url = endpoint_url(&base, query_route())
            .with_context(|| format!("failed to build query endpoint from '{base}'"))?;

        let mut builder = Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("failed to build http client")?;

        Ok(Self {
            http,
            ingest_url,
            query_url,
        })
    }

    pub fn ingest_url(&self) -> &Url {
        &self.ingest_url
    }

    pub fn query_url(&self) -> &Url {
        &self.query_url
    }
}

#[async_trait]
impl RemoteService for HttpRemoteService {
    async fn ingest(&self, reference: &RepositoryReference) -> Result<IngestAck, ServiceError> {
        let endpoint = self.ingest_url.as_str();
        let res = self
            .http
            .post(self.ingest_url.clone())
            .json(&IngestRequest {
                github_url: reference.to_string(),
            })
            .send()
            .await
            .map_err(|err| ServiceError::transport(endpoint, err))?;

        let status = res.status();
        if !status.is_success() {
            return Err(ServiceError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        // The status alone acknowledges; the body is informational.
        let ack = match res.bytes().await {
            Ok(body) => serde_json::from_slice::<IngestAck>(&body).unwrap_or_default(),
            Err(err) => {
                debug!(%endpoint, error = %err, "ingestion ack body unreadable");
                IngestAck::default()
            }
        };
        if ack.status.as_deref() == Some("error") {
            warn!(
                %endpoint,
                message = ack.message.as_deref().unwrap_or_default(),
                "ingestion acknowledged with an error status"
            );
        } else {
            info!(%endpoint, "ingestion acknowledged");
        }
        Ok(ack)
    }

    async fn query(&self, text: &str, namespace: &Namespace) -> Result<Answer, ServiceError> {
        let endpoint = self.query_url.as_str();
        let res = self
            .http
            .post(self.query_url.clone())
            .json(&QueryRequest {
                query: text.to_string(),
                namespace: namespace.to_string(),
            })
            .send()
            .await
            .map_err(|err| ServiceError::transport(endpoint, err))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            debug!(%endpoint, status = status.as_u16(), %body, "query endpoint error body");
            return Err(ServiceError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body: QueryResponse = res.json().await.map_err(|err| {
            if err.is_decode() {
                ServiceError::malformed(endpoint, err)
            } else {
                ServiceError::transport(endpoint, err)
            }
        })?;

        body.into_answer()
            .map_err(|violation| ServiceError::Rejected {
                endpoint: endpoint.to_string(),
                violation,
            })
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
