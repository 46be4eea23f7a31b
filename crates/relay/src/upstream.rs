use anyhow::Context;
use reqwest::Client;
use shared::{
    error::ProtocolViolation,
    protocol::{
        endpoint_url, query_route, QueryResponse, RelayForwardRequest, RelayRequest,
        RelayResponse,
    },
};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum RelayFailure {
    #[error("request contained no messages")]
    NoMessages,
    #[error("latest message has no text content")]
    MissingContent,
    #[error("Backend API request failed: {0}")]
    Transport(reqwest::Error),
    #[error("Backend API request failed: {0}")]
    Status(u16),
    #[error("Backend API returned an unreadable body: {0}")]
    Malformed(reqwest::Error),
    #[error(transparent)]
    Rejected(#[from] ProtocolViolation),
}

/// Forwards relay requests to the query endpoint. No retries.
#[derive(Clone)]
pub struct Upstream {
    http: Client,
    query_url: Url,
    namespace: String,
}

impl Upstream {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let base = Url::parse(&settings.upstream_url)
            .with_context(|| format!("invalid upstream url '{}'", settings.upstream_url))?;
        let query_url = endpoint_url(&base, query_route())
            .with_context(|| format!("failed to build query endpoint from '{base}'"))?;

        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build().context("failed to build http client")?,
            query_url,
            namespace: settings.namespace.clone(),
        })
    }

    pub fn query_url(&self) -> &Url {
        &self.query_url
    }

    pub async fn forward(&self, request: RelayRequest) -> Result<RelayResponse, RelayFailure> {
        if request.messages.is_empty() {
            return Err(RelayFailure::NoMessages);
        }
        let query = request
            .latest_content()
            .ok_or(RelayFailure::MissingContent)?
            .to_string();
        let body = RelayForwardRequest {
            messages: request.messages,
            query,
            namespace: self.namespace.clone(),
        };
        debug!(messages = body.messages.len(), "forwarding chat request");

        let res = self
            .http
            .post(self.query_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(RelayFailure::Transport)?;
        let status = res.status();
        if !status.is_success() {
            return Err(RelayFailure::Status(status.as_u16()));
        }

        let data: QueryResponse = res.json().await.map_err(RelayFailure::Malformed)?;
        let answer = data.into_answer()?;
        Ok(RelayResponse {
            response: answer.content,
        })
    }
}
