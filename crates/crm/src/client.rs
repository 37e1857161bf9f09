//! HTTP implementation of the remote endpoint.

use crate::config::EndpointConfig;
use crate::endpoint::RemoteEndpoint;
use async_trait::async_trait;
use engine_core::{Error, Result};
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{debug, info, warn};
use url::Url;

/// Header carrying the CRM API token.
const API_TOKEN_HEADER: &str = "Api-Token";

/// reqwest-backed [`RemoteEndpoint`].
#[derive(Clone)]
pub struct HttpEndpoint {
    http_client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpEndpoint {
    /// Creates a new endpoint client.
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| Error::config(format!("invalid endpoint base_url: {}", e)))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        info!(
            base_url = %config.base_url,
            token_configured = config.api_token.is_some(),
            "Created CRM endpoint client"
        );

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let joined = format!("{}{}", self.base_url, path);
        Url::parse(&joined).map_err(|e| Error::transport(format!("invalid URL {}: {}", joined, e)))
    }
}

#[async_trait]
impl RemoteEndpoint for HttpEndpoint {
    async fn fetch(&self, path: &str) -> Result<Value> {
        let url = self.url_for(path)?;
        let start = Instant::now();
        metrics().endpoint_requests.inc();

        let mut request = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json");
        if let Some(ref token) = self.api_token {
            request = request.header(API_TOKEN_HEADER, token);
        }

        let response = request.send().await.map_err(|e| {
            metrics().endpoint_errors.inc();
            warn!(path = %path, error = %e, "Endpoint request failed");
            Error::transport(format!("request to {} failed: {}", path, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            metrics().endpoint_errors.inc();
            let body = response.text().await.unwrap_or_default();
            warn!(path = %path, status = %status, body = %body, "Endpoint returned error");
            return Err(Error::status(
                status.as_u16(),
                format!("API Error: {}", status),
            ));
        }

        let body: Value = response.json().await.map_err(|e| {
            metrics().endpoint_errors.inc();
            warn!(path = %path, error = %e, "Failed to decode endpoint response");
            Error::decode(format!("invalid JSON from {}: {}", path, e))
        })?;

        let elapsed = start.elapsed();
        metrics()
            .endpoint_latency_ms
            .observe(elapsed.as_millis() as u64);
        debug!(path = %path, latency_ms = %elapsed.as_millis(), "Endpoint request complete");

        Ok(body)
    }
}
