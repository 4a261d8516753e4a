use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::error::{ApiError, ApiException, ErrorCode};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const REGION_PATH: &str = "/api/v1/region/";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Server { status, .. } => Some(ErrorCode::from_status(*status)),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Network(detail) => {
                format!("Backend unreachable; check the API URL and network ({detail})")
            }
            Self::Server { status, message } => format!("Server error ({status}): {message}"),
            Self::Decode(detail) => format!("Unexpected response from server ({detail})"),
        }
    }
}

impl From<ApiException> for FetchError {
    fn from(value: ApiException) -> Self {
        Self::Server {
            status: value.status,
            message: value.message,
        }
    }
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, FetchError>;
}

pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn get_json(&self, url: &str, query: &[(String, String)]) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| FetchError::Network(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::Network(err.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiError>(&body)
                .map(|err| err.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(ApiException::new(status.as_u16(), message).into());
        }

        serde_json::from_slice(&body).map_err(|err| FetchError::Decode(err.to_string()))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn ApiTransport>,
    base_url: String,
    region: String,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        base_url: &str,
        region: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let parsed =
            Url::parse(base_url).with_context(|| format!("invalid api base url '{base_url}'"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("api base url '{base_url}' must use http or https");
        }
        Ok(Self {
            transport,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            region: region.into(),
        })
    }

    pub fn over_http(
        base_url: &str,
        region: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Self::new(Arc::new(HttpTransport::new(timeout)?), base_url, region)
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn set_region(&mut self, region: impl Into<String>) {
        self.region = region.into();
    }

    /// URL of `resource_path` within the current region,
    /// e.g. `/instance/` -> `{base}/api/v1/{region}/instance/`.
    pub fn build_api_url(&self, resource_path: &str) -> String {
        format!(
            "{}/api/v1/{}/{}",
            self.base_url,
            self.region,
            resource_path.trim_start_matches('/')
        )
    }

    pub fn regions_url(&self) -> String {
        format!("{}{REGION_PATH}", self.base_url)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        resource_path: &str,
        query: &[(String, String)],
    ) -> Result<T, FetchError> {
        self.get_url(&self.build_api_url(resource_path), query).await
    }

    pub async fn get_url<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<T, FetchError> {
        debug!(url, params = query.len(), "GET");
        let body = self.transport.get_json(url, query).await.map_err(|err| {
            warn!(url, error = %err, "request failed");
            err
        })?;
        serde_json::from_value(body).map_err(|err| {
            warn!(url, error = %err, "unexpected payload");
            FetchError::Decode(err.to_string())
        })
    }
}
