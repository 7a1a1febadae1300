use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RemoteError;

/// Raw GET access to the network. Implementations perform exactly one
/// request per call and never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, RemoteError>;
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, RemoteError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pokedex-cache/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, RemoteError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::status(status.as_u16(), url));
        }
        Ok(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, RemoteError> {
        let response = self.get(url).await?;
        response
            .json()
            .await
            .map_err(|err| RemoteError::transport(format!("invalid JSON from {url}: {err}")))
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self.get(url).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Resolves resource paths against the API base and hands them to the
/// transport.
#[derive(Clone)]
pub struct RemoteClient {
    api_base: String,
    transport: Arc<dyn Transport>,
}

impl RemoteClient {
    pub fn new(api_base: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            api_base,
            transport,
        }
    }

    /// Absolute URLs pass through untouched; anything else is joined onto
    /// the API base.
    pub fn resource_url(&self, resource: &str) -> String {
        if resource.starts_with("http://") || resource.starts_with("https://") {
            return resource.to_string();
        }
        format!("{}/{}", self.api_base, resource.trim_start_matches('/'))
    }

    pub async fn fetch(&self, resource: &str) -> Result<Value, RemoteError> {
        let url = self.resource_url(resource);
        log::debug!("GET {url}");
        self.transport.get_json(&url).await
    }
}
