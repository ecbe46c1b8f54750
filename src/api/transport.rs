use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;

/// The HTTP capability the upstream client needs. Responses are returned as
/// parsed JSON regardless of HTTP status; the open-apis `code` field carries
/// the real outcome.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_json(&self, url: &str, bearer: Option<&str>) -> Result<Value, TransportError>;

    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &Value,
    ) -> Result<Value, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str, bearer: Option<&str>) -> Result<Value, TransportError> {
        debug!("Sending GET to {}", url);
        let mut request = self.client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        debug!("GET {} -> {}", url, response.status());
        Ok(response.json().await?)
    }

    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &Value,
    ) -> Result<Value, TransportError> {
        debug!("Sending POST to {}", url);
        let mut request = self.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        debug!("POST {} -> {}", url, response.status());
        Ok(response.json().await?)
    }
}
