//! A [`RegistryClient`] backed by `reqwest`: the subscriber-side view of the
//! Beckn registry's HTTP surface (§4.O).

use async_trait::async_trait;
use onix_api::ports::{RegistryClient, RegistryClientError};
use onix_types::subscription::SubscriptionFilter;
use onix_types::{Lro, Subscription};
use reqwest::{Method, StatusCode};

use crate::config::HttpClientConfig;

pub struct ReqwestRegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestRegistryClient {
    pub fn new(base_url: impl Into<String>, config: &HttpClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: config.build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, RegistryClientError> {
        if response.status() == StatusCode::NOT_FOUND {
            // Callers that care about a specific operation_id attach it themselves.
            return Err(RegistryClientError::OperationNotFound(response.url().path().to_string()));
        }
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(RegistryClientError::RemoteRejected(format!("status {status}: {body}")))
    }
}

#[async_trait]
impl RegistryClient for ReqwestRegistryClient {
    async fn subscribe(&self, body: serde_json::Value) -> Result<serde_json::Value, RegistryClientError> {
        let response = self
            .client
            .post(self.url("/subscribe"))
            .json(&body)
            .send()
            .await
            .map_err(|e| RegistryClientError::Transport(e.to_string()))?;
        let response = Self::error_for_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RegistryClientError::Transport(format!("decoding response body: {e}")))
    }

    async fn update_subscription(
        &self,
        body: serde_json::Value,
        authorization: &str,
    ) -> Result<serde_json::Value, RegistryClientError> {
        let response = self
            .client
            .request(Method::PATCH, self.url("/subscribe"))
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&body)
            .send()
            .await
            .map_err(|e| RegistryClientError::Transport(e.to_string()))?;
        let response = Self::error_for_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RegistryClientError::Transport(format!("decoding response body: {e}")))
    }

    async fn lookup(&self, filter: &SubscriptionFilter) -> Result<Vec<Subscription>, RegistryClientError> {
        let response = self
            .client
            .post(self.url("/lookup"))
            .json(filter)
            .send()
            .await
            .map_err(|e| RegistryClientError::Transport(e.to_string()))?;
        let response = Self::error_for_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RegistryClientError::Transport(format!("decoding response body: {e}")))
    }

    async fn get_operation(&self, operation_id: &str) -> Result<Lro, RegistryClientError> {
        let response = self
            .client
            .get(self.url(&format!("/operations/{operation_id}")))
            .send()
            .await
            .map_err(|e| RegistryClientError::Transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(RegistryClientError::OperationNotFound(operation_id.to_string()));
        }
        let response = Self::error_for_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| RegistryClientError::Transport(format!("decoding response body: {e}")))
    }
}
