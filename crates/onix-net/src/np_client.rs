//! A [`NpClient`] backed by `reqwest`: the registry's single-attempt POST to
//! a network participant's own HTTP surface (§4.N).

use async_trait::async_trait;
use onix_api::ports::{NpClient, NpClientError};
use serde_json::json;

use crate::config::HttpClientConfig;

pub struct ReqwestNpClient {
    client: reqwest::Client,
}

impl ReqwestNpClient {
    pub fn new(config: &HttpClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: config.build_client()?,
        })
    }

    async fn post_json(&self, url: &str, body: serde_json::Value) -> Result<serde_json::Value, NpClientError> {
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NpClientError::Timeout
                } else {
                    NpClientError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NpClientError::RemoteRejected(format!("status {}: {}", status.as_u16(), text)));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| NpClientError::Transport(format!("decoding response body: {e}")))
    }
}

#[async_trait]
impl NpClient for ReqwestNpClient {
    async fn on_subscribe(
        &self,
        url: &str,
        challenge_ciphertext: &str,
        message_id: &str,
    ) -> Result<serde_json::Value, NpClientError> {
        let target = format!("{}/on_subscribe", url.trim_end_matches('/'));
        self.post_json(&target, json!({ "challenge": challenge_ciphertext, "message_id": message_id }))
            .await
    }

    async fn relay(&self, url: &str, body: serde_json::Value) -> Result<serde_json::Value, NpClientError> {
        self.post_json(url, body).await
    }
}
