//! Produces a signed `Authorization` header value for an outbound request.

use std::sync::Arc;

use onix_api::crypto::Signer;
use onix_api::ports::KeyManager;
use onix_types::AuthHeader;
use time::OffsetDateTime;

use crate::error::AuthError;
use crate::header;

const VALIDITY_SECONDS: i64 = 5 * 60;

/// Signs `body` on behalf of `subscriber_id` and returns the formatted
/// `Signature keyId=...` header value.
///
/// The signed message is the concatenation of the raw body bytes with the
/// decimal `created` and `expires` timestamps, so the signature is
/// content-addressed on exactly `(body, private_key, created, expires)`.
pub struct AuthGen {
    keys: Arc<dyn KeyManager>,
    signer: Arc<dyn Signer>,
}

impl AuthGen {
    pub fn new(keys: Arc<dyn KeyManager>, signer: Arc<dyn Signer>) -> Self {
        Self { keys, signer }
    }

    pub async fn auth_header(&self, body: &[u8], subscriber_id: &str) -> Result<String, AuthError> {
        let keyset = self
            .keys
            .get_active_keyset(subscriber_id)
            .await
            .map_err(|e| AuthError::key_fetch_failed(e.to_string()))?;

        let now = OffsetDateTime::now_utc().unix_timestamp();
        let expires = now + VALIDITY_SECONDS;

        let mut message = Vec::with_capacity(body.len() + 32);
        message.extend_from_slice(body);
        message.extend_from_slice(now.to_string().as_bytes());
        message.extend_from_slice(expires.to_string().as_bytes());

        let signature = self
            .signer
            .sign(&keyset.unique_key_id, &message)
            .await
            .map_err(|e| AuthError::signing_failed(e.to_string()))?;

        let header = AuthHeader {
            key_id: format!("{}|{}|ed25519", subscriber_id, keyset.unique_key_id),
            algorithm: "ed25519".to_string(),
            created: now,
            expires,
            headers: vec!["(created)".into(), "(expires)".into(), "digest".into()],
            signature,
        };

        Ok(header::format(&header))
    }
}
