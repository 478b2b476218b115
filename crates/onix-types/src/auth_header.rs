//! The parsed shape of a signed `Authorization`/`Proxy-Authorization` header.
//! Parsing and formatting live in `onix-auth`; this crate only carries the
//! shape so other crates can depend on it without pulling in the codec.

use serde::{Deserialize, Serialize};

/// `Signature keyId="...",algorithm="ed25519",created="...",expires="...",
/// headers="(created) (expires) digest",signature="..."`, decomposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthHeader {
    /// `{subscriber_id}|{unique_key_id}|{algorithm}`.
    pub key_id: String,
    pub algorithm: String,
    pub created: i64,
    pub expires: i64,
    pub headers: Vec<String>,
    /// Base64-encoded signature bytes.
    pub signature: String,
}

impl AuthHeader {
    pub fn subscriber_id(&self) -> Option<&str> {
        self.key_id.split('|').next()
    }

    pub fn unique_key_id(&self) -> Option<&str> {
        self.key_id.split('|').nth(1)
    }
}
