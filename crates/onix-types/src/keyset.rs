//! Signing and encryption key material held by a subscriber or the registry
//! itself, keyed by `unique_key_id`.

use serde::{Deserialize, Serialize};

/// A single keypair bundle. Private key material is base64/hex-encoded at
/// rest; this type carries it opaquely and leaves decoding to `onix-crypto`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyset {
    pub unique_key_id: String,
    pub subscriber_id: String,
    pub signing_public: String,
    pub signing_private: String,
    pub encr_public: String,
    pub encr_private: String,
    #[serde(default)]
    pub valid: bool,
}

impl Keyset {
    pub fn new(
        unique_key_id: impl Into<String>,
        subscriber_id: impl Into<String>,
        signing_public: impl Into<String>,
        signing_private: impl Into<String>,
        encr_public: impl Into<String>,
        encr_private: impl Into<String>,
    ) -> Self {
        Self {
            unique_key_id: unique_key_id.into(),
            subscriber_id: subscriber_id.into(),
            signing_public: signing_public.into(),
            signing_private: signing_private.into(),
            encr_public: encr_public.into(),
            encr_private: encr_private.into(),
            valid: true,
        }
    }
}
