//! The registry-issued challenge handed to a new subscriber before it is
//! admitted: a random value the subscriber must decrypt and echo back,
//! proving it holds the private half of the `encr_public_key` it registered.

use rand::RngCore;

/// Number of random bytes making up a challenge, hex-encoded for transport.
const CHALLENGE_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge(String);

impl Challenge {
    /// Draws a fresh challenge from an OS-backed RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rngs::OsRng)
    }

    /// Draws a fresh challenge from an injected RNG, so tests can assert on
    /// the exact value produced.
    pub fn generate_with(rng: &mut impl RngCore) -> Self {
        let mut bytes = [0u8; CHALLENGE_LEN];
        rng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// A subscriber's decrypted response matches iff it equals the
    /// challenge's hex-encoded plaintext exactly.
    pub fn verify(&self, candidate: &str) -> bool {
        self.0 == candidate
    }
}
