//! The admin engine's source of fresh challenges (§4.A), abstracted behind a
//! trait so tests can supply a fixed value instead of the OS RNG — mirrors
//! how the lookup processor's shuffle (§4.L.5) takes an injectable `RngCore`.

use onix_crypto::Challenge;

pub trait ChallengeSource: Send + Sync {
    fn generate(&self) -> Challenge;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsChallengeSource;

impl ChallengeSource for OsChallengeSource {
    fn generate(&self) -> Challenge {
        Challenge::generate()
    }
}
