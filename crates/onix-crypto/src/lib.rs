//! Cryptographic primitives for the handshake challenge and for the
//! Ed25519/X25519 implementations of the `onix-api` crypto ports.

pub mod challenge;
pub mod keymanager;
pub mod seal;
pub mod sign;

pub use challenge::Challenge;
pub use keymanager::GeneratingKeyManager;
pub use seal::{SealedBoxDecrypter, SealedBoxEncryptor};
pub use sign::{Ed25519Signer, Ed25519Validator};
