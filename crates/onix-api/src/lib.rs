//! Seams between the registry/subscriber core logic and its collaborators:
//! cryptographic primitives, persistence, key custody, event publication and
//! the two outbound HTTP clients. Every trait here is implemented by exactly
//! one production type (in `onix-crypto` / `onix-net`) and at least one
//! in-memory fake (in `onix-testing`).

pub mod crypto;
pub mod ports;

pub use crypto::{Decrypter, Encryptor, SignValidator, Signer};
pub use ports::{EventPublisher, KeyManager, NpClient, RegistryClient, RegistryRepository};
