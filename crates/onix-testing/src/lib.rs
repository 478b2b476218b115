//! In-memory fakes for every `onix-api` port, shared by unit and
//! integration tests across the workspace. Mirrors the teacher's own
//! `ioi-test-utils`-style mock collaborators: no real database, HTTP
//! server, or KMS is ever spun up to exercise the core engine.

pub mod crypto;
pub mod events;
pub mod keymanager;
pub mod np_client;
pub mod registry_client;
pub mod repository;

pub use crypto::{FakeDecrypter, FakeEncryptor, FakeSignValidator, FakeSigner};
pub use events::RecordingEventPublisher;
pub use keymanager::InMemoryKeyManager;
pub use np_client::ScriptedNpClient;
pub use registry_client::ScriptedRegistryClient;
pub use repository::InMemoryRegistryRepository;
