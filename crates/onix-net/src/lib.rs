//! The outbound HTTP edge: the only crate that holds a `reqwest::Client`.
//! Implements the `NpClient` and `RegistryClient` ports defined in
//! `onix-api` so the rest of the workspace stays transport-agnostic.

pub mod config;
pub mod np_client;
pub mod registry_client;

pub use config::HttpClientConfig;
pub use np_client::ReqwestNpClient;
pub use registry_client::ReqwestRegistryClient;
