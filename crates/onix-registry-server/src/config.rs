//! The Registry service's recognized configuration keys (§6). Loaded from a
//! TOML file; YAML loading is out of scope, and no hand-rolled line parsing
//! is used — `serde`/`toml` do the work the same way the teacher's
//! `validator`/`services` crates load `workload.toml`.

use std::path::Path;

use serde::Deserialize;

fn default_log_level() -> String {
    "INFO".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_read_secs() -> u64 {
    10
}
fn default_write_secs() -> u64 {
    10
}
fn default_idle_secs() -> u64 {
    120
}
fn default_shutdown_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_read_secs")]
    pub read: u64,
    #[serde(default = "default_write_secs")]
    pub write: u64,
    #[serde(default = "default_idle_secs")]
    pub idle: u64,
    #[serde(default = "default_shutdown_secs")]
    pub shutdown: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            read: default_read_secs(),
            write: default_write_secs(),
            idle: default_idle_secs(),
            shutdown: default_shutdown_secs(),
        }
    }
}

/// Opaque repository connection params; the concrete store is a Non-goal,
/// so this crate only carries the keys through to a future adapter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DbConfig {
    #[serde(default)]
    pub dsn: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventConfig {
    #[serde(rename = "projectID", default)]
    pub project_id: Option<String>,
    #[serde(rename = "topicID", default)]
    pub topic_id: Option<String>,
}

fn default_operation_retry_max() -> u32 {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(rename = "operationRetryMax", default = "default_operation_retry_max")]
    pub operation_retry_max: u32,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            operation_retry_max: default_operation_retry_max(),
        }
    }
}

/// Self-registration identity (§4.I).
#[derive(Debug, Clone, Deserialize)]
pub struct SetupConfig {
    #[serde(rename = "keyID")]
    pub key_id: String,
    #[serde(rename = "subscriberID")]
    pub subscriber_id: String,
    pub url: String,
    pub domain: String,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            key_id: "registry-key".to_string(),
            subscriber_id: "registry".to_string(),
            url: "http://localhost:8080".to_string(),
            domain: "nic2004:52110".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NpClientConfig {
    #[serde(default = "default_npclient_timeout")]
    pub timeout: u64,
}

fn default_npclient_timeout() -> u64 {
    10
}

impl Default for NpClientConfig {
    fn default() -> Self {
        Self {
            timeout: default_npclient_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub setup: SetupConfig,
    #[serde(rename = "npClient", default)]
    pub np_client: NpClientConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            server: ServerConfig::default(),
            timeouts: TimeoutsConfig::default(),
            db: DbConfig::default(),
            event: EventConfig::default(),
            admin: AdminConfig::default(),
            setup: SetupConfig::default(),
            np_client: NpClientConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Loads and parses a TOML config file. Missing keys fall back to their
    /// documented defaults via `#[serde(default)]`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_used_when_the_document_is_minimal() {
        let config: RegistryConfig = toml::from_str(
            r#"
            [setup]
            keyID = "registry-key"
            subscriberID = "registry"
            url = "http://registry.example/"
            domain = "retail"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.admin.operation_retry_max, 3);
        assert_eq!(config.np_client.timeout, 10);
    }

    #[test]
    fn overrides_are_honored() {
        let config: RegistryConfig = toml::from_str(
            r#"
            [log]
            level = "DEBUG"

            [server]
            host = "127.0.0.1"
            port = 9090

            [admin]
            operationRetryMax = 5

            [setup]
            keyID = "k"
            subscriberID = "registry"
            url = "http://registry.example/"
            domain = "retail"
            "#,
        )
        .unwrap();
        assert_eq!(config.log.level, "DEBUG");
        assert_eq!(config.listen_addr(), "127.0.0.1:9090");
        assert_eq!(config.admin.operation_retry_max, 5);
    }
}
