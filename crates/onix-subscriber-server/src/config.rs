//! The Subscriber (NP) service's recognized configuration keys (§6),
//! including the subscriber-only keys and the outbound `registry.*` client
//! tuning knobs.

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
    8081
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

fn default_registry_timeout() -> u64 {
    10
}
fn default_max_idle_conns_per_host() -> usize {
    32
}
fn default_idle_conn_timeout() -> u64 {
    90
}

/// Outbound `reqwest::Client` tuning for the `ReqwestRegistryClient`, mapped
/// onto `onix_net::HttpClientConfig` in `main.rs`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryClientConfig {
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(default = "default_registry_timeout")]
    pub timeout: u64,
    #[serde(rename = "maxIdleConnsPerHost", default = "default_max_idle_conns_per_host")]
    pub max_idle_conns_per_host: usize,
    #[serde(rename = "idleConnTimeout", default = "default_idle_conn_timeout")]
    pub idle_conn_timeout: u64,
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: default_registry_timeout(),
            max_idle_conns_per_host: default_max_idle_conns_per_host(),
            idle_conn_timeout: default_idle_conn_timeout(),
        }
    }
}

/// Subscriber-only identity/infra keys (§6).
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriberConfig {
    #[serde(rename = "projectID", default)]
    pub project_id: Option<String>,
    #[serde(rename = "redisAddr", default)]
    pub redis_addr: Option<String>,
    #[serde(rename = "regID")]
    pub reg_id: String,
    #[serde(rename = "regKeyID")]
    pub reg_key_id: String,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            redis_addr: None,
            reg_id: "registry".to_string(),
            reg_key_id: "registry-key".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriberServerConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub registry: RegistryClientConfig,
    #[serde(flatten)]
    pub subscriber: SubscriberConfig,
}

impl Default for SubscriberServerConfig {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            server: ServerConfig::default(),
            timeouts: TimeoutsConfig::default(),
            registry: RegistryClientConfig::default(),
            subscriber: SubscriberConfig::default(),
        }
    }
}

impl SubscriberServerConfig {
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
        let config: SubscriberServerConfig = toml::from_str(
            r#"
            regID = "registry"
            regKeyID = "registry-key"

            [registry]
            baseURL = "http://registry.example/"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.registry.timeout, 10);
        assert_eq!(config.subscriber.reg_id, "registry");
    }

    #[test]
    fn subscriber_only_keys_round_trip() {
        let config: SubscriberServerConfig = toml::from_str(
            r#"
            projectID = "proj-1"
            redisAddr = "127.0.0.1:6379"
            regID = "registry"
            regKeyID = "registry-key"

            [registry]
            baseURL = "http://registry.example/"
            timeout = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.subscriber.project_id.as_deref(), Some("proj-1"));
        assert_eq!(config.subscriber.redis_addr.as_deref(), Some("127.0.0.1:6379"));
        assert_eq!(config.registry.timeout, 5);
    }
}
