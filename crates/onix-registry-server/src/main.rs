//! Entry point for the reference Registry server: loads config, wires the
//! core engine to real adapters, runs self-registration, and serves until a
//! shutdown signal arrives.

use std::sync::Arc;

use clap::Parser;
use onix_crypto::{GeneratingKeyManager, SealedBoxEncryptor};
use onix_net::{HttpClientConfig, ReqwestNpClient};
use onix_registry_core::SelfRegistration;
use onix_registry_server::config::RegistryConfig;
use onix_registry_server::events::LoggingEventPublisher;
use onix_registry_server::AppState;
use onix_testing::InMemoryRegistryRepository;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "onix-registry-server", about = "ONIX Registry control-plane HTTP surface")]
struct Cli {
    /// Path to a TOML config file. Falls back to documented defaults when absent.
    #[arg(long, default_value = "registry.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = RegistryConfig::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("could not load {}: {e}; using defaults", cli.config);
        RegistryConfig::default()
    });

    onix_telemetry::init_tracing(&config.log.level)?;
    onix_telemetry::prometheus::install()?;

    let repository: Arc<dyn onix_api::ports::RegistryRepository> = Arc::new(InMemoryRegistryRepository::new());
    let keys: Arc<dyn onix_api::ports::KeyManager> = Arc::new(GeneratingKeyManager::new());
    let events: Arc<dyn onix_api::ports::EventPublisher> = Arc::new(LoggingEventPublisher);
    let encryptor: Arc<dyn onix_api::crypto::Encryptor> = Arc::new(SealedBoxEncryptor);
    let validator: Arc<dyn onix_api::crypto::SignValidator> = Arc::new(onix_crypto::Ed25519Validator);

    let np_client_config = HttpClientConfig {
        timeout_secs: config.np_client.timeout,
        ..HttpClientConfig::default()
    };
    let np_client: Arc<dyn onix_api::ports::NpClient> = Arc::new(ReqwestNpClient::new(&np_client_config)?);

    let bootstrap = SelfRegistration::new(
        repository.clone(),
        keys.clone(),
        config.setup.subscriber_id.clone(),
        config.setup.domain.clone(),
        config.setup.url.clone(),
    );
    bootstrap.ensure_bootstrapped().await?;

    let state = AppState::new(
        repository,
        events,
        encryptor,
        np_client,
        validator,
        config.admin.operation_retry_max,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(true);
    });

    let addr = config.listen_addr().parse()?;
    onix_registry_server::run_server(addr, state, shutdown_rx).await
}
