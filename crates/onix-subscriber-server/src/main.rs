//! Entry point for the reference Subscriber (NP) server: loads config,
//! wires `onix-subscriber-core` to real adapters, and serves until a
//! shutdown signal arrives.

use std::sync::Arc;

use clap::Parser;
use onix_crypto::{Ed25519Signer, GeneratingKeyManager, SealedBoxDecrypter};
use onix_net::{HttpClientConfig, ReqwestRegistryClient};
use onix_subscriber_core::SubscriberService;
use onix_subscriber_server::config::SubscriberServerConfig;
use onix_subscriber_server::events::LoggingEventPublisher;
use onix_subscriber_server::AppState;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "onix-subscriber-server", about = "ONIX Subscriber (NP) HTTP surface")]
struct Cli {
    /// Path to a TOML config file. Falls back to documented defaults when absent.
    #[arg(long, default_value = "subscriber.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SubscriberServerConfig::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("could not load {}: {e}; using defaults", cli.config);
        SubscriberServerConfig::default()
    });

    onix_telemetry::init_tracing(&config.log.level)?;
    onix_telemetry::prometheus::install()?;

    let keys: Arc<dyn onix_api::ports::KeyManager> = Arc::new(GeneratingKeyManager::new());
    let events: Arc<dyn onix_api::ports::EventPublisher> = Arc::new(LoggingEventPublisher);
    let decrypter: Arc<dyn onix_api::crypto::Decrypter> = Arc::new(SealedBoxDecrypter::new(keys.clone()));
    let signer: Arc<dyn onix_api::crypto::Signer> = Arc::new(Ed25519Signer::new(keys.clone()));

    let registry_client_config = HttpClientConfig {
        timeout_secs: config.registry.timeout,
        pool_max_idle_per_host: config.registry.max_idle_conns_per_host,
        pool_idle_timeout_secs: config.registry.idle_conn_timeout,
    };
    let registry_client: Arc<dyn onix_api::ports::RegistryClient> =
        Arc::new(ReqwestRegistryClient::new(&config.registry.base_url, &registry_client_config)?);

    let service = SubscriberService::new(
        keys,
        registry_client,
        decrypter,
        signer,
        events,
        config.subscriber.reg_id.clone(),
        config.subscriber.reg_key_id.clone(),
    );
    let state = AppState::new(service);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = shutdown_tx.send(true);
    });

    let addr = config.listen_addr().parse()?;
    onix_subscriber_server::run_server(addr, state, shutdown_rx).await
}
