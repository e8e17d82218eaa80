//! s402 facilitator HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p s402-facilitator --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p s402-facilitator
//!
//! # Configure logging level
//! RUST_LOG=info cargo run -p s402-facilitator
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to TOML configuration file (default: `config.toml`)
//! - `HOST` / `PORT` — Override bind address and port
//! - `RUST_LOG` — Log level filter (default: `info`)
//! - Relay keys referenced by `$VAR` in the config file

use std::net::SocketAddr;
use std::sync::Arc;

use alloy_network::EthereumWallet;
use alloy_provider::{Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use axum::http::Method;
use s402::Facilitator;
use s402_evm::facilitator::{ChainHandle, RpcSignatureChecker, SessionFacilitator};
use s402_evm::provider::RelayChainProvider;
use s402_http::{HttpFacilitatorClient, UpstreamConfig};
use tower_http::cors;
use tracing_subscriber::EnvFilter;

use s402_facilitator::config::FacilitatorConfig;
use s402_facilitator::handlers::{AppEngine, FacilitatorState, facilitator_router};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Facilitator failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = FacilitatorConfig::load()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        chains = config.chains.len(),
        "Loaded configuration"
    );

    if config.chains.is_empty() {
        tracing::warn!("No chains configured — facilitator will report no supported kinds");
    }

    let mut handles = Vec::new();
    for (network, chain_cfg) in &config.chains {
        let settings = match chain_cfg.resolve(network) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(network = %network, "Skipping chain: {e}");
                continue;
            }
        };

        let read_provider = ProviderBuilder::new()
            .connect_http(settings.rpc_url.clone())
            .erased();
        let checker = RpcSignatureChecker::new(read_provider);

        let relay = match chain_cfg.resolved_relay_key() {
            Some(key) => {
                let signer: PrivateKeySigner = key
                    .parse()
                    .map_err(|e| format!("Invalid relay key for {network}: {e}"))?;
                let relay_address = signer.address();
                let wallet = EthereumWallet::from(signer);
                let provider = ProviderBuilder::new()
                    .wallet(wallet)
                    .connect_http(settings.rpc_url.clone())
                    .erased();
                tracing::info!(network = %network, relay = %relay_address, "Direct settlement enabled");
                Some(RelayChainProvider::new(provider, relay_address))
            }
            None => {
                tracing::info!(network = %network, "No relay key — forwarding-only mode");
                None
            }
        };

        let upstream = settings.upstream_url.clone().map(|url| {
            tracing::info!(network = %network, upstream = %url, "EOA payments forwarded upstream");
            Arc::new(HttpFacilitatorClient::new(UpstreamConfig::new(url))) as Arc<dyn Facilitator>
        });

        handles.push(ChainHandle {
            settings,
            checker,
            relay,
            upstream,
        });
    }

    let engine: AppEngine = SessionFacilitator::new(handles, config.fees.to_schedule()?)
        .with_clock_skew_tolerance(config.clock_skew_tolerance);
    let state: FacilitatorState = Arc::new(engine);

    let app = facilitator_router(Arc::clone(&state)).layer(
        cors::CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(cors::Any),
    );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Facilitator listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Facilitator shut down gracefully");
    Ok(())
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to listen for Ctrl-C");
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
