//! Muster - role-bound party formation service
//!
//! Users assemble fixed-size teams by reacting on shared roster views; the
//! core keeps every roster consistent across its views, closes idle parties,
//! and gates who may close one. Platform adapters connect over the gateway
//! and own all rendering and delivery.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use muster_core::PartyService;
use muster_net::Gateway;

mod commands;
mod config;
mod janitor;
mod keepalive;
mod runtime;
mod status;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting muster");

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let service = PartyService::new(config.auto_close_delay());

    let (gateway, adapter_events) = match Gateway::start(config.gateway_port).await {
        Ok(started) => started,
        Err(e) => {
            tracing::error!("Failed to start gateway: {}", e);
            std::process::exit(1);
        }
    };
    let gateway = Arc::new(gateway);

    // Directives queue up here and fan out to every connected adapter
    let (outbox_tx, mut outbox_rx) = mpsc::channel(256);
    {
        let gateway = gateway.clone();
        tokio::spawn(async move {
            while let Some(msg) = outbox_rx.recv().await {
                gateway.broadcast(msg).await;
            }
        });
    }

    let (shutdown_tx, _) = broadcast::channel(1);

    let runtime = runtime::Runtime::new(service.clone(), outbox_tx, &config);
    let runtime_handle = tokio::spawn(runtime.run(
        adapter_events,
        service.subscribe(),
        shutdown_tx.subscribe(),
    ));

    let status_state = Arc::new(status::StatusState {
        service: service.clone(),
        started_at: chrono::Utc::now(),
    });
    let status_port = config.status_port;
    tokio::spawn(async move {
        if let Err(e) = status::serve(status_port, status_state).await {
            tracing::error!(error = %e, "Status endpoint failed");
        }
    });

    tokio::spawn(keepalive::run(config.keepalive.clone()));

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }

    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(());
    gateway.shutdown();
    let _ = runtime_handle.await;
}
