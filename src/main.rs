use actix_web::web;
use anyhow::Context;
use scylla::client::session_builder::SessionBuilder;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_service::catalog::HttpBookClient;
use order_service::config::{Config, StoreKind};
use order_service::domain::order::OrderService;
use order_service::http::{start_server, AppState};
use order_service::messaging::{subscribe_dispatched_orders, RedpandaPublisher};
use order_service::metrics::OrderMetrics;
use order_service::store::{InMemoryOrderRepository, OrderRepository, ScyllaOrderRepository};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_service=debug"))
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        catalog = %config.catalog.uri,
        store = ?config.store.kind,
        brokers = %config.redpanda.brokers,
        "Starting order service"
    );

    // === 1. Metrics registry ===
    let metrics = Arc::new(OrderMetrics::new()?);

    // === 2. Order store ===
    let repository: Arc<dyn OrderRepository> = match config.store.kind {
        StoreKind::Memory => {
            tracing::warn!("Using in-memory order store; orders are lost on restart");
            Arc::new(InMemoryOrderRepository::new())
        }
        StoreKind::Scylla => {
            tracing::info!("Connecting to ScyllaDB...");
            let session = SessionBuilder::new()
                .known_nodes(config.store.nodes())
                .build()
                .await
                .context("failed to connect to ScyllaDB")?;

            let store = ScyllaOrderRepository::new(Arc::new(session));
            store.ensure_schema(&config.store.keyspace).await?;
            Arc::new(store)
        }
    };

    // === 3. Catalog client and event publisher ===
    let catalog = Arc::new(HttpBookClient::new(&config.catalog.uri, config.catalog.timeout())?);
    let publisher = Arc::new(RedpandaPublisher::new(&config.redpanda.brokers)?);

    let service = Arc::new(
        OrderService::new(
            catalog,
            repository,
            publisher,
            config.redpanda.order_accepted_topic.clone(),
        )
        .with_metrics(metrics.clone()),
    );

    // === 4. Dispatch reconciliation ===
    let dispatched = subscribe_dispatched_orders(
        &config.redpanda.brokers,
        &config.redpanda.consumer_group,
        &config.redpanda.order_dispatched_topic,
    )?;
    let consumer_service = service.clone();
    tokio::spawn(async move {
        consumer_service.run_dispatch_consumer(dispatched).await;
    });

    // === 5. HTTP ===
    let state = web::Data::new(AppState { service, metrics });
    start_server(state, &config.server.host, config.server.port).await?;

    tracing::info!("Order service stopped");
    Ok(())
}
