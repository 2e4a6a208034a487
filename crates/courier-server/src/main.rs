mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use courier_api::coordinator::DualWriteCoordinator;
use courier_bus::{NatsPublisher, Publisher};
use courier_db::{PgStore, Store};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Store: a failure here disables persistence rather than aborting, so the
    // process comes up and reports the condition per request instead.
    let store: Option<Arc<dyn Store>> = match &config.store {
        Some(store_config) => {
            match PgStore::connect(&store_config.url, store_config.pool.clone()).await {
                Ok(store) => match store.ensure_schema().await {
                    Ok(()) => Some(Arc::new(store)),
                    Err(err) => {
                        error!(%err, "schema migration failed, store disabled");
                        None
                    }
                },
                Err(err) => {
                    error!(%err, "database connection failed, store disabled");
                    None
                }
            }
        }
        None => {
            error!("missing database configuration, store disabled");
            None
        }
    };

    // Publisher: same degraded-startup policy.
    let publisher: Option<Arc<dyn Publisher>> = match &config.bus {
        Some(bus_config) => {
            match NatsPublisher::connect(&bus_config.nats, &bus_config.channel).await {
                Ok(publisher) => {
                    info!(channel = %bus_config.channel, "publisher initialized");
                    Some(Arc::new(publisher))
                }
                Err(err) => {
                    error!(%err, "message bus connection failed, publisher disabled");
                    None
                }
            }
        }
        None => {
            warn!("message bus configuration not fully set, publisher disabled");
            None
        }
    };

    let channel = config
        .bus
        .as_ref()
        .map(|bus| bus.channel.clone())
        .unwrap_or_default();
    let coordinator = Arc::new(DualWriteCoordinator::new(publisher, store, channel));

    let app = courier_api::router(coordinator)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("courier listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
