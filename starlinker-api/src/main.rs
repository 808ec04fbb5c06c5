use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use starlinker_api::{app, state::{AppState, AuthConfig}, BroadcastEventSink};
use starlinker_core::{EventSink, FanoutEventSink, LoggingEventSink};
use starlinker_order::{FulfillmentStore, MemoryStore, OrderTracker};
use starlinker_store::{DbClient, EventProducer, PgFulfillmentStore, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "starlinker_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = starlinker_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting Starlinker API on port {}", config.server.port);

    let mut business_rules = config.business_rules.clone();

    // Storage
    let store: Arc<dyn FulfillmentStore> = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            business_rules = match db.fetch_business_rules(business_rules.clone()).await {
                Ok(rules) => rules,
                Err(e) => {
                    tracing::warn!("Using configured business rules, database overrides unavailable: {}", e);
                    business_rules
                }
            };
            Arc::new(PgFulfillmentStore::new(db.pool.clone()))
        }
        None => {
            tracing::warn!("No database configured; orders are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    // SSE Broadcast Channel
    let (delivery_tx, _) = tokio::sync::broadcast::channel(100);

    let mut sinks: Vec<Arc<dyn EventSink>> = vec![
        Arc::new(LoggingEventSink),
        Arc::new(BroadcastEventSink::new(delivery_tx.clone())),
    ];

    // Kafka Connection
    if let Some(brokers) = &config.kafka.brokers {
        let producer = EventProducer::new(brokers).context("Failed to create Kafka producer")?;
        sinks.push(Arc::new(producer));
    }

    // Redis Connection
    let redis = match &config.redis.url {
        Some(url) => Some(Arc::new(
            RedisClient::new(url).await.context("Failed to connect to Redis")?,
        )),
        None => None,
    };

    let tracker = OrderTracker::new(
        store,
        Arc::new(FanoutEventSink::new(sinks)),
        business_rules.tracker_config(),
    )
    .context("Invalid business rules")?;

    let app_state = AppState {
        tracker: Arc::new(tracker),
        redis,
        delivery_tx,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        business_rules,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
