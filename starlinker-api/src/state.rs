use std::sync::Arc;
use starlinker_order::OrderTracker;
use starlinker_shared::models::events::DeliveryStatusChangedEvent;
use starlinker_store::app_config::BusinessRules;
use starlinker_store::RedisClient;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<OrderTracker>,
    /// Rate limiting is off when Redis is not configured
    pub redis: Option<Arc<RedisClient>>,
    pub delivery_tx: broadcast::Sender<DeliveryStatusChangedEvent>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}
