pub mod app_config;
pub mod database;
pub mod order_repo;
pub mod redis_repo;
pub mod events;

pub use database::DbClient;
pub use order_repo::PgFulfillmentStore;
pub use redis_repo::RedisClient;
pub use events::EventProducer;
