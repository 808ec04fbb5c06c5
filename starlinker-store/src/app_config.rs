use serde::Deserialize;
use std::env;
use starlinker_order::TrackerConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub kafka: KafkaConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    #[serde(default = "default_eta_days")]
    pub estimated_delivery_days: i64,
    #[serde(default)]
    pub delivery_fee: i64,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: i64,
}

fn default_eta_days() -> i64 { 3 }
fn default_rate_limit() -> i64 { 100 }
fn default_max_connections() -> u32 { 5 }

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            estimated_delivery_days: default_eta_days(),
            delivery_fee: 0,
            rate_limit_per_minute: default_rate_limit(),
        }
    }
}

impl BusinessRules {
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            estimated_delivery_days: self.estimated_delivery_days,
            delivery_fee: self.delivery_fee,
        }
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.rate_limit_per_minute <= 0 {
            return Err(config::ConfigError::Message(format!(
                "business_rules.rate_limit_per_minute must be positive, got {}",
                self.rate_limit_per_minute
            )));
        }
        self.tracker_config()
            .validate()
            .map_err(|e| config::ConfigError::Message(format!("business_rules: {}", e)))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Unset means the in-memory store
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: None, max_connections: default_max_connections() }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct KafkaConfig {
    pub brokers: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `STARLINKER__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("STARLINKER").separator("__"))
            .build()?;

        Self::from_source(s)
    }

    fn from_source(s: config::Config) -> Result<Self, config::ConfigError> {
        let cfg: Config = s.try_deserialize()?;
        cfg.business_rules.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_sections_default() {
        let s = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                port = 9000

                [auth]
                jwt_secret = "s3cret"
                jwt_expiration_seconds = 60
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let cfg = Config::from_source(s).unwrap();

        assert_eq!(cfg.server.port, 9000);
        assert!(cfg.database.url.is_none());
        assert!(cfg.kafka.brokers.is_none());
        assert_eq!(cfg.business_rules.estimated_delivery_days, 3);
        assert_eq!(cfg.business_rules.tracker_config().delivery_fee, 0);
    }

    fn with_rules(rules: &str) -> Result<Config, config::ConfigError> {
        let toml = format!(
            "[server]\nport = 9000\n[auth]\njwt_secret = \"s\"\njwt_expiration_seconds = 60\n[business_rules]\n{}",
            rules
        );
        let s = config::Config::builder()
            .add_source(config::File::from_str(&toml, config::FileFormat::Toml))
            .build()
            .unwrap();
        Config::from_source(s)
    }

    #[test]
    fn test_business_rules_are_range_checked() {
        assert!(with_rules("delivery_fee = 2000").is_ok());
        assert!(with_rules("delivery_fee = -5000").is_err());
        assert!(with_rules("estimated_delivery_days = 0").is_err());
        assert!(with_rules("estimated_delivery_days = 1000000000").is_err());
        assert!(with_rules("rate_limit_per_minute = 0").is_err());
    }
}
