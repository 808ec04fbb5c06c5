use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::info;
use serde_json::Value;

use crate::app_config::BusinessRules;
use starlinker_order::tracker::MAX_ESTIMATED_DELIVERY_DAYS;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay rules stored in the `business_rules` table on top of `defaults`.
    /// Rows look like `{"value": <number>}`; unknown keys are ignored.
    pub async fn fetch_business_rules(&self, defaults: BusinessRules) -> Result<BusinessRules, sqlx::Error> {
        let rows: Vec<(String, Value)> =
            sqlx::query_as("SELECT rule_key, rule_value FROM business_rules")
                .fetch_all(&self.pool)
                .await?;

        Ok(apply_rule_overrides(defaults, rows))
    }
}

fn apply_rule_overrides(defaults: BusinessRules, rows: Vec<(String, Value)>) -> BusinessRules {
    let mut rules = defaults;

    for (key, val) in rows {
        let Some(v) = val.get("value").and_then(Value::as_i64) else {
            continue;
        };
        match key.as_str() {
            "estimated_delivery_days" if (1..=MAX_ESTIMATED_DELIVERY_DAYS).contains(&v) => {
                rules.estimated_delivery_days = v
            }
            "delivery_fee" if v >= 0 => rules.delivery_fee = v,
            "rate_limit_per_minute" if v > 0 => rules.rate_limit_per_minute = v,
            _ => {}
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overrides_apply_valid_values_only() {
        let rules = apply_rule_overrides(
            BusinessRules::default(),
            vec![
                ("delivery_fee".to_string(), json!({"value": 2000})),
                ("estimated_delivery_days".to_string(), json!({"value": 0})),
                ("estimated_delivery_days".to_string(), json!({"value": 100_000})),
                ("rate_limit_per_minute".to_string(), json!({"value": "fast"})),
                ("unknown".to_string(), json!({"value": 1})),
            ],
        );

        assert_eq!(rules.delivery_fee, 2000);
        assert_eq!(rules.estimated_delivery_days, 3);
        assert_eq!(rules.rate_limit_per_minute, 100);
    }
}
