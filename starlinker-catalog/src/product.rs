use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Condition of a listed item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProductCondition {
    New,
    LikeNew,
    Good,
    Fair,
    Refurbished,
}

impl ProductCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCondition::New => "new",
            ProductCondition::LikeNew => "like_new",
            ProductCondition::Good => "good",
            ProductCondition::Fair => "fair",
            ProductCondition::Refurbished => "refurbished",
        }
    }
}

impl FromStr for ProductCondition {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ProductCondition::New),
            "like_new" => Ok(ProductCondition::LikeNew),
            "good" => Ok(ProductCondition::Good),
            "fair" => Ok(ProductCondition::Fair),
            "refurbished" => Ok(ProductCondition::Refurbished),
            other => Err(CatalogError::Invalid(format!("unknown condition: {}", other))),
        }
    }
}

/// A marketplace listing. `price` is in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub condition: ProductCondition,
    pub price: i64,
    pub stock_quantity: i32,
    pub location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for listing a new product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub seller_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub condition: ProductCondition,
    pub price: i64,
    pub stock_quantity: i32,
    pub location: Option<String>,
}

impl NewProduct {
    pub fn into_product(self) -> Result<Product, CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::Invalid("title must not be empty".to_string()));
        }
        if self.price < 0 {
            return Err(CatalogError::Invalid(format!("negative price: {}", self.price)));
        }
        if self.stock_quantity < 0 {
            return Err(CatalogError::Invalid(format!(
                "negative stock quantity: {}",
                self.stock_quantity
            )));
        }

        Ok(Product {
            id: Uuid::new_v4(),
            seller_id: self.seller_id,
            title: self.title.trim().to_string(),
            description: self.description,
            category: self.category,
            condition: self.condition,
            price: self.price,
            stock_quantity: self.stock_quantity,
            location: self.location,
            is_active: true,
            created_at: Utc::now(),
        })
    }
}

/// Read/write access to the product catalog
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create_product(&self, product: &Product) -> Result<(), CatalogError>;

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, CatalogError>;

    /// Fetch several products at once. Unknown ids are simply absent from the result.
    async fn get_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Invalid product: {0}")]
    Invalid(String),

    #[error("Catalog storage failed: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewProduct {
        NewProduct {
            seller_id: Uuid::new_v4(),
            title: "  Starlink Mini  ".to_string(),
            description: None,
            category: "Internet".to_string(),
            condition: ProductCondition::LikeNew,
            price: 1000,
            stock_quantity: 3,
            location: Some("Nairobi".to_string()),
        }
    }

    #[test]
    fn test_new_product_is_active_and_trimmed() {
        let product = draft().into_product().unwrap();
        assert!(product.is_active);
        assert_eq!(product.stock_quantity, 3);
        assert_eq!(product.title, "Starlink Mini");
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut d = draft();
        d.price = -1;
        assert!(matches!(d.into_product(), Err(CatalogError::Invalid(_))));
    }

    #[test]
    fn test_condition_round_trip_names() {
        assert_eq!("like_new".parse::<ProductCondition>().unwrap(), ProductCondition::LikeNew);
        assert!("mint".parse::<ProductCondition>().is_err());
    }
}
