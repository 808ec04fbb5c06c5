use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::product::Product;

/// A cart line priced against the catalog at one instant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub title: String,
    pub unit_price: i64,
    pub quantity: u32,
    pub line_total: i64,
}

/// Priced cart. The unit prices here are the ones stored on the order items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub lines: Vec<PricedLine>,
    pub subtotal: i64,
}

/// `price × quantity`, `None` on overflow
pub fn line_total(unit_price: i64, quantity: u32) -> Option<i64> {
    unit_price.checked_mul(i64::from(quantity))
}

/// Price each `(product, quantity)` line at the product's current price.
pub fn quote<'a, I>(lines: I) -> Result<Quote, PricingError>
where
    I: IntoIterator<Item = (&'a Product, u32)>,
{
    let mut priced = Vec::new();
    let mut subtotal: i64 = 0;

    for (product, quantity) in lines {
        if product.price < 0 {
            return Err(PricingError::NegativePrice(product.id.to_string()));
        }
        let total = line_total(product.price, quantity)
            .ok_or_else(|| PricingError::Overflow(product.id.to_string()))?;
        subtotal = subtotal
            .checked_add(total)
            .ok_or_else(|| PricingError::Overflow(product.id.to_string()))?;

        priced.push(PricedLine {
            product_id: product.id,
            title: product.title.clone(),
            unit_price: product.price,
            quantity,
            line_total: total,
        });
    }

    Ok(Quote { lines: priced, subtotal })
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Amount overflow while pricing {0}")]
    Overflow(String),

    #[error("Negative price on {0}")]
    NegativePrice(String),
}
