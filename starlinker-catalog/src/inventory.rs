use std::collections::BTreeMap;
use uuid::Uuid;

use crate::product::Product;

/// Sum requested quantities per product. A cart may list the same product on
/// several lines; stock has to cover the total.
pub fn aggregate_quantities<I>(lines: I) -> BTreeMap<Uuid, u32>
where
    I: IntoIterator<Item = (Uuid, u32)>,
{
    let mut totals = BTreeMap::new();
    for (product_id, quantity) in lines {
        let entry = totals.entry(product_id).or_insert(0u32);
        *entry = entry.saturating_add(quantity);
    }
    totals
}

/// Check that `requested` units of `product` can be sold right now.
pub fn check_stock(product: &Product, requested: u32) -> Result<(), InventoryError> {
    if !product.is_active {
        return Err(InventoryError::Inactive(product.id.to_string()));
    }

    let available = product.stock_quantity.max(0) as u32;
    if requested > available {
        return Err(InventoryError::InsufficientStock {
            product_id: product.id,
            requested,
            available,
        });
    }

    Ok(())
}

/// Take `quantity` units out of stock.
pub fn decrement(product: &mut Product, quantity: u32) -> Result<(), InventoryError> {
    check_stock(product, quantity)?;
    product.stock_quantity -= quantity as i32;
    Ok(())
}

/// Put `quantity` units back (cancelled or failed delivery).
pub fn restock(product: &mut Product, quantity: u32) {
    product.stock_quantity = product.stock_quantity.saturating_add(quantity as i32);
}

#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Product not active: {0}")]
    Inactive(String),

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },
}
