pub mod product;
pub mod pricing;
pub mod inventory;

pub use product::{CatalogError, NewProduct, Product, ProductCondition, ProductRepository};
pub use pricing::{PricedLine, Quote};
pub use inventory::InventoryError;
