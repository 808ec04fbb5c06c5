pub mod models;
pub mod delivery;
pub mod review;
pub mod view;
pub mod store;
pub mod memory;
pub mod tracker;

pub use models::{DeliveryAddress, Order, OrderItem, OrderStatus};
pub use delivery::{Delivery, DeliveryProgress, DeliveryStatus};
pub use review::{ProductReviews, RatingSummary, Review};
pub use view::{DeliveryListing, OrderItemView, OrderStats, OrderSummary, OrderView};
pub use store::{FulfillmentStore, StoreError};
pub use memory::MemoryStore;
pub use tracker::{CartLine, DeliveryInfo, OrderTracker, PlacedOrder, TrackerConfig, TrackerError};
