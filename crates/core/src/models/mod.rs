//! Domain models shared by the storefront and admin APIs.
//!
//! These are validated domain objects, separate from the database row types
//! each binary keeps next to its queries. They serialize to the JSON shapes
//! the API returns.

pub mod address;
pub mod blog;
pub mod catalog;
pub mod order;
pub mod review;
pub mod settings;
pub mod user;

pub use address::{Address, AddressInput};
pub use blog::{BlogCategory, BlogPost, BlogTag};
pub use catalog::{Brand, Category, Product, ProductImage};
pub use order::{CustomerSnapshot, Order, OrderItem, ShippingAddressSnapshot};
pub use review::{Comment, Review};
pub use settings::{StoreSettings, StoreSettingsUpdate};
pub use user::User;
