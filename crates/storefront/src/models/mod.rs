//! Storefront-only models: data kept in the session.
//!
//! Persistent domain models live in `fuelstack_core::models`.

pub mod session;

pub use session::{CartLine, CurrentUser, SessionCart, keys as session_keys};
