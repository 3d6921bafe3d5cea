//! Business logic layered over the repositories.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod google;
