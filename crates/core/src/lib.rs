//! FuelStack Core - Shared domain library.
//!
//! This crate provides the types and rules used across all FuelStack components:
//! - `storefront` - Public JSON API (catalog, cart, checkout, blog, accounts)
//! - `admin` - Back-office JSON API (catalog, orders, blog, users, settings)
//! - `cli` - Command-line tools for migrations, seeding and admin management
//!
//! # Architecture
//!
//! The core crate contains types, pure functions and domain models - no
//! database access and no HTTP clients. The `postgres` feature only adds
//! `sqlx` encode/decode impls for the newtypes and enums.
//!
//! # Modules
//!
//! - [`types`] - Newtypes for IDs, money, emails, slugs, statuses and localized text
//! - [`pricing`] - Cart totals, shipping policy and promo codes
//! - [`rating`] - Review rating aggregation
//! - [`password`] - Password policy and argon2 hashing
//! - [`env`] - Environment variable rules shared by the binaries
//! - [`models`] - Domain models shared by the storefront and admin APIs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod env;
pub mod models;
pub mod password;
pub mod pricing;
pub mod rating;
pub mod types;

pub use types::*;
