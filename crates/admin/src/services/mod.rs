//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Email/password login restricted to admin accounts

pub mod auth;

pub use auth::{AdminAuthError, AdminAuthService};
