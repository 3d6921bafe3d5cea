//! Core types for FuelStack.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod localized;
pub mod money;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use localized::{Locale, LocalizedText};
pub use money::{Money, MoneyError};
pub use slug::{Slug, SlugError, slugify};
pub use status::*;
