//! Checkout: turn the session cart into an order.
//!
//! Works for guests and logged-in customers alike. Stock reservation and the
//! order insert run in one transaction inside [`OrderRepository::create`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use fuelstack_core::models::{
    AddressInput, CustomerSnapshot, Order, ShippingAddressSnapshot, StoreSettings,
};
use fuelstack_core::{AddressId, Email, EmailError, Locale, PaymentMethod, ProductId};

use crate::db::RepositoryError;
use crate::db::addresses::AddressRepository;
use crate::db::orders::{CreateOrderError, NewOrder, NewOrderItem, OrderRepository};
use crate::models::{CurrentUser, SessionCart};
use crate::services::cart::{PricedCart, price_cart};

/// Order numbers are retried this many times on collision.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Length of the random suffix of an order number.
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Characters used in the order number suffix (no 0/O or 1/I).
const ORDER_NUMBER_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Longest notes accepted on an order.
const MAX_NOTES_LENGTH: usize = 1_000;

/// Customer contact details as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Body of `POST /api/checkout`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub customer: CustomerInput,
    /// One of the logged-in customer's saved addresses.
    pub address_id: Option<AddressId>,
    /// An address typed at checkout. Ignored when `address_id` is set.
    pub shipping_address: Option<AddressInput>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("customer {0} is required")]
    MissingCustomerField(&'static str),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("a shipping address is required")]
    MissingAddress,

    #[error("saved addresses require signing in")]
    AddressRequiresLogin,

    #[error("address not found")]
    AddressNotFound,

    #[error("missing address fields: {}", .0.join(", "))]
    IncompleteAddress(Vec<&'static str>),

    #[error("notes must be at most {MAX_NOTES_LENGTH} characters")]
    NotesTooLong,

    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    #[error("could not allocate an order number")]
    OrderNumberExhausted,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Generate an order number like `FS-20250301-7KQ2MX`.
#[must_use]
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ORDER_NUMBER_ALPHABET.len());
            char::from(ORDER_NUMBER_ALPHABET.get(idx).copied().unwrap_or(b'X'))
        })
        .collect();
    format!("FS-{}-{suffix}", now.format("%Y%m%d"))
}

fn validate_customer(input: &CustomerInput) -> Result<CustomerSnapshot, CheckoutError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(CheckoutError::MissingCustomerField("name"));
    }
    let phone = input.phone.trim();
    if phone.is_empty() {
        return Err(CheckoutError::MissingCustomerField("phone"));
    }
    if input.email.trim().is_empty() {
        return Err(CheckoutError::MissingCustomerField("email"));
    }

    Ok(CustomerSnapshot {
        name: name.to_owned(),
        email: Email::parse(&input.email)?,
        phone: phone.to_owned(),
    })
}

fn validate_notes(notes: Option<&str>) -> Result<Option<String>, CheckoutError> {
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());
    if notes.is_some_and(|n| n.chars().count() > MAX_NOTES_LENGTH) {
        return Err(CheckoutError::NotesTooLong);
    }
    Ok(notes.map(str::to_owned))
}

async fn resolve_address(
    pool: &PgPool,
    user: Option<&CurrentUser>,
    request: &CheckoutRequest,
) -> Result<ShippingAddressSnapshot, CheckoutError> {
    if let Some(address_id) = request.address_id {
        let user = user.ok_or(CheckoutError::AddressRequiresLogin)?;
        let address = AddressRepository::new(pool)
            .get(user.id, address_id)
            .await?
            .ok_or(CheckoutError::AddressNotFound)?;
        return Ok(AddressInput::from(&address).into());
    }

    let input = request
        .shipping_address
        .clone()
        .ok_or(CheckoutError::MissingAddress)?;
    let missing = input.missing_fields();
    if !missing.is_empty() {
        return Err(CheckoutError::IncompleteAddress(missing));
    }
    Ok(input.into())
}

fn order_items(cart: &PricedCart) -> Vec<NewOrderItem> {
    cart.lines
        .iter()
        .map(|(product, quantity)| NewOrderItem {
            product_id: product.id,
            product_name: product.name.get(Locale::Mn).unwrap_or_default().to_owned(),
            product_slug: product.slug.to_string(),
            image_url: product.primary_image().map(str::to_owned),
            quantity: *quantity,
            unit_price: product.effective_price(),
        })
        .collect()
}

/// Place an order from the session cart.
///
/// On success the cart (lines and promo code) is cleared; on failure it is
/// left untouched apart from dropping vanished products.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` when nothing purchasable is in the cart.
/// Returns `CheckoutError::InsufficientStock` naming the first short product.
/// Returns validation variants for bad customer or address input.
pub async fn place_order(
    pool: &PgPool,
    settings: &StoreSettings,
    user: Option<&CurrentUser>,
    cart: &mut SessionCart,
    request: &CheckoutRequest,
) -> Result<Order, CheckoutError> {
    let customer = validate_customer(&request.customer)?;
    let notes = validate_notes(request.notes.as_deref())?;

    let (priced, _) = price_cart(pool, cart).await?;
    if priced.lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let shipping_address = resolve_address(pool, user, request).await?;

    let mut order = NewOrder {
        order_number: String::new(),
        user_id: user.map(|u| u.id),
        customer,
        shipping_address,
        payment_method: request.payment_method,
        promo_code: priced.promo.map(|code| code.code().to_owned()),
        totals: priced.totals(settings),
        notes,
        items: order_items(&priced),
    };

    let orders = OrderRepository::new(pool);
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        order.order_number = generate_order_number(Utc::now());
        match orders.create(&order).await {
            Ok(created) => {
                tracing::info!(
                    order_id = %created.id,
                    order_number = %created.order_number,
                    total = %created.total,
                    "Order placed"
                );
                cart.clear();
                return Ok(created);
            }
            Err(CreateOrderError::Repository(RepositoryError::Conflict(_))) => {
                tracing::warn!(
                    order_number = %order.order_number,
                    "Order number collision, retrying"
                );
            }
            Err(CreateOrderError::InsufficientStock(product_id)) => {
                return Err(CheckoutError::InsufficientStock(product_id));
            }
            Err(CreateOrderError::Repository(e)) => return Err(e.into()),
        }
    }

    Err(CheckoutError::OrderNumberExhausted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn customer(name: &str, email: &str, phone: &str) -> CustomerInput {
        CustomerInput {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        }
    }

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let number = generate_order_number(now);

        assert!(number.starts_with("FS-20250301-"));
        let suffix = number.strip_prefix("FS-20250301-").unwrap();
        assert_eq!(suffix.len(), ORDER_NUMBER_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| ORDER_NUMBER_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_validate_customer() {
        let snapshot = validate_customer(&customer(" Bat ", "Bat@Example.MN", "99112233")).unwrap();
        assert_eq!(snapshot.name, "Bat");
        assert_eq!(snapshot.email.as_str(), "bat@example.mn");

        assert!(matches!(
            validate_customer(&customer("", "a@b.mn", "1")),
            Err(CheckoutError::MissingCustomerField("name"))
        ));
        assert!(matches!(
            validate_customer(&customer("Bat", "a@b.mn", "  ")),
            Err(CheckoutError::MissingCustomerField("phone"))
        ));
        assert!(matches!(
            validate_customer(&customer("Bat", "not-an-email", "1")),
            Err(CheckoutError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_notes() {
        assert_eq!(validate_notes(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_notes(Some(" call first ")).unwrap().as_deref(),
            Some("call first")
        );
        assert!(matches!(
            validate_notes(Some(&"x".repeat(MAX_NOTES_LENGTH + 1))),
            Err(CheckoutError::NotesTooLong)
        ));
    }

    #[test]
    fn test_request_defaults_payment_method() {
        let request: CheckoutRequest = serde_json::from_value(serde_json::json!({
            "customer": {"name": "Bat", "email": "bat@example.mn", "phone": "99112233"},
            "address_id": 4
        }))
        .unwrap();
        assert_eq!(request.payment_method, PaymentMethod::CashOnDelivery);
        assert_eq!(request.address_id, Some(AddressId::new(4)));
    }
}
