//! Orders and their snapshots.
//!
//! An order copies the customer's contact details, the shipping address and
//! each item's name and price at the time of purchase, so later edits to
//! users, addresses or products never change a placed order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::address::AddressInput;
use crate::types::{
    Email, Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
    UserId,
};

/// Customer contact details copied onto an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub name: String,
    pub email: Email,
    pub phone: String,
}

/// Shipping address copied onto an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddressSnapshot {
    pub recipient_name: String,
    pub phone: String,
    pub city: String,
    pub district: String,
    pub khoroo: Option<String>,
    pub address_line: String,
    pub notes: Option<String>,
}

impl From<AddressInput> for ShippingAddressSnapshot {
    fn from(input: AddressInput) -> Self {
        Self {
            recipient_name: input.recipient_name,
            phone: input.phone,
            city: input.city,
            district: input.district,
            khoroo: input.khoroo,
            address_line: input.address_line,
            notes: input.notes,
        }
    }
}

/// A line of a placed order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the product has been deleted.
    pub product_id: Option<ProductId>,
    /// Product name (default locale) at purchase time.
    pub product_name: String,
    pub product_slug: Option<String>,
    pub image_url: Option<String>,
    pub quantity: i32,
    /// Unit price paid.
    pub unit_price: Money,
    pub line_total: Money,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing number, `FS-YYYYMMDD-XXXXXX`.
    pub order_number: String,
    /// `None` for guest checkouts.
    pub user_id: Option<UserId>,
    pub customer: CustomerSnapshot,
    pub shipping_address: ShippingAddressSnapshot,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<String>,
    pub subtotal: Money,
    pub discount: Money,
    pub shipping_fee: Money,
    pub total: Money,
    pub notes: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_address_input_drops_label() {
        let input = AddressInput {
            label: Some("Home".to_owned()),
            recipient_name: "Bat".to_owned(),
            phone: "99119911".to_owned(),
            city: "Ulaanbaatar".to_owned(),
            district: "Sukhbaatar".to_owned(),
            khoroo: Some("1".to_owned()),
            address_line: "Peace Ave 12".to_owned(),
            notes: None,
        };
        let snapshot = ShippingAddressSnapshot::from(input);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("label").is_none());
        assert_eq!(json["district"], "Sukhbaatar");
    }

    #[test]
    fn test_customer_snapshot_validates_email() {
        let bad = serde_json::json!({"name": "Bat", "email": "nope", "phone": "1"});
        assert!(serde_json::from_value::<CustomerSnapshot>(bad).is_err());
    }
}
