//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use fuelstack_core::models::User;
use fuelstack_core::pricing::PromoCode;
use fuelstack_core::{Email, ProductId, UserId, UserRole};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Role at login time.
    pub role: UserRole,
    /// Display name.
    pub name: Option<String>,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            name: user.name.clone(),
        }
    }
}

/// Session keys for storefront data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for Google OAuth state (CSRF protection).
    pub const GOOGLE_OAUTH_STATE: &str = "google_oauth_state";
}

/// Largest quantity of a single product in one cart.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// One product in the cart. Prices are never stored; they are read from the
/// database whenever the cart is shown or checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The shopping cart, stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCart {
    pub lines: Vec<CartLine>,
    pub promo_code: Option<PromoCode>,
}

impl SessionCart {
    /// Add `quantity` units, merging with an existing line. The line is capped
    /// at `available` and [`MAX_LINE_QUANTITY`]. Returns the resulting quantity.
    pub fn add(&mut self, product_id: ProductId, quantity: u32, available: u32) -> u32 {
        let cap = available.min(MAX_LINE_QUANTITY);
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity).min(cap);
            return line.quantity;
        }

        let quantity = quantity.min(cap);
        if quantity > 0 {
            self.lines.push(CartLine {
                product_id,
                quantity,
            });
        }
        quantity
    }

    /// Set a line's quantity (capped as in [`Self::add`]). Zero removes the
    /// line. Returns `false` if the product isn't in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32, available: u32) -> bool {
        let Some(index) = self.lines.iter().position(|l| l.product_id == product_id) else {
            return false;
        };
        let capped = quantity.min(available).min(MAX_LINE_QUANTITY);
        if capped == 0 {
            self.lines.remove(index);
        } else if let Some(line) = self.lines.get_mut(index) {
            line.quantity = capped;
        }
        true
    }

    /// Remove a line. Returns `false` if it wasn't there.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    /// Empty the cart, including the promo code.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.promo_code = None;
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Product IDs in cart order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|l| l.product_id).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const WHEY: ProductId = ProductId::new(1);
    const BCAA: ProductId = ProductId::new(2);

    #[test]
    fn test_add_merges_and_caps_at_stock() {
        let mut cart = SessionCart::default();
        assert_eq!(cart.add(WHEY, 2, 5), 2);
        assert_eq!(cart.add(WHEY, 4, 5), 5);
        assert_eq!(cart.lines.len(), 1);
    }

    #[test]
    fn test_add_out_of_stock_adds_nothing() {
        let mut cart = SessionCart::default();
        assert_eq!(cart.add(WHEY, 1, 0), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_caps_at_max_line_quantity() {
        let mut cart = SessionCart::default();
        assert_eq!(cart.add(WHEY, 500, 1_000), MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = SessionCart::default();
        cart.add(WHEY, 2, 10);
        cart.add(BCAA, 1, 10);
        assert!(cart.set_quantity(WHEY, 0, 10));
        assert_eq!(cart.product_ids(), vec![BCAA]);
        assert!(!cart.set_quantity(WHEY, 1, 10));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = SessionCart::default();
        cart.add(WHEY, 1, 10);
        cart.promo_code = Some(PromoCode::Welcome10);
        assert!(cart.remove(WHEY));
        assert!(!cart.remove(WHEY));
        cart.add(BCAA, 1, 10);
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.promo_code.is_none());
    }

    #[test]
    fn test_session_roundtrip() {
        let mut cart = SessionCart::default();
        cart.add(WHEY, 3, 10);
        cart.promo_code = Some(PromoCode::Save5000);
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["promo_code"], "SAVE5000");
        let back: SessionCart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
