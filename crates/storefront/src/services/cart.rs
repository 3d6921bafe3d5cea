//! Cart pricing.
//!
//! The session only stores product IDs, quantities and the promo code.
//! Prices, names and stock are re-read from the database every time the cart
//! is shown or checked out, and totals come from [`OrderTotals::compute`].

use serde::Serialize;
use sqlx::PgPool;

use fuelstack_core::models::{Product, StoreSettings};
use fuelstack_core::pricing::{LineItem, OrderTotals, PromoCode};
use fuelstack_core::{LocalizedText, Money, ProductId, Slug};

use crate::db::RepositoryError;
use crate::db::catalog::CatalogRepository;
use crate::models::SessionCart;

/// A cart line with current product data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub slug: Slug,
    pub name: LocalizedText,
    pub image_url: Option<String>,
    pub list_price: Money,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
    /// Units currently in stock.
    pub stock: i32,
}

/// The priced cart returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub total: Money,
    pub promo_code: Option<&'static str>,
    pub amount_until_free_shipping: Money,
    pub free_shipping_threshold: Money,
    pub advertised_free_shipping_threshold: Money,
}

/// Cart lines joined with their products, in cart order.
#[derive(Debug, Clone, Default)]
pub struct PricedCart {
    pub lines: Vec<(Product, u32)>,
    pub promo: Option<PromoCode>,
}

impl PricedCart {
    /// Priced line items for [`OrderTotals::compute`].
    #[must_use]
    pub fn line_items(&self) -> Vec<LineItem> {
        self.lines
            .iter()
            .map(|(product, quantity)| LineItem {
                product_id: product.id,
                quantity: *quantity,
                unit_price: product.effective_price(),
            })
            .collect()
    }

    /// Totals under the current shipping settings.
    #[must_use]
    pub fn totals(&self, settings: &StoreSettings) -> OrderTotals {
        OrderTotals::compute(&self.line_items(), self.promo, &settings.shipping_policy())
    }

    /// Build the client-facing view.
    #[must_use]
    pub fn view(&self, settings: &StoreSettings) -> CartView {
        let policy = settings.shipping_policy();
        let totals = self.totals(settings);

        let lines = self
            .lines
            .iter()
            .map(|(product, quantity)| {
                let unit_price = product.effective_price();
                CartLineView {
                    product_id: product.id,
                    slug: product.slug.clone(),
                    name: product.name.clone(),
                    image_url: product.primary_image().map(str::to_owned),
                    list_price: product.price,
                    unit_price,
                    quantity: *quantity,
                    line_total: unit_price * *quantity,
                    stock: product.stock,
                }
            })
            .collect();

        CartView {
            lines,
            item_count: totals.item_count,
            subtotal: totals.subtotal,
            discount: totals.discount,
            shipping: totals.shipping,
            total: totals.total,
            promo_code: self.promo.map(PromoCode::code),
            amount_until_free_shipping: if totals.subtotal.is_zero() {
                policy.free_shipping_threshold
            } else {
                policy.amount_until_free_shipping(totals.subtotal)
            },
            free_shipping_threshold: policy.free_shipping_threshold,
            advertised_free_shipping_threshold: policy.advertised_free_shipping_threshold,
        }
    }
}

/// Join cart lines with active products, in cart order.
///
/// Lines whose product is missing or inactive are dropped from `cart`.
/// Returns the priced cart and whether `cart` changed (so the caller can
/// write it back to the session).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the product query fails.
pub async fn price_cart(
    pool: &PgPool,
    cart: &mut SessionCart,
) -> Result<(PricedCart, bool), RepositoryError> {
    let products = CatalogRepository::new(pool)
        .get_active_by_ids(&cart.product_ids())
        .await?;

    Ok(join_lines(cart, products))
}

fn join_lines(cart: &mut SessionCart, mut products: Vec<Product>) -> (PricedCart, bool) {
    let before = cart.lines.len();
    cart.lines
        .retain(|line| products.iter().any(|p| p.id == line.product_id));
    let changed = cart.lines.len() != before;

    let lines = cart
        .lines
        .iter()
        .filter_map(|line| {
            let index = products.iter().position(|p| p.id == line.product_id)?;
            Some((products.swap_remove(index), line.quantity))
        })
        .collect();

    (
        PricedCart {
            lines,
            promo: cart.promo_code,
        },
        changed,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fuelstack_core::Locale;
    use rust_decimal::Decimal;

    fn product(id: i32, price: i64, discount: Option<i64>) -> Product {
        Product {
            id: ProductId::new(id),
            slug: Slug::parse(&format!("product-{id}")).unwrap(),
            name: LocalizedText::new(Locale::Mn, format!("Бүтээгдэхүүн {id}")),
            description: LocalizedText::default(),
            price: Money::from_units(price),
            discount_price: discount.map(Money::from_units),
            stock: 10,
            category_id: None,
            brand_id: None,
            is_active: true,
            is_featured: false,
            rating_avg: Decimal::ZERO,
            rating_count: 0,
            images: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cart_with(lines: &[(i32, u32)]) -> SessionCart {
        let mut cart = SessionCart::default();
        for (id, qty) in lines {
            cart.add(ProductId::new(*id), *qty, 99);
        }
        cart
    }

    #[test]
    fn test_join_drops_vanished_products_and_keeps_order() {
        let mut cart = cart_with(&[(1, 1), (2, 2), (3, 1)]);
        let (priced, changed) = join_lines(&mut cart, vec![product(3, 10_000, None), product(1, 20_000, None)]);

        assert!(changed);
        assert_eq!(cart.product_ids(), vec![ProductId::new(1), ProductId::new(3)]);
        let ids: Vec<_> = priced.lines.iter().map(|(p, _)| p.id).collect();
        assert_eq!(ids, vec![ProductId::new(1), ProductId::new(3)]);
    }

    #[test]
    fn test_view_uses_discount_price_and_settings() {
        let mut cart = cart_with(&[(1, 2)]);
        cart.promo_code = Some(PromoCode::Welcome10);
        let (priced, changed) = join_lines(&mut cart, vec![product(1, 20_000, Some(15_000))]);
        assert!(!changed);

        let view = priced.view(&StoreSettings::default());
        assert_eq!(view.lines[0].unit_price, Money::from_units(15_000));
        assert_eq!(view.subtotal, Money::from_units(30_000));
        assert_eq!(view.discount, Money::from_units(3_000));
        assert_eq!(view.shipping, Money::from_units(5_000));
        assert_eq!(view.total, Money::from_units(32_000));
        assert_eq!(view.amount_until_free_shipping, Money::from_units(20_000));
        assert_eq!(view.promo_code, Some("WELCOME10"));
        assert_eq!(
            view.advertised_free_shipping_threshold,
            Money::from_units(100_000)
        );
    }

    #[test]
    fn test_empty_view() {
        let view = PricedCart::default().view(&StoreSettings::default());
        assert_eq!(view.total, Money::ZERO);
        assert_eq!(view.shipping, Money::ZERO);
        assert_eq!(view.amount_until_free_shipping, Money::from_units(50_000));
    }
}
