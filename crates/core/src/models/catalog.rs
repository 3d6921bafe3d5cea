//! Catalog: products, categories and brands.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::pricing::unit_price;
use crate::types::{BrandId, CategoryId, LocalizedText, Money, ProductId, ProductImageId, Slug};

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: Slug,
    pub name: LocalizedText,
    pub description: Option<LocalizedText>,
    pub image_url: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// A product brand.
#[derive(Debug, Clone, Serialize)]
pub struct Brand {
    pub id: BrandId,
    pub slug: Slug,
    pub name: String,
    pub logo_url: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A product image, ordered by `position`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub url: String,
    pub alt: Option<String>,
    pub position: i32,
}

/// A sellable product.
///
/// Products are identified by slug; there is no separate SKU.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: Slug,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub price: Money,
    /// Sale price, shown instead of `price` when present and lower.
    pub discount_price: Option<Money>,
    pub stock: i32,
    pub category_id: Option<CategoryId>,
    pub brand_id: Option<BrandId>,
    pub is_active: bool,
    pub is_featured: bool,
    /// Denormalised mean review rating (one decimal).
    pub rating_avg: Decimal,
    pub rating_count: i32,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// The price a customer pays for one unit.
    #[must_use]
    pub fn effective_price(&self) -> Money {
        unit_price(self.price, self.discount_price)
    }

    /// Whether at least one unit can be bought.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.is_active && self.stock > 0
    }

    /// URL of the first image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images
            .iter()
            .min_by_key(|image| image.position)
            .map(|image| image.url.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Locale;

    fn product() -> Product {
        Product {
            id: ProductId::new(7),
            slug: Slug::parse("whey-gold-2kg").unwrap(),
            name: LocalizedText::new(Locale::Mn, "Уураг").with(Locale::En, "Whey Gold"),
            description: LocalizedText::default(),
            price: Money::from_units(189_000),
            discount_price: Some(Money::from_units(169_000)),
            stock: 3,
            category_id: Some(CategoryId::new(1)),
            brand_id: None,
            is_active: true,
            is_featured: false,
            rating_avg: Decimal::ZERO,
            rating_count: 0,
            images: vec![
                ProductImage {
                    id: ProductImageId::new(2),
                    url: "https://cdn.example.mn/b.jpg".to_owned(),
                    alt: None,
                    position: 1,
                },
                ProductImage {
                    id: ProductImageId::new(1),
                    url: "https://cdn.example.mn/a.jpg".to_owned(),
                    alt: None,
                    position: 0,
                },
            ],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_price() {
        let mut p = product();
        assert_eq!(p.effective_price(), Money::from_units(169_000));
        p.discount_price = None;
        assert_eq!(p.effective_price(), Money::from_units(189_000));
    }

    #[test]
    fn test_in_stock_requires_active() {
        let mut p = product();
        assert!(p.in_stock());
        p.is_active = false;
        assert!(!p.in_stock());
        p.is_active = true;
        p.stock = 0;
        assert!(!p.in_stock());
    }

    #[test]
    fn test_primary_image_by_position() {
        assert_eq!(product().primary_image(), Some("https://cdn.example.mn/a.jpg"));
    }
}
