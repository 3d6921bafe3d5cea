//! Seed the catalog from a YAML file.
//!
//! Categories, brands and products are upserted by slug, so a file can be
//! re-applied after editing. Products refer to categories and brands by slug;
//! those may come from the same file or already exist in the database.
//! Product images are replaced by the file's list.
//!
//! ```yaml
//! categories:
//!   - slug: protein
//!     name: { mn: Уураг, en: Protein }
//!     sort_order: 1
//! brands:
//!   - slug: optimum-nutrition
//!     name: Optimum Nutrition
//!     country: USA
//! products:
//!   - slug: gold-standard-whey-2kg
//!     name: { mn: Gold Standard уураг 2кг, en: Gold Standard Whey 2kg }
//!     price: 189000
//!     discount_price: 169000
//!     stock: 25
//!     category: protein
//!     brand: optimum-nutrition
//!     is_featured: true
//!     images:
//!       - https://cdn.fuelstack.mn/products/gsw-front.jpg
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use tracing::{error, info};

use fuelstack_core::{BrandId, CategoryId, LocalizedText, Money, ProductId, Slug};

/// Top-level layout of a catalog seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub brands: Vec<SeedBrand>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCategory {
    pub slug: Slug,
    pub name: LocalizedText,
    pub description: Option<LocalizedText>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedBrand {
    pub slug: Slug,
    pub name: String,
    pub logo_url: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub slug: Slug,
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    pub price: Money,
    pub discount_price: Option<Money>,
    #[serde(default)]
    pub stock: i32,
    /// Category slug.
    pub category: Option<Slug>,
    /// Brand slug.
    pub brand: Option<Slug>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub images: Vec<String>,
}

const fn default_active() -> bool {
    true
}

fn duplicates<'a>(slugs: impl Iterator<Item = &'a Slug>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    slugs
        .filter(|slug| !seen.insert(slug.as_str()))
        .map(Slug::as_str)
        .collect()
}

impl CatalogSeed {
    /// Problems that would make the seed fail or store bad data.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for slug in duplicates(self.categories.iter().map(|c| &c.slug)) {
            errors.push(format!("category '{slug}' appears more than once"));
        }
        for slug in duplicates(self.brands.iter().map(|b| &b.slug)) {
            errors.push(format!("brand '{slug}' appears more than once"));
        }
        for slug in duplicates(self.products.iter().map(|p| &p.slug)) {
            errors.push(format!("product '{slug}' appears more than once"));
        }

        for category in &self.categories {
            if category.name.is_blank() {
                errors.push(format!("category '{}' has no name", category.slug));
            }
        }
        for brand in &self.brands {
            if brand.name.trim().is_empty() {
                errors.push(format!("brand '{}' has no name", brand.slug));
            }
        }
        for product in &self.products {
            let slug = &product.slug;
            if product.name.is_blank() {
                errors.push(format!("product '{slug}' has no name"));
            }
            if product.price.is_zero() {
                errors.push(format!("product '{slug}' has no price"));
            }
            if product.discount_price.is_some_and(|d| d >= product.price) {
                errors.push(format!(
                    "product '{slug}' discount_price must be lower than price"
                ));
            }
            if product.stock < 0 {
                errors.push(format!("product '{slug}' has negative stock"));
            }
            for url in &product.images {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    errors.push(format!("product '{slug}' image '{url}' is not an http(s) URL"));
                }
            }
        }

        errors
    }
}

/// Seed the catalog from a YAML file.
///
/// Everything is written in one transaction; a failure leaves the database
/// untouched.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, fails validation,
/// references an unknown category or brand, or a database write fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    info!(
        categories = seed.categories.len(),
        brands = seed.brands.len(),
        products = seed.products.len(),
        "Parsed seed file"
    );

    let errors = seed.validate();
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = super::connect().await?;
    let mut tx = pool.begin().await?;

    for category in &seed.categories {
        upsert_category(&mut tx, category).await?;
    }
    for brand in &seed.brands {
        upsert_brand(&mut tx, brand).await?;
    }
    for product in &seed.products {
        let id = upsert_product(&mut tx, product).await?;
        info!(product_id = %id, slug = %product.slug, "Product seeded");
    }

    tx.commit().await?;

    info!("Seeding complete!");
    Ok(())
}

async fn upsert_category(
    tx: &mut Transaction<'_, Postgres>,
    category: &SeedCategory,
) -> Result<CategoryId, sqlx::Error> {
    sqlx::query_scalar(
        r"
        INSERT INTO shop.category (slug, name, description, image_url, sort_order)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (slug) DO UPDATE SET
            name = EXCLUDED.name,
            description = EXCLUDED.description,
            image_url = EXCLUDED.image_url,
            sort_order = EXCLUDED.sort_order
        RETURNING id
        ",
    )
    .bind(&category.slug)
    .bind(&category.name)
    .bind(category.description.as_ref())
    .bind(category.image_url.as_deref())
    .bind(category.sort_order)
    .fetch_one(&mut **tx)
    .await
}

async fn upsert_brand(
    tx: &mut Transaction<'_, Postgres>,
    brand: &SeedBrand,
) -> Result<BrandId, sqlx::Error> {
    sqlx::query_scalar(
        r"
        INSERT INTO shop.brand (slug, name, logo_url, country)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO UPDATE SET
            name = EXCLUDED.name,
            logo_url = EXCLUDED.logo_url,
            country = EXCLUDED.country
        RETURNING id
        ",
    )
    .bind(&brand.slug)
    .bind(brand.name.trim())
    .bind(brand.logo_url.as_deref())
    .bind(brand.country.as_deref())
    .fetch_one(&mut **tx)
    .await
}

async fn upsert_product(
    tx: &mut Transaction<'_, Postgres>,
    product: &SeedProduct,
) -> Result<ProductId, Box<dyn std::error::Error>> {
    let category_id: Option<CategoryId> = match &product.category {
        Some(slug) => Some(
            sqlx::query_scalar("SELECT id FROM shop.category WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| format!("product '{}': unknown category '{slug}'", product.slug))?,
        ),
        None => None,
    };
    let brand_id: Option<BrandId> = match &product.brand {
        Some(slug) => Some(
            sqlx::query_scalar("SELECT id FROM shop.brand WHERE slug = $1")
                .bind(slug)
                .fetch_optional(&mut **tx)
                .await?
                .ok_or_else(|| format!("product '{}': unknown brand '{slug}'", product.slug))?,
        ),
        None => None,
    };

    let id: ProductId = sqlx::query_scalar(
        r"
        INSERT INTO shop.product
            (slug, name, description, price, discount_price, stock, category_id, brand_id,
             is_active, is_featured)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (slug) DO UPDATE SET
            name = EXCLUDED.name,
            description = EXCLUDED.description,
            price = EXCLUDED.price,
            discount_price = EXCLUDED.discount_price,
            stock = EXCLUDED.stock,
            category_id = EXCLUDED.category_id,
            brand_id = EXCLUDED.brand_id,
            is_active = EXCLUDED.is_active,
            is_featured = EXCLUDED.is_featured,
            updated_at = NOW()
        RETURNING id
        ",
    )
    .bind(&product.slug)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.discount_price)
    .bind(product.stock)
    .bind(category_id)
    .bind(brand_id)
    .bind(product.is_active)
    .bind(product.is_featured)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM shop.product_image WHERE product_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r"
        INSERT INTO shop.product_image (product_id, url, position)
        SELECT $1, url, (ordinality - 1)::int
        FROM UNNEST($2::text[]) WITH ORDINALITY AS t(url, ordinality)
        ",
    )
    .bind(id)
    .bind(&product.images)
    .execute(&mut **tx)
    .await?;

    Ok(id)
}
