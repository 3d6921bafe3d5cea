//! Integration tests for `FuelStack`.
//!
//! The tests talk HTTP to running servers and prepare data directly in the
//! database, so they are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! fs-cli migrate
//! cargo run -p fuelstack-storefront &
//! cargo run -p fuelstack-admin &
//! cargo test -p fuelstack-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` / `DATABASE_URL` - Shared shop database
//! - `STOREFRONT_BASE_URL` - Default `http://localhost:3000`
//! - `ADMIN_BASE_URL` - Default `http://localhost:3001`

use fuelstack_core::password::hash_password;
use fuelstack_core::{CategoryId, LocalizedText, Locale, Money, OrderId, ProductId, UserRole};
use reqwest::Client;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// Password given to every account created by [`TestContext::create_user`].
pub const TEST_PASSWORD: &str = "integration-test-password";

/// Connections to the running servers and the database.
pub struct TestContext {
    pub storefront_url: String,
    pub admin_url: String,
    pub pool: PgPool,
}

/// Read an environment variable with a default.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// A unique suffix so parallel and repeated runs don't collide.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

impl TestContext {
    /// Connect to the shop database.
    ///
    /// # Panics
    ///
    /// Panics if no database URL is configured or the database is
    /// unreachable.
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("STOREFRONT_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("STOREFRONT_DATABASE_URL or DATABASE_URL must be set");
        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to database");

        Self {
            storefront_url: env_or("STOREFRONT_BASE_URL", "http://localhost:3000"),
            admin_url: env_or("ADMIN_BASE_URL", "http://localhost:3001"),
            pool,
        }
    }

    /// A fresh HTTP client with its own cookie jar (one session).
    ///
    /// # Panics
    ///
    /// Panics if the client can't be built.
    #[must_use]
    pub fn client() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Insert a user with [`TEST_PASSWORD`] and return its email.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn create_user(&self, role: UserRole) -> String {
        let email = format!("{}@test.fuelstack.mn", unique("user"));
        let hash = hash_password(TEST_PASSWORD).expect("Failed to hash password");

        sqlx::query("INSERT INTO shop.user (email, password_hash, role, name) VALUES ($1, $2, $3, $4)")
            .bind(&email)
            .bind(&hash)
            .bind(role)
            .bind("Integration Test")
            .execute(&self.pool)
            .await
            .expect("Failed to insert user");

        email
    }

    /// A client logged in to the admin API as a new admin.
    ///
    /// # Panics
    ///
    /// Panics if the login fails.
    pub async fn admin_client(&self) -> Client {
        let email = self.create_user(UserRole::Admin).await;
        let client = Self::client();

        let resp = client
            .post(format!("{}/api/auth/login", self.admin_url))
            .json(&json!({ "email": email, "password": TEST_PASSWORD }))
            .send()
            .await
            .expect("Failed to log in");
        assert!(resp.status().is_success(), "admin login failed: {}", resp.status());

        client
    }

    /// Insert an active product in a new category.
    ///
    /// # Panics
    ///
    /// Panics if an insert fails.
    pub async fn create_product(&self, price: i64, stock: i32) -> ProductId {
        let category_id: CategoryId = sqlx::query_scalar(
            "INSERT INTO shop.category (slug, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(unique("category"))
        .bind(LocalizedText::new(Locale::En, "Test category"))
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert category");

        sqlx::query_scalar(
            r"
            INSERT INTO shop.product (slug, name, price, stock, category_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(unique("product"))
        .bind(LocalizedText::new(Locale::En, "Test whey").with(Locale::Mn, "Туршилтын уураг"))
        .bind(Money::from_units(price))
        .bind(stock)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert product")
    }

    /// Insert a pending guest order with no items.
    ///
    /// # Panics
    ///
    /// Panics if the insert fails.
    pub async fn create_order(&self) -> OrderId {
        sqlx::query_scalar(
            r"
            INSERT INTO shop.order (order_number, customer, shipping_address, subtotal, total)
            VALUES ($1, $2, $3, 40000, 40000)
            RETURNING id
            ",
        )
        .bind(unique("FS-TEST"))
        .bind(json!({ "name": "Order Test", "email": "order@test.fuelstack.mn", "phone": "99001122" }))
        .bind(json!({
            "recipient_name": "Order Test",
            "phone": "99001122",
            "city": "Ulaanbaatar",
            "district": "Bayanzurkh",
            "address_line": "Building 3",
        }))
        .fetch_one(&self.pool)
        .await
        .expect("Failed to insert order")
    }

    /// Current stock of a product.
    ///
    /// # Panics
    ///
    /// Panics if the product doesn't exist.
    pub async fn stock_of(&self, id: ProductId) -> i32 {
        sqlx::query_scalar("SELECT stock FROM shop.product WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to read stock")
    }
}

/// Parse a money field of a JSON response.
///
/// # Panics
///
/// Panics if the value isn't a non-negative amount.
#[must_use]
pub fn money(value: &serde_json::Value) -> Money {
    serde_json::from_value(value.clone()).expect("not a money amount")
}
