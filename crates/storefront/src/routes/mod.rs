//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                           - Liveness
//! GET  /health/ready                     - Readiness (database)
//!
//! # Auth (rate limited)
//! POST /api/auth/register                - Create account, start session
//! POST /api/auth/login                   - Email/password login
//! POST /api/auth/logout                  - End session
//! GET  /api/auth/session                 - Current user or null
//! GET  /auth/google/login                - Redirect to Google
//! GET  /auth/google/callback             - Google OAuth callback
//!
//! # Catalog
//! GET  /api/products                     - Filtered, paginated listing
//! GET  /api/products/{slug}              - Product detail with rating summary
//! GET  /api/products/{slug}/related      - Same-category products
//! GET  /api/products/{slug}/reviews      - Reviews and rating summary
//! POST /api/products/{slug}/reviews      - Write a review (auth)
//! GET  /api/products/{slug}/comments     - Comment threads
//! POST /api/products/{slug}/comments     - Ask a question or reply (auth)
//! DELETE /api/reviews/{id}               - Delete own review (auth)
//! GET  /api/categories                   - Categories with product counts
//! GET  /api/categories/{slug}            - One category
//! GET  /api/brands                       - Brands
//!
//! # Cart and checkout (rate limited)
//! GET    /api/cart                       - Priced cart
//! DELETE /api/cart                       - Empty the cart
//! POST   /api/cart/items                 - Add a product
//! PUT    /api/cart/items/{product_id}    - Set quantity
//! DELETE /api/cart/items/{product_id}    - Remove a line
//! POST   /api/cart/promo                 - Apply promo code
//! DELETE /api/cart/promo                 - Remove promo code
//! POST   /api/checkout                   - Place an order
//!
//! # Account (auth, rate limited)
//! GET|PUT /api/account/profile
//! PUT     /api/account/password
//! GET|POST /api/account/addresses
//! PUT|DELETE /api/account/addresses/{id}
//! POST    /api/account/addresses/{id}/default
//! GET     /api/account/wishlist
//! POST|DELETE /api/account/wishlist/{product_id}
//! GET     /api/account/orders
//! GET     /api/account/orders/{id}
//!
//! # Blog and settings
//! GET  /api/blog/posts                   - Published posts
//! GET  /api/blog/posts/{slug}            - Post with rendered body
//! GET  /api/blog/categories
//! GET  /api/blog/tags
//! GET  /api/settings                     - Store settings
//! ```

pub mod account;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod products;
pub mod reviews;
pub mod settings;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::Serialize;

use crate::db::Page;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// One page of a list endpoint.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    /// Wrap a page of rows with the total row count.
    #[must_use]
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        let total_pages = if total <= 0 {
            0
        } else {
            (total + page.size - 1) / page.size
        };
        Self {
            items,
            total,
            page: page.number,
            per_page: page.size,
            total_pages,
        }
    }
}

/// Liveness health check.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Login, registration and Google OAuth.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::current_session))
        .route("/auth/google/login", get(auth::google_login))
        .route(auth::GOOGLE_CALLBACK_PATH, get(auth::google_callback))
        .layer(auth_rate_limiter())
}

/// Read-only catalog plus reviews and comments.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(products::index))
        .route("/api/products/{slug}", get(products::show))
        .route("/api/products/{slug}/related", get(products::related))
        .route(
            "/api/products/{slug}/reviews",
            get(reviews::index).post(reviews::create),
        )
        .route(
            "/api/products/{slug}/comments",
            get(reviews::comments).post(reviews::create_comment),
        )
        .route("/api/reviews/{id}", delete(reviews::delete))
        .route("/api/categories", get(categories::index))
        .route("/api/categories/{slug}", get(categories::show))
        .route("/api/brands", get(categories::brands))
}

/// Session cart and checkout.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(cart::show).delete(cart::clear))
        .route("/api/cart/items", post(cart::add))
        .route(
            "/api/cart/items/{product_id}",
            put(cart::update).delete(cart::remove),
        )
        .route(
            "/api/cart/promo",
            post(cart::apply_promo).delete(cart::remove_promo),
        )
        .route("/api/checkout", post(checkout::create))
        .layer(api_rate_limiter())
}

/// The logged-in customer's own data.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(account::profile).put(account::update_profile),
        )
        .route("/password", put(account::change_password))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            put(account::update_address).delete(account::delete_address),
        )
        .route(
            "/addresses/{id}/default",
            post(account::set_default_address),
        )
        .route("/wishlist", get(account::wishlist))
        .route(
            "/wishlist/{product_id}",
            post(account::toggle_wishlist).delete(account::remove_from_wishlist),
        )
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
        .layer(api_rate_limiter())
}

/// Blog content and store settings.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/api/blog/posts", get(blog::index))
        .route("/api/blog/posts/{slug}", get(blog::show))
        .route("/api/blog/categories", get(blog::categories))
        .route("/api/blog/tags", get(blog::tags))
        .route("/api/settings", get(settings::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth_routes())
        .merge(catalog_routes())
        .merge(cart_routes())
        .nest("/api/account", account_routes())
        .merge(content_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, header};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, SessionManagerLayer};

    use crate::config::tests::test_config;

    fn app(google: bool) -> Router {
        let mut config = test_config();
        if !google {
            config.google = None;
        }
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/fuelstack_test")
            .unwrap();
        let state = AppState::new(config, pool);
        crate::app(state, SessionManagerLayer::new(MemoryStore::default()))
    }

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.10");
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_owned()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_paginated_total_pages() {
        let page = Page { number: 2, size: 24 };
        let paged = Paginated::new(vec![1, 2, 3], 49, page);
        assert_eq!(paged.total_pages, 3);
        assert_eq!(paged.page, 2);
        assert_eq!(paged.per_page, 24);

        let empty: Paginated<i32> = Paginated::new(vec![], 0, page);
        assert_eq!(empty.total_pages, 0);

        let exact: Paginated<i32> = Paginated::new(vec![], 48, page);
        assert_eq!(exact.total_pages, 2);
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(true)
            .oneshot(request("GET", "/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_account_requires_login() {
        let response = app(true)
            .oneshot(request("GET", "/api/account/profile", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_string(response).await.contains("Authentication required"));
    }

    #[tokio::test]
    async fn test_anonymous_session_is_null() {
        let response = app(true)
            .oneshot(request("GET", "/api/auth/session", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "null");
    }

    #[tokio::test]
    async fn test_unknown_promo_code_is_rejected() {
        let response = app(true)
            .oneshot(request(
                "POST",
                "/api/cart/promo",
                Some(r#"{"code":"FREESHIP"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_truncated_body_gets_json_error() {
        let response = app(true)
            .oneshot(request("POST", "/api/cart/promo", Some(r#"{"code":"WELC"#)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_review_requires_login() {
        let response = app(true)
            .oneshot(request(
                "POST",
                "/api/products/whey-gold/reviews",
                Some(r#"{"rating":5,"title":"Great","body":"Mixes well"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_google_login_redirects_when_configured() {
        let response = app(true)
            .oneshot(request("GET", "/auth/google/login", None))
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://accounts.google.com/"));
    }

    #[tokio::test]
    async fn test_google_login_not_found_when_unconfigured() {
        let response = app(false)
            .oneshot(request("GET", "/auth/google/login", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let response = app(true)
            .oneshot(request("GET", "/health", None))
            .await
            .unwrap();
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert!(response.headers().contains_key("x-request-id"));
    }
}
