//! HTTP route handlers for the back-office API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                - Liveness
//! GET  /health/ready                          - Readiness (database)
//!
//! # Auth
//! POST /api/auth/login                        - Admin email/password login
//! POST /api/auth/logout                       - End session
//! GET  /api/auth/session                      - Current admin or null
//!
//! # Everything below requires an admin session (401 / 403)
//! GET  /api/admin/dashboard                   - Counts, revenue, low stock, recent orders
//!
//! GET|POST       /api/admin/products
//! GET|PUT|DELETE /api/admin/products/{id}
//! PATCH          /api/admin/products/{id}/stock
//!
//! GET|POST       /api/admin/categories
//! GET|PUT|DELETE /api/admin/categories/{id}   - Delete refused while in use
//! GET|POST       /api/admin/brands
//! GET|PUT|DELETE /api/admin/brands/{id}
//!
//! GET            /api/admin/orders
//! GET|DELETE     /api/admin/orders/{id}
//! PUT            /api/admin/orders/{id}/status
//!
//! GET|POST       /api/admin/blog/posts
//! GET|PUT|DELETE /api/admin/blog/posts/{id}
//! GET|POST       /api/admin/blog/categories
//! PUT|DELETE     /api/admin/blog/categories/{id}  - Delete refused while in use
//! GET|POST       /api/admin/blog/tags
//! PUT|DELETE     /api/admin/blog/tags/{id}
//!
//! GET            /api/admin/users
//! GET|DELETE     /api/admin/users/{id}
//! PUT            /api/admin/users/{id}/role
//!
//! GET            /api/admin/reviews
//! DELETE         /api/admin/reviews/{id}
//! GET            /api/admin/comments
//! DELETE         /api/admin/comments/{id}
//!
//! GET|PUT        /api/admin/settings
//! ```

pub mod auth;
pub mod blog;
pub mod categories;
pub mod dashboard;
pub mod input;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod users;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, patch, post, put},
};
use serde::Serialize;

use crate::db::Page;
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

/// Admin login and session.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::current_session))
}

/// Catalog management: products, categories and brands.
fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/products/{id}/stock", patch(products::update_stock))
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route(
            "/categories/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route(
            "/brands",
            get(categories::brands_index).post(categories::brands_create),
        )
        .route(
            "/brands/{id}",
            get(categories::brands_show)
                .put(categories::brands_update)
                .delete(categories::brands_delete),
        )
}

/// Blog posts, categories and tags.
fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(blog::posts_index).post(blog::posts_create))
        .route(
            "/posts/{id}",
            get(blog::posts_show)
                .put(blog::posts_update)
                .delete(blog::posts_delete),
        )
        .route(
            "/categories",
            get(blog::categories_index).post(blog::categories_create),
        )
        .route(
            "/categories/{id}",
            put(blog::categories_update).delete(blog::categories_delete),
        )
        .route("/tags", get(blog::tags_index).post(blog::tags_create))
        .route(
            "/tags/{id}",
            put(blog::tags_update).delete(blog::tags_delete),
        )
}

/// Every `/api/admin` route. Each handler takes `RequireAdmin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::show))
        .merge(catalog_routes())
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show).delete(orders::delete))
        .route("/orders/{id}/status", put(orders::update_status))
        .nest("/blog", blog_routes())
        .route("/users", get(users::index))
        .route("/users/{id}", get(users::show).delete(users::delete))
        .route("/users/{id}/role", put(users::update_role))
        .route("/reviews", get(reviews::reviews_index))
        .route("/reviews/{id}", delete(reviews::reviews_delete))
        .route("/comments", get(reviews::comments_index))
        .route("/comments/{id}", delete(reviews::comments_delete))
        .route("/settings", get(settings::show).put(settings::update))
}

/// Create all routes for the back office.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth_routes())
        .nest("/api/admin", admin_routes())
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

    fn app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/fuelstack_test")
            .unwrap();
        let state = AppState::new(test_config(), pool);
        crate::app(state, SessionManagerLayer::new(MemoryStore::default()))
    }

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
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
        let page = Page { number: 1, size: 20 };
        assert_eq!(Paginated::new(vec![1], 41, page).total_pages, 3);
        assert_eq!(Paginated::<i32>::new(vec![], 0, page).total_pages, 0);
    }

    #[tokio::test]
    async fn test_health() {
        let response = app().oneshot(request("GET", "/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        for (method, uri) in [
            ("GET", "/api/admin/dashboard"),
            ("GET", "/api/admin/products"),
            ("DELETE", "/api/admin/blog/categories/1"),
            ("GET", "/api/admin/settings"),
        ] {
            let response = app().oneshot(request(method, uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert!(body_string(response).await.contains("Authentication required"));
        }
    }

    #[tokio::test]
    async fn test_write_without_session_is_unauthorized() {
        let response = app()
            .oneshot(request(
                "PUT",
                "/api/admin/orders/1/status",
                Some(r#"{"status":"shipped"}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_anonymous_session_is_null() {
        let response = app()
            .oneshot(request("GET", "/api/auth/session", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "null");
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_body() {
        let response = app()
            .oneshot(request("POST", "/api/auth/login", Some(r#"{"email":1}"#)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_security_headers_present() {
        let response = app().oneshot(request("GET", "/health", None)).await.unwrap();
        assert_eq!(response.headers()["x-frame-options"], "DENY");
        assert_eq!(response.headers()["cache-control"], "no-store, max-age=0");
        assert!(response.headers().contains_key("x-request-id"));
    }
}
