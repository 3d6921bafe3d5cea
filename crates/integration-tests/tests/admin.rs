//! Back-office API integration tests.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`fs-cli migrate`)
//! - The admin server running (`cargo run -p fuelstack-admin`)
//!
//! Run with: `cargo test -p fuelstack-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use fuelstack_core::UserRole;
use fuelstack_integration_tests::{TEST_PASSWORD, TestContext, unique};
use reqwest::StatusCode;
use serde_json::{Value, json};

// ============================================================================
// Route protection
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_admin_routes_require_login() {
    let ctx = TestContext::new().await;
    let client = TestContext::client();

    for path in ["/api/admin/dashboard", "/api/admin/orders", "/api/admin/users"] {
        let resp = client
            .get(format!("{}{path}", ctx.admin_url))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_customer_cannot_log_in_to_admin() {
    let ctx = TestContext::new().await;
    let email = ctx.create_user(UserRole::Customer).await;
    let client = TestContext::client();

    let resp = client
        .post(format!("{}/api/auth/login", ctx.admin_url))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // No session was created
    let resp = client
        .get(format!("{}/api/admin/dashboard", ctx.admin_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_wrong_password_is_unauthorized() {
    let ctx = TestContext::new().await;
    let email = ctx.create_user(UserRole::Admin).await;

    let resp = TestContext::client()
        .post(format!("{}/api/auth/login", ctx.admin_url))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_demoted_admin_loses_access() {
    let ctx = TestContext::new().await;
    let client = ctx.admin_client().await;

    let session: Value = client
        .get(format!("{}/api/auth/session", ctx.admin_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let email = session["email"].as_str().unwrap().to_owned();

    sqlx::query("UPDATE shop.user SET role = 'customer' WHERE email = $1")
        .bind(&email)
        .execute(&ctx.pool)
        .await
        .unwrap();

    let resp = client
        .get(format!("{}/api/admin/dashboard", ctx.admin_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Dashboard
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_dashboard_shape() {
    let ctx = TestContext::new().await;
    let client = ctx.admin_client().await;

    let resp = client
        .get(format!("{}/api/admin/dashboard", ctx.admin_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert!(body["products_count"].is_i64());
    assert!(body["customers_count"].is_i64());
    assert!(body["orders_by_status"]["cancelled"].is_i64());
    assert!(body["recent_orders"].as_array().unwrap().len() <= 5);
}

// ============================================================================
// Blog category delete conflict
// ============================================================================

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_blog_category_delete_conflict() {
    let ctx = TestContext::new().await;
    let client = ctx.admin_client().await;
    let base = &ctx.admin_url;

    let resp = client
        .post(format!("{base}/api/admin/blog/categories"))
        .json(&json!({ "slug": unique("training"), "name": "Training" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let category: Value = resp.json().await.unwrap();
    let category_id = category["id"].as_i64().unwrap();

    let resp = client
        .post(format!("{base}/api/admin/blog/posts"))
        .json(&json!({
            "slug": unique("leg-day"),
            "title": "Leg day basics",
            "content": "Squat first.",
            "status": "published",
            "category_id": category_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post: Value = resp.json().await.unwrap();
    assert!(!post["published_at"].is_null());

    // Refused while the post uses it
    let resp = client
        .delete(format!("{base}/api/admin/blog/categories/{category_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["posts_count"], 1);
    assert!(body["error"].is_string());

    // Allowed once the post is gone
    let resp = client
        .delete(format!("{base}/api/admin/blog/posts/{}", post["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .delete(format!("{base}/api/admin/blog/categories/{category_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_order_status_requires_a_field() {
    let ctx = TestContext::new().await;
    let client = ctx.admin_client().await;

    let resp = client
        .put(format!("{}/api/admin/orders/1/status", ctx.admin_url))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_order_status_moves_freely() {
    let ctx = TestContext::new().await;
    let client = ctx.admin_client().await;
    let order_id = ctx.create_order().await;
    let url = format!("{}/api/admin/orders/{order_id}/status", ctx.admin_url);

    // Any status can follow any other, including backwards
    for status in ["delivered", "pending", "cancelled", "processing"] {
        let order: Value = client
            .put(&url)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(order["status"], status);
        assert_eq!(order["payment_status"], "pending");
    }

    // Payment status alone leaves the fulfillment status untouched
    let order: Value = client
        .put(&url)
        .json(&json!({ "payment_status": "paid" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(order["status"], "processing");
    assert_eq!(order["payment_status"], "paid");

    // Unknown values are a JSON 400
    let resp = client
        .put(&url)
        .json(&json!({ "status": "lost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].is_string());
}
