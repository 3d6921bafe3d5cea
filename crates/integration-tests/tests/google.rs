//! Google sign-in account linking against the real schema.
//!
//! These tests require a migrated `PostgreSQL` database; the password login
//! check also needs the storefront server running.
//!
//! Run with: `cargo test -p fuelstack-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use fuelstack_core::UserRole;
use fuelstack_integration_tests::{TEST_PASSWORD, TestContext, unique};
use fuelstack_storefront::services::google::{GoogleUserInfo, find_or_create_user};
use reqwest::StatusCode;
use serde_json::json;

fn profile(email: &str) -> GoogleUserInfo {
    GoogleUserInfo {
        sub: unique("google"),
        email: Some(email.to_owned()),
        email_verified: true,
        name: Some("Enkhjin".to_owned()),
        picture: Some("https://lh3.googleusercontent.com/a/photo".to_owned()),
    }
}

#[tokio::test]
#[ignore = "Requires database and running storefront server"]
async fn test_unknown_google_email_creates_passwordless_customer() {
    let ctx = TestContext::new().await;
    let email = format!("{}@test.fuelstack.mn", unique("google"));

    let user = find_or_create_user(&ctx.pool, &profile(&email)).await.unwrap();
    assert_eq!(user.email.as_str(), email);
    assert_eq!(user.role, UserRole::Customer);
    assert!(user.password_hash.is_none());
    assert_eq!(user.name.as_deref(), Some("Enkhjin"));

    // Signing in again reuses the account
    let again = find_or_create_user(&ctx.pool, &profile(&email)).await.unwrap();
    assert_eq!(again.id, user.id);

    // No password can log in to a Google-only account
    let resp = TestContext::client()
        .post(format!("{}/api/auth/login", ctx.storefront_url))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_google_sign_in_links_existing_password_account() {
    let ctx = TestContext::new().await;
    let email = ctx.create_user(UserRole::Customer).await;

    let user = find_or_create_user(&ctx.pool, &profile(&email)).await.unwrap();
    assert!(user.password_hash.is_some());
    // Existing name is kept
    assert_eq!(user.name.as_deref(), Some("Integration Test"));
}
