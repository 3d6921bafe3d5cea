//! Customer account integration tests: registration, addresses, wishlist.
//!
//! Most of these tests require:
//! - A migrated `PostgreSQL` database (`fs-cli migrate`)
//! - The storefront server running (`cargo run -p fuelstack-storefront`)
//!
//! Run with: `cargo test -p fuelstack-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use fuelstack_core::models::AddressInput;
use fuelstack_core::{UserId, UserRole};
use fuelstack_integration_tests::{TestContext, unique};
use fuelstack_storefront::db::addresses::AddressRepository;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tokio::task::JoinSet;

/// Register a fresh customer; the client keeps the session.
async fn register(ctx: &TestContext, client: &Client) -> String {
    let email = format!("{}@test.fuelstack.mn", unique("customer"));
    let resp = client
        .post(format!("{}/api/auth/register", ctx.storefront_url))
        .json(&json!({ "email": email, "password": "protein-shake-1", "name": "Saraa" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    email
}

fn address(label: &str) -> Value {
    json!({
        "label": label,
        "recipient_name": "Saraa",
        "phone": "88001122",
        "city": "Ulaanbaatar",
        "district": "Khan-Uul",
        "address_line": "Zaisan, building 7",
    })
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_register_rejects_duplicate_email() {
    let ctx = TestContext::new().await;
    let client = TestContext::client();
    let email = register(&ctx, &client).await;

    let session: Value = client
        .get(format!("{}/api/auth/session", ctx.storefront_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["email"], email.as_str());
    assert!(session.get("password_hash").is_none());

    let resp = TestContext::client()
        .post(format!("{}/api/auth/register", ctx.storefront_url))
        .json(&json!({ "email": email.to_uppercase(), "password": "another-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_account_routes_require_login() {
    let ctx = TestContext::new().await;

    let resp = TestContext::client()
        .get(format!("{}/api/account/addresses", ctx.storefront_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_default_address_follows_deletes() {
    let ctx = TestContext::new().await;
    let client = TestContext::client();
    register(&ctx, &client).await;
    let base = format!("{}/api/account/addresses", ctx.storefront_url);

    let home: Value = client
        .post(&base)
        .json(&address("Home"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(home["is_default"], true);

    let office: Value = client
        .post(&base)
        .json(&address("Office"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(office["is_default"], false);

    // Switching the default leaves exactly one
    let resp = client
        .post(format!("{base}/{}/default", office["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let list: Vec<Value> = client.get(&base).send().await.unwrap().json().await.unwrap();
    let defaults: Vec<_> = list.iter().filter(|a| a["is_default"] == true).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults.first().unwrap()["id"], office["id"]);

    // Deleting the default promotes the remaining address
    let resp = client
        .delete(format!("{base}/{}", office["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let list: Vec<Value> = client.get(&base).send().await.unwrap().json().await.unwrap();
    let [remaining] = list.as_slice() else {
        panic!("expected one address, got {}", list.len());
    };
    assert_eq!(remaining["id"], home["id"]);
    assert_eq!(remaining["is_default"], true);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_wishlist_toggle() {
    let ctx = TestContext::new().await;
    let product_id = ctx.create_product(45_000, 10).await;
    let client = TestContext::client();
    register(&ctx, &client).await;
    let toggle = format!("{}/api/account/wishlist/{product_id}", ctx.storefront_url);

    let body: Value = client.post(&toggle).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["wishlisted"], true);

    let list: Vec<Value> = client
        .get(format!("{}/api/account/wishlist", ctx.storefront_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);

    let body: Value = client.post(&toggle).send().await.unwrap().json().await.unwrap();
    assert_eq!(body["wishlisted"], false);
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_concurrent_first_addresses_keep_one_default() {
    let ctx = TestContext::new().await;
    let email = ctx.create_user(UserRole::Customer).await;
    let user_id: UserId = sqlx::query_scalar("SELECT id FROM shop.user WHERE email = $1")
        .bind(&email)
        .fetch_one(&ctx.pool)
        .await
        .unwrap();

    let mut writers = JoinSet::new();
    for n in 0..6 {
        let pool = ctx.pool.clone();
        let input: AddressInput = serde_json::from_value(address(&format!("Gym {n}"))).unwrap();
        writers.spawn(async move { AddressRepository::new(&pool).create(user_id, &input).await });
    }
    while let Some(result) = writers.join_next().await {
        result.unwrap().unwrap();
    }

    let list = AddressRepository::new(&ctx.pool).list_for_user(user_id).await.unwrap();
    assert_eq!(list.len(), 6);
    assert_eq!(list.iter().filter(|a| a.is_default).count(), 1);
}
