//! Storefront API integration tests.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`fs-cli migrate`)
//! - The storefront server running (`cargo run -p fuelstack-storefront`)
//!
//! Run with: `cargo test -p fuelstack-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use fuelstack_core::{Money, ProductId};
use fuelstack_integration_tests::{TestContext, money, unique};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// Guest checkout body for a customer email.
fn guest_checkout(email: &str) -> Value {
    json!({
        "customer": { "name": "Tuvshin", "email": email, "phone": "95554433" },
        "shipping_address": {
            "recipient_name": "Tuvshin",
            "phone": "95554433",
            "city": "Darkhan",
            "district": "Darkhan",
            "address_line": "4th khoroo, building 21",
        },
        "payment_method": "bank_transfer",
    })
}

async fn add_to_cart(ctx: &TestContext, client: &Client, product_id: ProductId, quantity: u32) {
    let resp = client
        .post(format!("{}/api/cart/items", ctx.storefront_url))
        .json(&json!({ "product_id": product_id, "quantity": quantity }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_storefront_health() {
    let ctx = TestContext::new().await;

    let resp = TestContext::client()
        .get(format!("{}/health", ctx.storefront_url))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = TestContext::client()
        .get(format!("{}/health/ready", ctx.storefront_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_cart_promo_and_checkout() {
    let ctx = TestContext::new().await;
    let product_id = ctx.create_product(60_000, 5).await;
    let client = TestContext::client();
    let base = &ctx.storefront_url;

    // Add two units
    let resp = client
        .post(format!("{base}/api/cart/items"))
        .json(&json!({ "product_id": product_id, "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["item_count"], 2);
    assert_eq!(money(&cart["subtotal"]), Money::from_units(120_000));

    // Unknown promo codes are rejected
    let resp = client
        .post(format!("{base}/api/cart/promo"))
        .json(&json!({ "code": "FREESHIP" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // WELCOME10 takes 10 % off the subtotal
    let resp = client
        .post(format!("{base}/api/cart/promo"))
        .json(&json!({ "code": "welcome10" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["promo_code"], "WELCOME10");
    assert_eq!(money(&cart["discount"]), Money::from_units(12_000));

    let threshold = money(&cart["free_shipping_threshold"]);
    let shipping = money(&cart["shipping"]);
    if Money::from_units(120_000) >= threshold {
        assert!(shipping.is_zero());
    } else {
        assert!(!shipping.is_zero());
    }

    // Guest checkout
    let resp = client
        .post(format!("{base}/api/checkout"))
        .json(&json!({
            "customer": {
                "name": "Bat-Erdene",
                "email": "bat@test.fuelstack.mn",
                "phone": "99112233",
            },
            "shipping_address": {
                "recipient_name": "Bat-Erdene",
                "phone": "99112233",
                "city": "Ulaanbaatar",
                "district": "Sukhbaatar",
                "address_line": "Building 12, apartment 34",
            },
            "payment_method": "cash_on_delivery",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let order: Value = resp.json().await.unwrap();
    assert!(order["order_number"].as_str().unwrap().starts_with("FS-"));
    assert_eq!(order["status"], "pending");
    assert_eq!(order["payment_status"], "pending");
    assert_eq!(order["promo_code"], "WELCOME10");
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(money(&order["total"]), money(&cart["total"]));

    // Stock is taken and the cart is emptied
    assert_eq!(ctx.stock_of(product_id).await, 3);

    let cart: Value = client
        .get(format!("{base}/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["item_count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_with_empty_cart_is_rejected() {
    let ctx = TestContext::new().await;

    let resp = TestContext::client()
        .post(format!("{}/api/checkout", ctx.storefront_url))
        .json(&json!({
            "customer": { "name": "A", "email": "a@test.fuelstack.mn", "phone": "1" },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_short_line_rolls_back_checkout() {
    let ctx = TestContext::new().await;
    let plenty = ctx.create_product(30_000, 5).await;
    let scarce = ctx.create_product(50_000, 3).await;
    let client = TestContext::client();
    add_to_cart(&ctx, &client, plenty, 2).await;
    add_to_cart(&ctx, &client, scarce, 2).await;

    // Someone else buys most of the scarce product meanwhile
    sqlx::query("UPDATE shop.product SET stock = 1 WHERE id = $1")
        .bind(scarce)
        .execute(&ctx.pool)
        .await
        .unwrap();

    let email = format!("{}@test.fuelstack.mn", unique("guest"));
    let resp = client
        .post(format!("{}/api/checkout", ctx.storefront_url))
        .json(&guest_checkout(&email))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["product_id"], json!(scarce));
    assert!(body["error"].is_string());

    // Nothing was taken and no order exists
    assert_eq!(ctx.stock_of(plenty).await, 5);
    assert_eq!(ctx.stock_of(scarce).await, 1);
    let orders: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM shop.order WHERE customer->>'email' = $1")
            .bind(&email)
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
    assert_eq!(orders, 0);

    // The cart survives for another try
    let cart: Value = client
        .get(format!("{}/api/cart", ctx.storefront_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["item_count"], 4);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_concurrent_checkouts_in_opposite_order() {
    let ctx = TestContext::new().await;
    let first = ctx.create_product(20_000, 10).await;
    let second = ctx.create_product(25_000, 10).await;

    let forward = TestContext::client();
    add_to_cart(&ctx, &forward, first, 1).await;
    add_to_cart(&ctx, &forward, second, 1).await;

    let backward = TestContext::client();
    add_to_cart(&ctx, &backward, second, 1).await;
    add_to_cart(&ctx, &backward, first, 1).await;

    let url = format!("{}/api/checkout", ctx.storefront_url);
    let forward_body = guest_checkout(&format!("{}@test.fuelstack.mn", unique("guest")));
    let backward_body = guest_checkout(&format!("{}@test.fuelstack.mn", unique("guest")));
    let (a, b) = tokio::join!(
        forward.post(&url).json(&forward_body).send(),
        backward.post(&url).json(&backward_body).send(),
    );
    assert_eq!(a.unwrap().status(), StatusCode::CREATED);
    assert_eq!(b.unwrap().status(), StatusCode::CREATED);

    assert_eq!(ctx.stock_of(first).await, 8);
    assert_eq!(ctx.stock_of(second).await, 8);
}
