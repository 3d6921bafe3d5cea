//! Product rating aggregate under concurrent review writes.
//!
//! These tests require a migrated `PostgreSQL` database.
//!
//! Run with: `cargo test -p fuelstack-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use fuelstack_core::{ProductId, ReviewId, UserId, UserRole};
use fuelstack_integration_tests::TestContext;
use fuelstack_storefront::db::reviews::{NewReview, ReviewRepository};
use rust_decimal::Decimal;
use tokio::task::JoinSet;

async fn user_id(ctx: &TestContext) -> UserId {
    let email = ctx.create_user(UserRole::Customer).await;
    sqlx::query_scalar("SELECT id FROM shop.user WHERE email = $1")
        .bind(email)
        .fetch_one(&ctx.pool)
        .await
        .unwrap()
}

async fn aggregate(ctx: &TestContext, product_id: ProductId) -> (i32, Decimal) {
    sqlx::query_as("SELECT rating_count, rating_avg FROM shop.product WHERE id = $1")
        .bind(product_id)
        .fetch_one(&ctx.pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires database"]
async fn test_concurrent_reviews_all_count() {
    let ctx = TestContext::new().await;
    let product_id = ctx.create_product(70_000, 10).await;

    let mut users = Vec::new();
    for _ in 0..8 {
        users.push(user_id(&ctx).await);
    }

    // Ratings 1..=4 twice: average 2.5
    let mut writers = JoinSet::new();
    for (n, user_id) in users.iter().copied().enumerate() {
        let pool = ctx.pool.clone();
        let rating = i16::try_from(n % 4 + 1).unwrap();
        writers.spawn(async move {
            ReviewRepository::new(&pool)
                .create(NewReview {
                    product_id,
                    user_id,
                    rating,
                    title: None,
                    body: "Mixes without clumps",
                })
                .await
        });
    }
    while let Some(result) = writers.join_next().await {
        result.unwrap().unwrap();
    }

    let (count, average) = aggregate(&ctx, product_id).await;
    assert_eq!(count, 8);
    assert_eq!(average, Decimal::new(25, 1));

    // Removing them concurrently brings the aggregate back to zero
    let reviews: Vec<(ReviewId, UserId)> =
        sqlx::query_as("SELECT id, user_id FROM shop.review WHERE product_id = $1")
            .bind(product_id)
            .fetch_all(&ctx.pool)
            .await
            .unwrap();
    let mut removers = JoinSet::new();
    for (id, user_id) in reviews {
        let pool = ctx.pool.clone();
        removers.spawn(async move {
            ReviewRepository::new(&pool)
                .delete_own(user_id, id)
                .await
        });
    }
    while let Some(result) = removers.join_next().await {
        result.unwrap().unwrap();
    }

    let (count, average) = aggregate(&ctx, product_id).await;
    assert_eq!(count, 0);
    assert_eq!(average, Decimal::ZERO);
}
