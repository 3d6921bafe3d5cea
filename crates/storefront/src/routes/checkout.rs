//! Checkout route handler.

use axum::{extract::State, http::StatusCode};
use tower_sessions::Session;
use tracing::instrument;

use fuelstack_core::models::Order;

use crate::error::{Result, add_breadcrumb};
use crate::extract::Json;
use crate::middleware::OptionalAuth;
use crate::routes::cart::{load_cart, save_cart};
use crate::services::checkout::{CheckoutRequest, place_order};
use crate::state::AppState;

/// Place an order from the session cart. Guests may check out.
///
/// # Route
///
/// `POST /api/checkout`
#[instrument(skip(state, session, user, body))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let settings = state.settings().await?;
    let mut cart = load_cart(&session).await?;

    let result = place_order(state.pool(), &settings, user.as_ref(), &mut cart, &body).await;
    // Persist even on failure: pricing may have dropped vanished lines.
    save_cart(&session, &cart).await?;
    let order = result?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", &order.order_number)]),
    );

    Ok((StatusCode::CREATED, Json(order)))
}
