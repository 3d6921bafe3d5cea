//! Cart route handlers.
//!
//! The cart lives in the session (see [`SessionCart`]). Every response is the
//! freshly priced cart.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use fuelstack_core::ProductId;
use fuelstack_core::models::Product;
use fuelstack_core::pricing::PromoCode;

use crate::db::catalog::CatalogRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Path};
use crate::models::{SessionCart, session_keys};
use crate::services::cart::{CartView, price_cart};
use crate::state::AppState;

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Body of `PUT /api/cart/items/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// Body of `POST /api/cart/promo`.
#[derive(Debug, Deserialize)]
pub struct PromoRequest {
    pub code: String,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Read the cart from the session (empty if none).
pub(crate) async fn load_cart(session: &Session) -> Result<SessionCart> {
    Ok(session
        .get::<SessionCart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Write the cart back to the session.
pub(crate) async fn save_cart(session: &Session, cart: &SessionCart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Price the cart, persisting it if stale lines were dropped.
async fn priced_view(state: &AppState, session: &Session, cart: &mut SessionCart) -> Result<CartView> {
    let (priced, changed) = price_cart(state.pool(), cart).await?;
    if changed {
        save_cart(session, cart).await?;
    }
    let settings = state.settings().await?;
    Ok(priced.view(&settings))
}

async fn active_product(state: &AppState, id: ProductId) -> Result<Option<Product>> {
    Ok(CatalogRepository::new(state.pool())
        .get_active_by_ids(&[id])
        .await?
        .pop())
}

fn available(product: &Product) -> u32 {
    u32::try_from(product.stock).unwrap_or(0)
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the priced cart.
///
/// # Route
///
/// `GET /api/cart`
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    Ok(Json(priced_view(&state, &session, &mut cart).await?))
}

/// Add a product, merging with an existing line. Quantity is capped at stock.
///
/// # Route
///
/// `POST /api/cart/items`
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    if body.quantity == 0 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }

    let product = active_product(&state, body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    if !product.in_stock() {
        return Err(AppError::Conflict("Product is out of stock".to_string()));
    }

    let mut cart = load_cart(&session).await?;
    cart.add(product.id, body.quantity, available(&product));
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &product.id.to_string())]),
    );

    Ok(Json(priced_view(&state, &session, &mut cart).await?))
}

/// Set a line's quantity. Zero removes the line.
///
/// # Route
///
/// `PUT /api/cart/items/{product_id}`
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;

    let stock = if body.quantity == 0 {
        0
    } else {
        active_product(&state, product_id)
            .await?
            .map_or(0, |p| available(&p))
    };

    if !cart.set_quantity(product_id, body.quantity, stock) {
        return Err(AppError::NotFound("Product is not in the cart".to_string()));
    }
    save_cart(&session, &cart).await?;

    Ok(Json(priced_view(&state, &session, &mut cart).await?))
}

/// Remove a line.
///
/// # Route
///
/// `DELETE /api/cart/items/{product_id}`
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(product_id) {
        save_cart(&session, &cart).await?;
    }

    Ok(Json(priced_view(&state, &session, &mut cart).await?))
}

/// Empty the cart.
///
/// # Route
///
/// `DELETE /api/cart`
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<StatusCode> {
    session.remove::<SessionCart>(session_keys::CART).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a promo code.
///
/// # Route
///
/// `POST /api/cart/promo`
#[instrument(skip(state, session))]
pub async fn apply_promo(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<PromoRequest>,
) -> Result<Json<CartView>> {
    let code = PromoCode::parse(&body.code).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut cart = load_cart(&session).await?;
    cart.promo_code = Some(code);
    save_cart(&session, &cart).await?;

    Ok(Json(priced_view(&state, &session, &mut cart).await?))
}

/// Remove the promo code.
///
/// # Route
///
/// `DELETE /api/cart/promo`
#[instrument(skip(state, session))]
pub async fn remove_promo(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if cart.promo_code.take().is_some() {
        save_cart(&session, &cart).await?;
    }

    Ok(Json(priced_view(&state, &session, &mut cart).await?))
}
