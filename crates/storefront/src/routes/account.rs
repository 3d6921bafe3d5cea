//! Account route handlers.
//!
//! Every route here requires a logged-in customer and only ever touches that
//! customer's own data.

use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use fuelstack_core::models::{Address, AddressInput, Order, Product, User};
use fuelstack_core::{AddressId, OrderId, ProductId};

use crate::db::RepositoryError;
use crate::db::addresses::AddressRepository;
use crate::db::orders::OrderRepository;
use crate::db::users::UserRepository;
use crate::db::wishlist::WishlistRepository;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path};
use crate::middleware::RequireAuth;
use crate::services::auth::AuthService;
use crate::state::AppState;

const MAX_NAME_LENGTH: usize = 100;
const MAX_PHONE_LENGTH: usize = 32;

/// Body of `PUT /api/account/profile`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Body of `PUT /api/account/password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: String,
}

/// Result of toggling a wishlist entry.
#[derive(Debug, Serialize)]
pub struct WishlistToggle {
    pub wishlisted: bool,
}

fn optional_field(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>> {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    if value.is_some_and(|v| v.chars().count() > max) {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.map(str::to_owned))
}

fn validate_address(input: &AddressInput) -> Result<()> {
    let missing = input.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "missing address fields: {}",
            missing.join(", ")
        )))
    }
}

fn address_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Address not found".to_string()),
        other => other.into(),
    }
}

// =============================================================================
// Profile
// =============================================================================

/// The customer's profile.
///
/// # Route
///
/// `GET /api/account/profile`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>> {
    UserRepository::new(state.pool())
        .get_by_id(user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Update name and phone.
///
/// # Route
///
/// `PUT /api/account/profile`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<User>> {
    let name = optional_field("name", body.name.as_deref(), MAX_NAME_LENGTH)?;
    let phone = optional_field("phone", body.phone.as_deref(), MAX_PHONE_LENGTH)?;

    let updated = UserRepository::new(state.pool())
        .update_profile(user.id, name.as_deref(), phone.as_deref())
        .await?;

    Ok(Json(updated))
}

/// Change the password. Google-only accounts may set a first password
/// without giving a current one.
///
/// # Route
///
/// `PUT /api/account/password`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    AuthService::new(state.pool())
        .change_password(
            user.id,
            body.current_password.as_deref(),
            &body.new_password,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Addresses
// =============================================================================

/// Saved addresses, default first.
///
/// # Route
///
/// `GET /api/account/addresses`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(
        AddressRepository::new(state.pool())
            .list_for_user(user.id)
            .await?,
    ))
}

/// Save an address. The first one becomes the default.
///
/// # Route
///
/// `POST /api/account/addresses`
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>)> {
    validate_address(&input)?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &input)
        .await?;

    Ok((StatusCode::CREATED, Json(address)))
}

/// Edit an address.
///
/// # Route
///
/// `PUT /api/account/addresses/{id}`
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Address>> {
    validate_address(&input)?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &input)
        .await
        .map_err(address_not_found)?;

    Ok(Json(address))
}

/// Delete an address. Deleting the default promotes the newest remaining one.
///
/// # Route
///
/// `DELETE /api/account/addresses/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await
        .map_err(address_not_found)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Make an address the default.
///
/// # Route
///
/// `POST /api/account/addresses/{id}/default`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    let address = AddressRepository::new(state.pool())
        .set_default(user.id, id)
        .await
        .map_err(address_not_found)?;

    Ok(Json(address))
}

// =============================================================================
// Wishlist
// =============================================================================

/// Wishlisted products.
///
/// # Route
///
/// `GET /api/account/wishlist`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn wishlist(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(WishlistRepository::new(state.pool()).list(user.id).await?))
}

/// Add or remove a product.
///
/// # Route
///
/// `POST /api/account/wishlist/{product_id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn toggle_wishlist(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<WishlistToggle>> {
    let wishlisted = WishlistRepository::new(state.pool())
        .toggle(user.id, product_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(WishlistToggle { wishlisted }))
}

/// Remove a product. Removing an absent product is not an error.
///
/// # Route
///
/// `DELETE /api/account/wishlist/{product_id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    WishlistRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Orders
// =============================================================================

/// The customer's orders, newest first.
///
/// # Route
///
/// `GET /api/account/orders`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(
        OrderRepository::new(state.pool())
            .list_for_user(user.id)
            .await?,
    ))
}

/// One of the customer's orders. Other customers' orders are 404.
///
/// # Route
///
/// `GET /api/account/orders/{id}`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_for_user(user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}
