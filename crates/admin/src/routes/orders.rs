//! Order management handlers.

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use fuelstack_core::models::Order;
use fuelstack_core::{OrderId, OrderStatus, PaymentStatus};

use crate::db::orders::OrderListFilter;
use crate::db::{OrderRepository, Page};
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::middleware::RequireAdmin;
use crate::routes::Paginated;
use crate::state::AppState;

/// Query parameters for the order list.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Body of `PUT /api/admin/orders/{id}/status`.
#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl StatusRequest {
    fn validate(&self) -> Result<()> {
        if self.status.is_none() && self.payment_status.is_none() {
            return Err(AppError::BadRequest(
                "status or payment_status is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Orders, newest first, without their items.
///
/// # Route
///
/// `GET /api/admin/orders`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Paginated<Order>>> {
    let page = Page::new(query.page, query.per_page);
    let filter = OrderListFilter {
        status: query.status,
        payment_status: query.payment_status,
        q: query.q,
    };

    let (orders, total) = OrderRepository::new(state.pool())
        .list(&filter, page)
        .await?;

    Ok(Json(Paginated::new(orders, total, page)))
}

/// One order with its items.
///
/// # Route
///
/// `GET /api/admin/orders/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

/// Set the order and/or payment status. Any status may follow any other.
///
/// # Route
///
/// `PUT /api/admin/orders/{id}/status`
#[instrument(
    skip(state, admin, body),
    fields(admin_id = %admin.id, status = ?body.status, payment_status = ?body.payment_status)
)]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Order>> {
    body.validate()?;

    let order = OrderRepository::new(state.pool())
        .update_status(id, body.status, body.payment_status)
        .await?;

    tracing::info!(
        order_number = %order.order_number,
        status = %order.status,
        payment_status = %order.payment_status,
        "Order status updated"
    );
    Ok(Json(order))
}

/// Delete an order and its items.
///
/// # Route
///
/// `DELETE /api/admin/orders/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    OrderRepository::new(state.pool()).delete(id).await?;
    tracing::info!(order_id = %id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_request_needs_a_field() {
        let empty: StatusRequest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.validate().is_err());

        let paid: StatusRequest =
            serde_json::from_value(json!({"payment_status": "paid"})).unwrap();
        assert!(paid.validate().is_ok());
        assert_eq!(paid.payment_status, Some(PaymentStatus::Paid));
    }

    #[test]
    fn test_any_status_accepted() {
        let request: StatusRequest =
            serde_json::from_value(json!({"status": "pending"})).unwrap();
        assert_eq!(request.status, Some(OrderStatus::Pending));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_unknown_status_rejected() {
        let result = serde_json::from_value::<StatusRequest>(json!({"status": "lost"}));
        assert!(result.is_err());
    }
}
