//! Dashboard route handler.

use axum::extract::State;
use serde::Serialize;
use tracing::instrument;

use fuelstack_core::UserRole;
use fuelstack_core::models::{Order, Product};

use crate::db::orders::OrderStats;
use crate::db::{OrderRepository, ProductRepository, UserRepository};
use crate::error::Result;
use crate::extract::Json;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Products at or below this stock level are flagged.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// How many low-stock products the dashboard lists.
const LOW_STOCK_LIMIT: i64 = 20;

/// How many recent orders the dashboard lists.
const RECENT_ORDERS: i64 = 5;

/// Dashboard overview.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub products_count: i64,
    pub customers_count: i64,
    #[serde(flatten)]
    pub orders: OrderStats,
    pub low_stock: Vec<Product>,
    pub recent_orders: Vec<Order>,
}

/// Headline numbers for the back office.
///
/// # Route
///
/// `GET /api/admin/dashboard`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Dashboard>> {
    let products = ProductRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let users = UserRepository::new(state.pool());

    let (products_count, customers_count, order_stats, low_stock, recent_orders) = tokio::try_join!(
        products.count(),
        users.count_with_role(UserRole::Customer),
        orders.stats(),
        products.low_stock(LOW_STOCK_THRESHOLD, LOW_STOCK_LIMIT),
        orders.recent(RECENT_ORDERS),
    )?;

    Ok(Json(Dashboard {
        products_count,
        customers_count,
        orders: order_stats,
        low_stock,
        recent_orders,
    }))
}
