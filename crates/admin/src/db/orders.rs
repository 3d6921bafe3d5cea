//! Order management and dashboard figures.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use sqlx::types::Json;

use fuelstack_core::models::{CustomerSnapshot, Order, OrderItem, ShippingAddressSnapshot};
use fuelstack_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

use super::{Page, RepositoryError, search_pattern};

const ORDER_COLUMNS: &str = "id, order_number, user_id, customer, shipping_address, \
    status, payment_status, payment_method, promo_code, subtotal, discount, shipping_fee, total, \
    notes, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    user_id: Option<UserId>,
    customer: Json<CustomerSnapshot>,
    shipping_address: Json<ShippingAddressSnapshot>,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    promo_code: Option<String>,
    subtotal: Money,
    discount: Money,
    shipping_fee: Money,
    total: Money,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            customer: self.customer.0,
            shipping_address: self.shipping_address.0,
            status: self.status,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            promo_code: self.promo_code,
            subtotal: self.subtotal,
            discount: self.discount,
            shipping_fee: self.shipping_fee,
            total: self.total,
            notes: self.notes,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    product_name: String,
    product_slug: Option<String>,
    image_url: Option<String>,
    quantity: i32,
    unit_price: Money,
    line_total: Money,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_slug: row.product_slug,
            image_url: row.image_url,
            quantity: row.quantity,
            unit_price: row.unit_price,
            line_total: row.line_total,
        }
    }
}

/// Filters for the admin order list.
#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    /// Matches the order number, customer name, email or phone.
    pub q: Option<String>,
}

/// Headline numbers for the back-office dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct OrderStats {
    pub total_orders: i64,
    /// One entry per status, zero when no order has it.
    pub orders_by_status: HashMap<OrderStatus, i64>,
    /// Sum of totals of paid orders that aren't cancelled.
    pub revenue: Money,
}

/// Repository for order administration.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders, newest first, without their items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &OrderListFilter,
        page: Page,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let conditions = r"
            ($1::shop.order_status IS NULL OR status = $1)
            AND ($2::shop.payment_status IS NULL OR payment_status = $2)
            AND ($3::text IS NULL
                 OR order_number ILIKE $3
                 OR customer->>'name' ILIKE $3
                 OR customer->>'email' ILIKE $3
                 OR customer->>'phone' ILIKE $3)
        ";
        let q = search_pattern(filter.q.as_deref());

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE {conditions} \
             ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"
        ))
        .bind(filter.status)
        .bind(filter.payment_status)
        .bind(q.as_deref())
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) =
            sqlx::query_as(&format!("SELECT COUNT(*) FROM shop.order WHERE {conditions}"))
                .bind(filter.status)
                .bind(filter.payment_status)
                .bind(q.as_deref())
                .fetch_one(self.pool)
                .await?;

        Ok((
            rows.into_iter().map(|row| row.into_order(Vec::new())).collect(),
            total,
        ))
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, product_name, product_slug, image_url,
                   quantity, unit_price, line_total
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(
            row.into_order(items.into_iter().map(Into::into).collect()),
        ))
    }

    /// Set the order status, the payment status, or both.
    ///
    /// Any value may follow any other; a `None` leaves that field unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: Option<OrderStatus>,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Order, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.order
            SET status = COALESCE($2, status),
                payment_status = COALESCE($3, payment_status),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .bind(payment_status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete an order and its items. Stock is not restored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// The most recent orders, without items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order ORDER BY created_at DESC, id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.into_order(Vec::new())).collect())
    }

    /// Order counts and revenue.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let counts: Vec<(OrderStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM shop.order GROUP BY status")
                .fetch_all(self.pool)
                .await?;

        let revenue: Money = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(total), 0)
            FROM shop.order
            WHERE payment_status = 'paid' AND status <> 'cancelled'
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(order_stats(counts, revenue))
    }
}

fn order_stats(counts: Vec<(OrderStatus, i64)>, revenue: Money) -> OrderStats {
    let mut orders_by_status: HashMap<OrderStatus, i64> =
        OrderStatus::ALL.iter().map(|status| (*status, 0)).collect();
    for (status, count) in counts {
        orders_by_status.insert(status, count);
    }

    OrderStats {
        total_orders: orders_by_status.values().sum(),
        orders_by_status,
        revenue,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_stats_fills_missing_statuses() {
        let stats = order_stats(
            vec![(OrderStatus::Pending, 4), (OrderStatus::Delivered, 2)],
            Money::from_units(250_000),
        );
        assert_eq!(stats.total_orders, 6);
        assert_eq!(stats.orders_by_status.len(), OrderStatus::ALL.len());
        assert_eq!(stats.orders_by_status[&OrderStatus::Cancelled], 0);
        assert_eq!(stats.orders_by_status[&OrderStatus::Pending], 4);
    }

    #[test]
    fn test_order_stats_serializes_status_keys() {
        let stats = order_stats(vec![(OrderStatus::Shipped, 1)], Money::ZERO);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["orders_by_status"]["shipped"], 1);
        assert_eq!(json["orders_by_status"]["processing"], 0);
    }
}
