//! Order repository (customer side).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use fuelstack_core::models::{CustomerSnapshot, Order, OrderItem, ShippingAddressSnapshot};
use fuelstack_core::pricing::OrderTotals;
use fuelstack_core::{
    Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId,
};

use super::{RepositoryError, conflict_on_unique};

pub(crate) const ORDER_COLUMNS: &str = "id, order_number, user_id, customer, shipping_address, \
    status, payment_status, payment_method, promo_code, subtotal, discount, shipping_fee, total, \
    notes, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct OrderRow {
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
    pub(crate) fn into_order(self, items: Vec<OrderItem>) -> Order {
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
pub(crate) struct OrderItemRow {
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

/// A line to insert with a new order.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: Money,
}

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub customer: CustomerSnapshot,
    pub shipping_address: ShippingAddressSnapshot,
    pub payment_method: PaymentMethod,
    pub promo_code: Option<String>,
    pub totals: OrderTotals,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// Errors from placing an order.
#[derive(Debug, thiserror::Error)]
pub enum CreateOrderError {
    /// Not enough stock (or the product went inactive) for a line.
    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CreateOrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Repository for a customer's orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order: decrement stock, insert the order and its items.
    ///
    /// All of it happens in one transaction; if any line lacks stock nothing
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns `CreateOrderError::InsufficientStock` with the first short product.
    /// Returns `RepositoryError::Conflict` (wrapped) on an order number collision.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, CreateOrderError> {
        let mut tx = self.pool.begin().await?;

        lock_products(&mut tx, order.items.iter().map(|item| item.product_id)).await?;
        for item in &order.items {
            reserve_stock(&mut tx, item.product_id, item.quantity).await?;
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO shop.order
                (order_number, user_id, customer, shipping_address, status, payment_status,
                 payment_method, promo_code, subtotal, discount, shipping_fee, total, notes)
            VALUES ($1, $2, $3, $4, 'pending', 'pending', $5, $6, $7, $8, $9, $10, $11)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(&order.order_number)
        .bind(order.user_id)
        .bind(Json(&order.customer))
        .bind(Json(&order.shipping_address))
        .bind(order.payment_method)
        .bind(order.promo_code.as_deref())
        .bind(order.totals.subtotal)
        .bind(order.totals.discount)
        .bind(order.totals.shipping)
        .bind(order.totals.total)
        .bind(order.notes.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "order number already exists"))?;

        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| CreateOrderError::InsufficientStock(item.product_id))?;
            let item_row = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO shop.order_item
                    (order_id, product_id, product_name, product_slug, image_url,
                     quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id, order_id, product_id, product_name, product_slug, image_url,
                          quantity, unit_price, line_total
                ",
            )
            .bind(row.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(&item.product_slug)
            .bind(item.image_url.as_deref())
            .bind(quantity)
            .bind(item.unit_price)
            .bind(item.unit_price * item.quantity)
            .fetch_one(&mut *tx)
            .await?;
            items.push(order_item(item_row));
        }

        tx.commit().await?;

        Ok(row.into_order(items))
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        attach_items(self.pool, rows).await
    }

    /// One of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.order WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(attach_items(self.pool, row.into_iter().collect()).await?.pop())
    }
}

/// Decrement stock for one line, failing when there isn't enough.
/// Row-lock the products in id order so concurrent checkouts of the same
/// products queue instead of deadlocking.
async fn lock_products(
    tx: &mut Transaction<'_, Postgres>,
    ids: impl Iterator<Item = ProductId>,
) -> Result<(), RepositoryError> {
    let mut raw_ids: Vec<i32> = ids.map(|id| id.as_i32()).collect();
    raw_ids.sort_unstable();
    raw_ids.dedup();

    sqlx::query(
        "SELECT id FROM shop.product WHERE id = ANY($1) ORDER BY id FOR NO KEY UPDATE",
    )
    .bind(&raw_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn reserve_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    quantity: u32,
) -> Result<(), CreateOrderError> {
    let quantity =
        i32::try_from(quantity).map_err(|_| CreateOrderError::InsufficientStock(product_id))?;

    let updated = sqlx::query(
        r"
        UPDATE shop.product
        SET stock = stock - $2, sold_count = sold_count + $2, updated_at = NOW()
        WHERE id = $1 AND is_active AND stock >= $2
        ",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(CreateOrderError::InsufficientStock(product_id));
    }
    Ok(())
}

fn order_item(row: OrderItemRow) -> OrderItem {
    OrderItem {
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

/// Load items for order rows, preserving row order.
async fn attach_items(pool: &PgPool, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i32> = rows.iter().map(|row| row.id.as_i32()).collect();

    let item_rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT id, order_id, product_id, product_name, product_slug, image_url,
               quantity, unit_price, line_total
        FROM shop.order_item
        WHERE order_id = ANY($1)
        ORDER BY order_id, id
        ",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in item_rows {
        by_order.entry(row.order_id).or_default().push(order_item(row));
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let items = by_order.remove(&row.id).unwrap_or_default();
            row.into_order(items)
        })
        .collect())
}
