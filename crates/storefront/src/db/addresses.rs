//! Saved address repository.
//!
//! Keeps exactly one default address per user whenever the user has any.
//! Every write that can move the default runs in a transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use fuelstack_core::models::{Address, AddressInput};
use fuelstack_core::{AddressId, UserId};

use super::RepositoryError;

const ADDRESS_COLUMNS: &str = "id, user_id, label, recipient_name, phone, city, district, \
                               khoroo, address_line, notes, is_default, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    user_id: UserId,
    label: Option<String>,
    recipient_name: String,
    phone: String,
    city: String,
    district: String,
    khoroo: Option<String>,
    address_line: String,
    notes: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            label: row.label,
            recipient_name: row.recipient_name,
            phone: row.phone,
            city: row.city,
            district: row.district,
            khoroo: row.khoroo,
            address_line: row.address_line,
            notes: row.notes,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for a user's saved addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, default first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            SELECT {ADDRESS_COLUMNS} FROM shop.address
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Get one of the user's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.address WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Address::from))
    }

    /// Add an address. The user's first address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        let (existing,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM shop.address WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            INSERT INTO shop.address
                (user_id, label, recipient_name, phone, city, district, khoroo,
                 address_line, notes, is_default)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(&input.label)
        .bind(&input.recipient_name)
        .bind(&input.phone)
        .bind(&input.city)
        .bind(&input.district)
        .bind(&input.khoroo)
        .bind(&input.address_line)
        .bind(&input.notes)
        .bind(existing == 0)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into())
    }

    /// Update an address's fields. The default flag is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't belong to the user.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            UPDATE shop.address
            SET label = $3, recipient_name = $4, phone = $5, city = $6, district = $7,
                khoroo = $8, address_line = $9, notes = $10, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(&input.label)
        .bind(&input.recipient_name)
        .bind(&input.phone)
        .bind(&input.city)
        .bind(&input.district)
        .bind(&input.khoroo)
        .bind(&input.address_line)
        .bind(&input.notes)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete an address. Deleting the default promotes the newest remaining one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't belong to the user.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        let was_default: bool = sqlx::query_scalar(
            "DELETE FROM shop.address WHERE id = $1 AND user_id = $2 RETURNING is_default",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if was_default {
            promote_newest(&mut tx, user_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Make an address the user's default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't belong to the user.
    pub async fn set_default(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, user_id).await?;

        // Clear first; the partial unique index allows one default per user.
        sqlx::query(
            "UPDATE shop.address SET is_default = FALSE WHERE user_id = $1 AND is_default",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, AddressRow>(&format!(
            r"
            UPDATE shop.address SET is_default = TRUE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        tx.commit().await?;
        Ok(row.into())
    }
}

/// Serialize default-moving writes per user on the user row.
async fn lock_owner(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("SELECT id FROM shop.user WHERE id = $1 FOR NO KEY UPDATE")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn promote_newest(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE shop.address SET is_default = TRUE, updated_at = NOW()
        WHERE id = (
            SELECT id FROM shop.address
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
        )
        ",
    )
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
