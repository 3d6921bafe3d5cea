//! Review rating aggregation.
//!
//! Products carry a denormalised `rating_avg` / `rating_count` pair that is
//! recomputed from the review table whenever a review is added or removed.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Lowest allowed star rating.
pub const MIN_RATING: i16 = 1;
/// Highest allowed star rating.
pub const MAX_RATING: i16 = 5;

/// Returned when a rating is outside `1..=5`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between {MIN_RATING} and {MAX_RATING}, got {0}")]
pub struct InvalidRating(pub i16);

/// Validate a star rating.
///
/// # Errors
///
/// Returns [`InvalidRating`] when outside `1..=5`.
pub const fn validate_rating(rating: i16) -> Result<i16, InvalidRating> {
    if rating < MIN_RATING || rating > MAX_RATING {
        return Err(InvalidRating(rating));
    }
    Ok(rating)
}

/// Aggregate of a product's reviews.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Number of reviews.
    pub count: u32,
    /// Mean rating rounded to one decimal place, zero when there are none.
    pub average: Decimal,
    /// Review counts for 1..=5 stars, index 0 is one star.
    pub distribution: [u32; 5],
}

impl RatingSummary {
    /// Build a summary from raw ratings. Out-of-range values are ignored.
    #[must_use]
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = i16>,
    {
        let mut distribution = [0_u32; 5];
        let mut count = 0_u32;
        let mut sum = 0_i64;

        for rating in ratings {
            let Ok(rating) = validate_rating(rating) else {
                continue;
            };
            let slot = usize::try_from(rating - MIN_RATING).unwrap_or_default();
            distribution[slot] += 1;
            count += 1;
            sum += i64::from(rating);
        }

        let average = if count == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(sum) / Decimal::from(count))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        };

        Self {
            count,
            average,
            distribution,
        }
    }
}

/// Recompute a product's `rating_avg` / `rating_count` from its reviews.
///
/// Run inside the transaction that inserted or deleted the review. The
/// product row is locked first, so concurrent review writers for one product
/// take turns and the last one to commit sees every review.
///
/// # Errors
///
/// Returns `sqlx::Error` if a query fails.
#[cfg(feature = "postgres")]
pub async fn refresh_product_rating(
    conn: &mut sqlx::PgConnection,
    product_id: crate::ProductId,
) -> Result<RatingSummary, sqlx::Error> {
    sqlx::query("SELECT id FROM shop.product WHERE id = $1 FOR NO KEY UPDATE")
        .bind(product_id)
        .execute(&mut *conn)
        .await?;

    let ratings: Vec<i16> =
        sqlx::query_scalar("SELECT rating FROM shop.review WHERE product_id = $1")
            .bind(product_id)
            .fetch_all(&mut *conn)
            .await?;
    let summary = RatingSummary::from_ratings(ratings);

    sqlx::query(
        "UPDATE shop.product SET rating_avg = $2, rating_count = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(product_id)
    .bind(summary.average)
    .bind(i32::try_from(summary.count).unwrap_or(i32::MAX))
    .execute(&mut *conn)
    .await?;

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating() {
        assert_eq!(validate_rating(1), Ok(1));
        assert_eq!(validate_rating(5), Ok(5));
        assert_eq!(validate_rating(0), Err(InvalidRating(0)));
        assert_eq!(validate_rating(6), Err(InvalidRating(6)));
    }

    #[test]
    fn test_summary_empty() {
        let summary = RatingSummary::from_ratings([]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, Decimal::ZERO);
        assert_eq!(summary.distribution, [0; 5]);
    }

    #[test]
    fn test_summary_average_and_distribution() {
        let summary = RatingSummary::from_ratings([5, 4, 4, 1]);
        assert_eq!(summary.count, 4);
        // 14 / 4 = 3.5
        assert_eq!(summary.average, Decimal::new(35, 1));
        assert_eq!(summary.distribution, [1, 0, 0, 2, 1]);
    }

    #[test]
    fn test_summary_rounds_to_one_decimal() {
        // 13 / 3 = 4.333.. → 4.3
        let summary = RatingSummary::from_ratings([5, 4, 4]);
        assert_eq!(summary.average, Decimal::new(43, 1));
        // 14 / 3 = 4.666.. → 4.7
        let summary = RatingSummary::from_ratings([5, 5, 4]);
        assert_eq!(summary.average, Decimal::new(47, 1));
    }

    #[test]
    fn test_summary_ignores_out_of_range() {
        let summary = RatingSummary::from_ratings([5, 0, 9]);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, Decimal::new(50, 1));
    }
}
