use sqlx::{Executor, Sqlite};
use time::OffsetDateTime;

use super::{count, record_id};
use crate::error::StoreError;
use crate::records::{RecordId, Review, Reviewer};

const COLLECTION: &str = "review";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: String,
    book_id: String,
    reviewed_by: String,
    reviewed_at: OffsetDateTime,
    rating: i64,
    review: String,
    is_deleted: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let reviewed_by = Reviewer::try_from(row.reviewed_by)
            .map_err(|error| StoreError::corrupt(COLLECTION, error))?;
        let rating = u8::try_from(row.rating).map_err(|_| {
            StoreError::corrupt(COLLECTION, format!("rating {} out of range", row.rating))
        })?;

        Ok(Review {
            id: record_id(COLLECTION, &row.id)?,
            book_id: record_id(COLLECTION, &row.book_id)?,
            reviewed_by,
            reviewed_at: row.reviewed_at,
            rating,
            review: row.review,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insert a review. The caller establishes that the book exists; see
/// [`super::books::increment_reviews`].
pub async fn insert<'c, E>(executor: E, review: &Review) -> Result<(), StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO reviews (
            id, book_id, reviewed_by, reviewed_at, rating, review,
            is_deleted, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(review.id.to_string())
    .bind(review.book_id.to_string())
    .bind(review.reviewed_by.to_string())
    .bind(review.reviewed_at)
    .bind(i64::from(review.rating))
    .bind(&review.review)
    .bind(review.is_deleted)
    .bind(review.created_at)
    .bind(review.updated_at)
    .execute(executor)
    .await
    .map_err(|error| StoreError::from(error).naming(|_| review.id.to_string()))?;

    Ok(())
}

/// Review by id, whether or not it is soft-deleted.
pub async fn find<'c, E>(executor: E, id: RecordId) -> Result<Option<Review>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, ReviewRow>("SELECT * FROM reviews WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?
        .map(Review::try_from)
        .transpose()
}

/// Live reviews of a book in insertion order.
pub async fn list_live_for_book<'c, E>(executor: E, book_id: RecordId) -> Result<Vec<Review>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, ReviewRow>(
        "SELECT * FROM reviews WHERE book_id = ? AND is_deleted = 0 ORDER BY rowid",
    )
    .bind(book_id.to_string())
    .fetch_all(executor)
    .await?
    .into_iter()
    .map(Review::try_from)
    .collect()
}

pub async fn count_live_for_book<'c, E>(executor: E, book_id: RecordId) -> Result<u32, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let live: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE book_id = ? AND is_deleted = 0")
            .bind(book_id.to_string())
            .fetch_one(executor)
            .await?;
    count(COLLECTION, live)
}

/// Change rating and/or text of a live review. `None` when no live review has
/// that id.
pub async fn update_live<'c, E>(
    executor: E,
    id: RecordId,
    rating: Option<u8>,
    text: Option<&str>,
    at: OffsetDateTime,
) -> Result<Option<Review>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, ReviewRow>(
        r#"
        UPDATE reviews SET
            rating = COALESCE(?, rating),
            review = COALESCE(?, review),
            updated_at = ?
        WHERE id = ? AND is_deleted = 0
        RETURNING *
        "#,
    )
    .bind(rating.map(i64::from))
    .bind(text)
    .bind(at)
    .bind(id.to_string())
    .fetch_optional(executor)
    .await?
    .map(Review::try_from)
    .transpose()
}

/// Mark a live review deleted. `None` when no live review has that id.
pub async fn soft_delete<'c, E>(
    executor: E,
    id: RecordId,
    at: OffsetDateTime,
) -> Result<Option<Review>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, ReviewRow>(
        r#"
        UPDATE reviews SET is_deleted = 1, updated_at = ?
        WHERE id = ? AND is_deleted = 0
        RETURNING *
        "#,
    )
    .bind(at)
    .bind(id.to_string())
    .fetch_optional(executor)
    .await?
    .map(Review::try_from)
    .transpose()
}
