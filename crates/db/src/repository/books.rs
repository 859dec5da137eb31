use sqlx::{Executor, Sqlite};
use time::{Date, OffsetDateTime};

use super::{count, record_id};
use crate::error::StoreError;
use crate::records::{Book, RecordId};

const COLLECTION: &str = "book";

#[derive(sqlx::FromRow)]
struct BookRow {
    id: String,
    title: String,
    excerpt: String,
    user_id: String,
    isbn: String,
    category: String,
    subcategory: String,
    reviews: i64,
    is_deleted: bool,
    deleted_at: Option<OffsetDateTime>,
    released_at: Date,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<BookRow> for Book {
    type Error = StoreError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let subcategory = serde_json::from_str(&row.subcategory)
            .map_err(|error| StoreError::corrupt(COLLECTION, error))?;

        Ok(Book {
            id: record_id(COLLECTION, &row.id)?,
            title: row.title,
            excerpt: row.excerpt,
            user_id: record_id(COLLECTION, &row.user_id)?,
            isbn: row.isbn,
            category: row.category,
            subcategory,
            reviews: count(COLLECTION, row.reviews)?,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            released_at: row.released_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Field changes for [`update_live`]. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct BookChanges {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<Vec<String>>,
    pub released_at: Option<Date>,
}

fn subcategory_json(values: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(values).map_err(|error| StoreError::corrupt(COLLECTION, error))
}

/// Insert a new book. Its owner must exist; title and ISBN collide with every
/// stored book, soft-deleted ones included.
pub async fn insert<'c, E>(executor: E, book: &Book) -> Result<(), StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let subcategory = subcategory_json(&book.subcategory)?;

    let result = sqlx::query(
        r#"
        INSERT INTO books (
            id, title, excerpt, user_id, isbn, category, subcategory,
            reviews, is_deleted, deleted_at, released_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(book.id.to_string())
    .bind(&book.title)
    .bind(&book.excerpt)
    .bind(book.user_id.to_string())
    .bind(&book.isbn)
    .bind(&book.category)
    .bind(subcategory)
    .bind(i64::from(book.reviews))
    .bind(book.is_deleted)
    .bind(book.deleted_at)
    .bind(book.released_at)
    .bind(book.created_at)
    .bind(book.updated_at)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(error)) if error.is_foreign_key_violation() => {
            Err(StoreError::Missing {
                collection: "user",
                id: book.user_id,
            })
        }
        Err(error) => Err(StoreError::from(error).naming(|field| match field {
            "title" => book.title.clone(),
            "ISBN" => book.isbn.clone(),
            _ => book.id.to_string(),
        })),
    }
}

/// Book by id, whether or not it is soft-deleted.
pub async fn find<'c, E>(executor: E, id: RecordId) -> Result<Option<Book>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?
        .map(Book::try_from)
        .transpose()
}

/// Live books in insertion order.
pub async fn list_live<'c, E>(executor: E) -> Result<Vec<Book>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE is_deleted = 0 ORDER BY rowid")
        .fetch_all(executor)
        .await?
        .into_iter()
        .map(Book::try_from)
        .collect()
}

/// Apply `changes` to a live book in one statement. `None` when no live book
/// has that id. The review counter is never touched here.
pub async fn update_live<'c, E>(
    executor: E,
    id: RecordId,
    changes: &BookChanges,
    at: OffsetDateTime,
) -> Result<Option<Book>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let subcategory = changes
        .subcategory
        .as_deref()
        .map(subcategory_json)
        .transpose()?;

    let row = sqlx::query_as::<_, BookRow>(
        r#"
        UPDATE books SET
            title = COALESCE(?, title),
            excerpt = COALESCE(?, excerpt),
            isbn = COALESCE(?, isbn),
            category = COALESCE(?, category),
            subcategory = COALESCE(?, subcategory),
            released_at = COALESCE(?, released_at),
            updated_at = ?
        WHERE id = ? AND is_deleted = 0
        RETURNING *
        "#,
    )
    .bind(changes.title.as_deref())
    .bind(changes.excerpt.as_deref())
    .bind(changes.isbn.as_deref())
    .bind(changes.category.as_deref())
    .bind(subcategory)
    .bind(changes.released_at)
    .bind(at)
    .bind(id.to_string())
    .fetch_optional(executor)
    .await
    .map_err(|error| {
        StoreError::from(error).naming(|field| match field {
            "title" => changes.title.clone().unwrap_or_default(),
            "ISBN" => changes.isbn.clone().unwrap_or_default(),
            _ => id.to_string(),
        })
    })?;

    row.map(Book::try_from).transpose()
}

/// Mark a live book deleted. `None` when no live book has that id.
pub async fn soft_delete<'c, E>(
    executor: E,
    id: RecordId,
    at: OffsetDateTime,
) -> Result<Option<Book>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    sqlx::query_as::<_, BookRow>(
        r#"
        UPDATE books SET is_deleted = 1, deleted_at = ?, updated_at = ?
        WHERE id = ? AND is_deleted = 0
        RETURNING *
        "#,
    )
    .bind(at)
    .bind(at)
    .bind(id.to_string())
    .fetch_optional(executor)
    .await?
    .map(Book::try_from)
    .transpose()
}

/// Atomically add one to a live book's review counter. Returns the new value,
/// or `None` when no live book has that id.
pub async fn increment_reviews<'c, E>(
    executor: E,
    id: RecordId,
    at: OffsetDateTime,
) -> Result<Option<u32>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let reviews: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE books SET reviews = reviews + 1, updated_at = ?
        WHERE id = ? AND is_deleted = 0
        RETURNING reviews
        "#,
    )
    .bind(at)
    .bind(id.to_string())
    .fetch_optional(executor)
    .await?;

    reviews.map(|value| count(COLLECTION, value)).transpose()
}

/// Atomically take one from a book's review counter, stopping at zero. Applies
/// to soft-deleted books too. `None` when the book row is gone.
pub async fn decrement_reviews<'c, E>(
    executor: E,
    id: RecordId,
    at: OffsetDateTime,
) -> Result<Option<u32>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let reviews: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE books SET reviews = MAX(reviews - 1, 0), updated_at = ?
        WHERE id = ?
        RETURNING reviews
        "#,
    )
    .bind(at)
    .bind(id.to_string())
    .fetch_optional(executor)
    .await?;

    reviews.map(|value| count(COLLECTION, value)).transpose()
}

/// Reset a book's counter to its number of live reviews. Returns the new
/// value, or `None` when the book row is gone.
pub async fn recount_reviews<'c, E>(
    executor: E,
    id: RecordId,
    at: OffsetDateTime,
) -> Result<Option<u32>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let reviews: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE books SET
            reviews = (
                SELECT COUNT(*) FROM reviews
                WHERE reviews.book_id = books.id AND reviews.is_deleted = 0
            ),
            updated_at = ?
        WHERE id = ?
        RETURNING reviews
        "#,
    )
    .bind(at)
    .bind(id.to_string())
    .fetch_optional(executor)
    .await?;

    reviews.map(|value| count(COLLECTION, value)).transpose()
}
