//! Catalog store: book records, their uniqueness rules and soft deletion.

use shelf_db::{books, reviews, Book, RecordId, Store, StoreError};
use shelf_kernel::{settings::EmptyListPolicy, DomainError};
use time::OffsetDateTime;

use super::models::{BookDetails, BookSummary, CreateBook, Subcategories, UpdateBook};
use crate::utils::{list_result, parse_calendar_date, parse_id, present, subcategories};

#[derive(Clone)]
pub struct CatalogStore {
    store: Store,
    empty_list: EmptyListPolicy,
}

impl CatalogStore {
    pub fn new(store: Store, empty_list: EmptyListPolicy) -> Self {
        Self { store, empty_list }
    }

    /// Create a book owned by `input.user_id`, or by `caller` when the body
    /// names no owner.
    pub async fn create(&self, caller: RecordId, input: CreateBook) -> Result<Book, DomainError> {
        let title = present(input.title);
        let excerpt = present(input.excerpt);
        let isbn = present(input.isbn);
        let category = present(input.category);
        let subcategory = input
            .subcategory
            .map(Subcategories::into_vec)
            .and_then(subcategories);
        let released_at = present(input.released_at);

        let missing: Vec<(&str, &str)> = [
            ("title", title.is_none()),
            ("excerpt", excerpt.is_none()),
            ("ISBN", isbn.is_none()),
            ("category", category.is_none()),
            ("subcategory", subcategory.is_none()),
            ("releasedAt", released_at.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(field, _)| (field, "required"))
        .collect();

        let (Some(title), Some(excerpt), Some(isbn), Some(category), Some(subcategory), Some(released_at)) =
            (title, excerpt, isbn, category, subcategory, released_at)
        else {
            return Err(DomainError::invalid_fields("All fields are mandatory.", &missing));
        };

        let owner = match present(input.user_id) {
            Some(raw) => parse_id(&raw, "userId")?,
            None => caller,
        };
        let released_at = parse_calendar_date(&released_at, "releasedAt")?;

        let now = OffsetDateTime::now_utc();
        let book = Book {
            id: RecordId::new(),
            title,
            excerpt,
            user_id: owner,
            isbn,
            category,
            subcategory,
            reviews: 0,
            is_deleted: false,
            deleted_at: None,
            released_at,
            created_at: now,
            updated_at: now,
        };

        books::insert(self.store.pool(), &book)
            .await
            .map_err(|error| match error {
                StoreError::Missing {
                    collection: "user", ..
                } => DomainError::not_found("User not found."),
                other => other.into(),
            })?;

        tracing::info!(book_id = %book.id, owner = %owner, "book created");
        Ok(book)
    }

    /// Summaries of every live book, oldest first.
    pub async fn list(&self) -> Result<Vec<BookSummary>, DomainError> {
        let books: Vec<BookSummary> = books::list_live(self.store.pool())
            .await?
            .iter()
            .map(BookSummary::from)
            .collect();

        list_result(books, self.empty_list, "books")
    }

    pub async fn get(&self, raw_id: &str) -> Result<BookDetails, DomainError> {
        let id = parse_id(raw_id, "bookId")?;

        let book = books::find(self.store.pool(), id)
            .await?
            .filter(Book::is_live)
            .ok_or_else(|| DomainError::not_found("Book not found."))?;
        let reviews_data = reviews::list_live_for_book(self.store.pool(), id).await?;

        Ok(BookDetails { book, reviews_data })
    }

    /// Lookup that also sees soft-deleted books. Not routed.
    pub async fn get_including_deleted(&self, id: RecordId) -> Result<Book, DomainError> {
        books::find(self.store.pool(), id)
            .await?
            .ok_or_else(|| DomainError::not_found("Book not found."))
    }

    pub async fn update(&self, raw_id: &str, patch: UpdateBook) -> Result<Book, DomainError> {
        let id = parse_id(raw_id, "bookId")?;

        let title = non_empty(patch.title, "title")?;
        let isbn = non_empty(patch.isbn, "ISBN")?;
        let category = non_empty(patch.category, "category")?;
        let subcategory = match patch.subcategory {
            Some(values) => Some(subcategories(values.into_vec()).ok_or_else(|| {
                DomainError::invalid_fields(
                    "subcategory cannot be empty.",
                    &[("subcategory", "empty")],
                )
            })?),
            None => None,
        };
        let released_at = match non_empty(patch.released_at, "releasedAt")? {
            Some(raw) => Some(parse_calendar_date(&raw, "releasedAt")?),
            None => None,
        };
        let changes = books::BookChanges {
            title,
            excerpt: patch.excerpt.map(|excerpt| excerpt.trim().to_string()),
            isbn,
            category,
            subcategory,
            released_at,
        };

        let updated = books::update_live(self.store.pool(), id, &changes, OffsetDateTime::now_utc())
            .await?
            .ok_or_else(|| DomainError::not_found("Book not found."))?;

        tracing::info!(book_id = %id, "book updated");
        Ok(updated)
    }

    /// Mark a live book deleted. Its reviews stay addressable.
    pub async fn soft_delete(&self, raw_id: &str) -> Result<Book, DomainError> {
        let id = parse_id(raw_id, "bookId")?;

        let deleted = books::soft_delete(self.store.pool(), id, OffsetDateTime::now_utc())
            .await?
            .ok_or_else(|| DomainError::not_found("Book not found."))?;

        tracing::info!(book_id = %id, "book soft-deleted");
        Ok(deleted)
    }
}

/// A patched required field may be absent, but not blank.
fn non_empty(value: Option<String>, field: &str) -> Result<Option<String>, DomainError> {
    match value {
        None => Ok(None),
        Some(value) => present(Some(value)).map(Some).ok_or_else(|| {
            DomainError::invalid_fields(format!("{} cannot be empty.", field), &[(field, "empty")])
        }),
    }
}
