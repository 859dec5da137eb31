//! Keeps each book's `reviews` counter equal to its number of live reviews.
//!
//! The hooks run inside the same store transaction as the review write they
//! accompany, so the review and the counter change commit or roll back
//! together.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shelf_db::{books, RecordId, Store, StoreError, Transaction};
use shelf_kernel::DomainError;
use time::OffsetDateTime;

#[derive(Debug, Clone, Default)]
pub struct ConsistencyCoordinator {
    skipped_syncs: Arc<AtomicU64>,
}

impl ConsistencyCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A review is being added to `book_id`. Fails, and so aborts the
    /// transaction, unless the book exists and is live.
    pub async fn on_review_created(
        &self,
        tx: &mut Transaction,
        book_id: RecordId,
    ) -> Result<u32, StoreError> {
        let count = books::increment_reviews(&mut **tx, book_id, OffsetDateTime::now_utc())
            .await?
            .ok_or(StoreError::Missing {
                collection: "book",
                id: book_id,
            })?;

        tracing::debug!(book_id = %book_id, reviews = count, "review counter incremented");
        Ok(count)
    }

    /// A review of `book_id` was soft-deleted. A missing book row does not
    /// fail the deletion; the skipped sync is logged and counted instead.
    pub async fn on_review_deleted(
        &self,
        tx: &mut Transaction,
        book_id: RecordId,
    ) -> Result<Option<u32>, StoreError> {
        let count = books::decrement_reviews(&mut **tx, book_id, OffsetDateTime::now_utc()).await?;

        match count {
            Some(count) => {
                tracing::debug!(book_id = %book_id, reviews = count, "review counter decremented");
            }
            None => {
                let skipped = self.skipped_syncs.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    book_id = %book_id,
                    skipped_syncs = skipped,
                    "review deleted but its book is gone, counter not decremented"
                );
            }
        }
        Ok(count)
    }

    /// Number of decrements skipped since startup.
    pub fn skipped_syncs(&self) -> u64 {
        self.skipped_syncs.load(Ordering::Relaxed)
    }

    /// Recompute a book's counter from its live reviews. Returns the stored
    /// value before and after.
    pub async fn reconcile(&self, store: &Store, book_id: RecordId) -> Result<(u32, u32), DomainError> {
        let mut tx = store.begin().await?;

        let before = books::find(&mut *tx, book_id)
            .await?
            .map(|book| book.reviews)
            .ok_or_else(|| DomainError::not_found("Book not found."))?;
        let after = books::recount_reviews(&mut *tx, book_id, OffsetDateTime::now_utc())
            .await?
            .ok_or_else(|| DomainError::not_found("Book not found."))?;

        tx.commit().await.map_err(StoreError::from)?;

        if before != after {
            tracing::warn!(book_id = %book_id, before, after, "review counter drift repaired");
        } else {
            tracing::info!(book_id = %book_id, reviews = after, "review counter already in step");
        }
        Ok((before, after))
    }
}
