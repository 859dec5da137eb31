//! Review ledger: star-rated reviews attached to books.
//!
//! Creating and soft-deleting a review adjusts the book's counter through the
//! [`ConsistencyCoordinator`] in the same store transaction.

use std::ops::RangeInclusive;

use shelf_authz::{guard::ensure_review_author, Subject};
use shelf_db::{reviews, RecordId, Review, Reviewer, Store, StoreError};
use shelf_kernel::{settings::EmptyListPolicy, DomainError};
use time::OffsetDateTime;

use super::models::{CreateReview, UpdateReview};
use crate::consistency::ConsistencyCoordinator;
use crate::utils::{list_result, parse_id, present};

const RATING: RangeInclusive<i64> = 1..=5;

#[derive(Clone)]
pub struct ReviewLedger {
    store: Store,
    coordinator: ConsistencyCoordinator,
    empty_list: EmptyListPolicy,
}

impl ReviewLedger {
    pub fn new(store: Store, coordinator: ConsistencyCoordinator, empty_list: EmptyListPolicy) -> Self {
        Self {
            store,
            coordinator,
            empty_list,
        }
    }

    pub async fn create(&self, author: Reviewer, input: CreateReview) -> Result<Review, DomainError> {
        let (Some(raw_book_id), Some(rating)) = (present(input.book_id), input.rating) else {
            return Err(DomainError::validation("bookId and rating are mandatory."));
        };
        let book_id = parse_id(&raw_book_id, "bookId")?;
        let rating = checked_rating(rating)?;

        let now = OffsetDateTime::now_utc();
        let review = Review {
            id: RecordId::new(),
            book_id,
            reviewed_by: author,
            reviewed_at: now,
            rating,
            review: input.review.map(|text| text.trim().to_string()).unwrap_or_default(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        // The counter write goes first: it takes the write lock and proves the
        // book is live before the review row exists.
        let mut tx = self.store.begin().await?;
        let counter = self
            .coordinator
            .on_review_created(&mut tx, book_id)
            .await
            .map_err(|error| match error {
                StoreError::Missing { .. } => DomainError::not_found("Book not found or deleted."),
                other => other.into(),
            })?;
        reviews::insert(&mut *tx, &review).await?;
        tx.commit().await.map_err(StoreError::from)?;

        tracing::info!(
            review_id = %review.id,
            book_id = %book_id,
            reviewed_by = %review.reviewed_by,
            reviews = counter,
            "review created"
        );
        Ok(review)
    }

    /// Live reviews of a book, oldest first.
    pub async fn list_for_book(&self, raw_book_id: &str) -> Result<Vec<Review>, DomainError> {
        let book_id = parse_id(raw_book_id, "bookId")?;
        let live = reviews::list_live_for_book(self.store.pool(), book_id).await?;
        list_result(live, self.empty_list, "reviews")
    }

    /// Author-only. Ownership is checked before the patch is validated.
    pub async fn update(
        &self,
        subject: &Subject,
        raw_id: &str,
        patch: UpdateReview,
    ) -> Result<Review, DomainError> {
        let id = parse_id(raw_id, "reviewId")?;

        let review = self.live_review(id, "Review not found or deleted.").await?;
        ensure_review_author(subject, &review.reviewed_by, id, "update")?;

        let rating = patch.rating.map(checked_rating).transpose()?;
        let text = patch.review.as_deref().map(str::trim);

        let updated = reviews::update_live(self.store.pool(), id, rating, text, OffsetDateTime::now_utc())
            .await?
            .ok_or_else(|| DomainError::not_found("Review not found or deleted."))?;

        tracing::info!(review_id = %id, subject = %subject.id, "review updated");
        Ok(updated)
    }

    /// Author-only. Decrements the book counter in the same transaction.
    pub async fn soft_delete(&self, subject: &Subject, raw_id: &str) -> Result<Review, DomainError> {
        let id = parse_id(raw_id, "reviewId")?;

        let review = self.live_review(id, "Review not found or already deleted.").await?;
        ensure_review_author(subject, &review.reviewed_by, id, "delete")?;

        let mut tx = self.store.begin().await?;
        let deleted = reviews::soft_delete(&mut *tx, id, OffsetDateTime::now_utc())
            .await?
            .ok_or_else(|| DomainError::not_found("Review not found or already deleted."))?;
        let counter = self.coordinator.on_review_deleted(&mut tx, deleted.book_id).await?;
        tx.commit().await.map_err(StoreError::from)?;

        tracing::info!(
            review_id = %id,
            book_id = %deleted.book_id,
            reviews = ?counter,
            "review soft-deleted"
        );
        Ok(deleted)
    }

    async fn live_review(&self, id: RecordId, missing: &str) -> Result<Review, DomainError> {
        reviews::find(self.store.pool(), id)
            .await?
            .filter(Review::is_live)
            .ok_or_else(|| DomainError::not_found(missing))
    }
}

fn checked_rating(rating: i64) -> Result<u8, DomainError> {
    if !RATING.contains(&rating) {
        return Err(DomainError::invalid_fields(
            "Rating should be between 1 and 5.",
            &[("rating", "out of range")],
        ));
    }
    u8::try_from(rating).map_err(|_| DomainError::validation("Rating should be between 1 and 5."))
}
