//! Ownership checks.

use shelf_db::{RecordId, Reviewer};
use shelf_kernel::DomainError;

use crate::session::Subject;

/// Only the author of a review may change it. Guest reviews have no owner and are
/// therefore immutable.
pub fn ensure_review_author(
    subject: &Subject,
    author: &Reviewer,
    review_id: RecordId,
    action: &str,
) -> Result<(), DomainError> {
    match author {
        Reviewer::User(author_id) if *author_id == subject.id => Ok(()),
        _ => {
            tracing::warn!(
                subject = %subject.id,
                review_id = %review_id,
                action,
                "rejected mutation by non-author"
            );
            Err(DomainError::forbidden(format!(
                "you can only {} your own reviews",
                action
            )))
        }
    }
}
