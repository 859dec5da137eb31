use shelf_kernel::DomainError;
use thiserror::Error;

use crate::records::RecordId;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A UNIQUE index rejected the write.
    #[error("{collection} with {field} '{value}' already exists")]
    Duplicate {
        collection: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{collection} '{id}' does not exist")]
    Missing {
        collection: &'static str,
        id: RecordId,
    },

    /// A stored row no longer decodes into its record type.
    #[error("corrupt {collection} row: {reason}")]
    Corrupt {
        collection: &'static str,
        reason: String,
    },

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub(crate) fn corrupt(collection: &'static str, reason: impl ToString) -> Self {
        Self::Corrupt {
            collection,
            reason: reason.to_string(),
        }
    }

    /// Fill in the colliding value of a [`StoreError::Duplicate`], which SQLite
    /// does not report.
    pub(crate) fn naming(self, value_of: impl FnOnce(&str) -> String) -> Self {
        match self {
            Self::Duplicate {
                collection, field, ..
            } => Self::Duplicate {
                collection,
                field,
                value: value_of(field),
            },
            other => other,
        }
    }
}

/// `(collection, field)` behind a message such as
/// `UNIQUE constraint failed: users.phone`.
fn unique_target(message: &str) -> Option<(&'static str, &'static str)> {
    let column = message.split("UNIQUE constraint failed: ").nth(1)?;
    let target = match column.trim() {
        "users.email" => ("user", "email"),
        "users.phone" => ("user", "phone"),
        "users.id" => ("user", "id"),
        "books.title" => ("book", "title"),
        "books.isbn" => ("book", "ISBN"),
        "books.id" => ("book", "id"),
        "reviews.id" => ("review", "id"),
        _ => return None,
    };
    Some(target)
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            if db_error.is_unique_violation() {
                if let Some((collection, field)) = unique_target(db_error.message()) {
                    return Self::Duplicate {
                        collection,
                        field,
                        value: String::new(),
                    };
                }
            }
        }
        Self::Database(error)
    }
}

impl From<StoreError> for DomainError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate { field, .. } => {
                let message = error.to_string();
                DomainError::conflict(field, message)
            }
            StoreError::Missing { .. } => DomainError::not_found(error.to_string()),
            other => {
                tracing::error!(error = %other, "store failure");
                DomainError::Internal(other.into())
            }
        }
    }
}
