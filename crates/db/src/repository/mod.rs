//! Row-level access to the three collections.
//!
//! Every function runs exactly one statement against any SQLite executor: pass
//! `store.pool()` for a standalone read or write, or `&mut *tx` to take part in
//! a [`crate::Transaction`].

pub mod books;
pub mod reviews;
pub mod users;

use crate::error::StoreError;
use crate::records::RecordId;

fn record_id(collection: &'static str, raw: &str) -> Result<RecordId, StoreError> {
    raw.parse()
        .map_err(|error| StoreError::corrupt(collection, format!("bad id '{raw}': {error}")))
}

fn count(collection: &'static str, value: i64) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::corrupt(collection, format!("count {value} out of range")))
}
