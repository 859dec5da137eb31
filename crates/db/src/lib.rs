//! Storage layer for Shelf: the User, Book and Review records and the SQLite
//! database that persists them.
//!
//! Reads and single-statement writes go straight to [`Store::pool`]; writes
//! that must land together share a [`Transaction`] from [`Store::begin`].

pub mod error;
mod migrations;
pub mod pool;
pub mod records;
pub mod repository;

pub use error::StoreError;
pub use pool::{Store, Transaction};
pub use records::{Address, Book, RecordId, Review, Reviewer, Salutation, User};
pub use repository::{books, reviews, users};
