//! Authentication and authorization for Shelf.
//!
//! - [`password`]: salted argon2 hashing of user credentials
//! - [`session`]: issuing and verifying signed, time-bounded session tokens
//! - [`guard`]: ownership checks applied before mutating a record

pub mod guard;
pub mod password;
pub mod session;

pub use session::{IssuedToken, SessionAuthenticator, Subject};
