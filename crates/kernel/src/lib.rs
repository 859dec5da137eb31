//! Shared kernel for the Shelf catalog service: configuration, the module
//! lifecycle contract, and the domain error taxonomy every layer speaks.

pub mod error;
pub mod module;
pub mod registry;
pub mod settings;

pub use error::DomainError;
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
