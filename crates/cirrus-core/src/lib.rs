//! Shared foundation for the Cirrus Drive workspace: the error type, the
//! layered configuration tree, pagination and sorting primitives, audit
//! event payloads, and the storage backend contract.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
