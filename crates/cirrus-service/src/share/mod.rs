mod access;
mod password;
mod service;
mod token;

pub use access::{ResolvedShare, ResourceSnapshot, ShareAccessService};
pub use password::SharePasswordHasher;
pub use service::{ShareRequest, ShareService, SharedEntry};
pub use token::TokenGenerator;
