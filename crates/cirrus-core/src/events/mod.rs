//! Structured payloads recorded alongside audit entries.

pub mod resource;
pub mod share;

pub use resource::ResourceEvent;
pub use share::ShareEvent;
