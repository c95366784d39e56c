//! Storage backends and the router that picks one of them at startup.

pub mod backends;
pub mod router;

#[cfg(feature = "local")]
pub use backends::local::LocalObjectStore;
#[cfg(feature = "s3")]
pub use backends::s3::S3ObjectStore;
pub use router::StorageRouter;
