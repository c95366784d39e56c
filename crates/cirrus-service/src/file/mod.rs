mod service;

pub use service::{Download, FileService, UploadRequest};
