mod service;

pub use service::TrashService;
