use crate::error::AppError;

/// Result alias used across the workspace.
pub type AppResult<T> = Result<T, AppError>;
