use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// One recorded action, ready for an [`AuditSink`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor_id: i64,
    /// Dotted action name such as `"file.upload"`.
    pub action: String,
    /// Kind of the acted-on row: `"file"`, `"folder"`, `"share"`.
    pub target_type: String,
    pub target_id: i64,
    /// Structured payload, usually a serialized event enum.
    pub details: Option<serde_json::Value>,
}

/// Destination for audit events.
///
/// Sink failures must never fail the operation being audited; callers log
/// the failure and continue.
#[async_trait]
pub trait AuditSink: Send + Sync + std::fmt::Debug + 'static {
    async fn record(&self, event: &AuditEvent) -> AppResult<()>;
}
