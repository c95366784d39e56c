use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use cirrus_core::traits::{AuditEvent, AuditSink};

/// Fire-and-forget wrapper around an [`AuditSink`].
///
/// The operation being audited has already succeeded by the time an event
/// is recorded, so a sink failure is logged and swallowed rather than
/// turned into an error the caller would have to unwind.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub async fn record(&self, event: AuditEvent) {
        if let Err(e) = self.sink.record(&event).await {
            warn!(action = %event.action, error = %e, "Audit sink failed; continuing");
        }
    }

    /// Builds and records an entry with a serialized detail payload.
    pub async fn emit<E: Serialize>(
        &self,
        actor_id: i64,
        action: &str,
        target_type: &str,
        target_id: i64,
        details: &E,
    ) {
        let event = AuditEvent {
            actor_id,
            action: action.to_string(),
            target_type: target_type.to_string(),
            target_id,
            details: serde_json::to_value(details).ok(),
        };
        self.record(event).await;
    }
}
