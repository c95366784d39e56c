use uuid::Uuid;

use cirrus_entity::User;

/// The identity an owner-scoped operation runs under.
///
/// There is no ambient session. Callers build a context per request from an
/// already-authenticated user and every service call that touches owned
/// data takes one; sharing a context between requests is never necessary
/// and never assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: i64,
    pub user_uuid: Uuid,
}

impl RequestContext {
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            user_uuid: user.uuid,
        }
    }
}
