use crate::domain::UserId;

/// Per-request execution context, passed explicitly into every service
/// call. Carries the authenticated user; how that user was authenticated
/// is the outer layer's problem.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub user_id: UserId,
}

impl RequestContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
