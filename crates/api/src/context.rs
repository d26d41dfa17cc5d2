use crate::session::Session;
use crate::users::UserId;

/// Session context for a request (authenticated user).
///
/// This is immutable and must be present for all RPC procedures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn user_id(&self) -> UserId {
        self.session.user_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
