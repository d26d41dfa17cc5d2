//! Session lookup.
//!
//! Sessions are issued elsewhere; this side only resolves a token to the
//! user it belongs to.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::users::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Resolves session tokens.
pub trait SessionStore: Send + Sync {
    /// Active session for `token` at `now`, if any.
    fn lookup(&self, token: &str, now: DateTime<Utc>) -> Option<Session>;
    fn insert(&self, session: Session);
}

impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    fn lookup(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        (**self).lookup(token, now)
    }

    fn insert(&self, session: Session) {
        (**self).insert(session)
    }
}

/// In-memory session store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn lookup(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let map = self.inner.read().ok()?;
        map.get(token).filter(|s| s.is_active(now)).cloned()
    }

    fn insert(&self, session: Session) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(session.token.clone(), session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expired_sessions_are_ignored() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let user_id = UserId::new();
        store.insert(Session {
            token: "live".into(),
            user_id,
            expires_at: now + Duration::minutes(5),
        });
        store.insert(Session {
            token: "stale".into(),
            user_id,
            expires_at: now - Duration::seconds(1),
        });

        assert_eq!(store.lookup("live", now).unwrap().user_id, user_id);
        assert!(store.lookup("stale", now).is_none());
        assert!(store.lookup("missing", now).is_none());
    }
}
