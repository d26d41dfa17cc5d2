//! User directory (the relational store stand-in used by routes).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use zap_core::{AppError, AppResult};

/// Identifier of a user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl User {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Lookup of users by email.
pub trait UserDirectory: Send + Sync {
    fn find_by_email(&self, email: &str) -> Option<User>;
    fn insert(&self, user: User);
}

impl<S> UserDirectory for Arc<S>
where
    S: UserDirectory + ?Sized,
{
    fn find_by_email(&self, email: &str) -> Option<User> {
        (**self).find_by_email(email)
    }

    fn insert(&self, user: User) {
        (**self).insert(user)
    }
}

/// In-memory directory for tests/dev. Emails match case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<HashMap<String, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find_by_email(&self, email: &str) -> Option<User> {
        let map = self.inner.read().ok()?;
        map.get(&email.to_ascii_lowercase()).cloned()
    }

    fn insert(&self, user: User) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(user.email.to_ascii_lowercase(), user);
        }
    }
}

/// Fetch a user or fail with `NotFoundError`.
pub fn get_user_by_email(directory: &dyn UserDirectory, email: &str) -> AppResult<User> {
    directory
        .find_by_email(email)
        .ok_or_else(|| AppError::not_found(format!("User with email {email} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zap_core::ErrorKind;

    #[test]
    fn lookup_is_case_insensitive() {
        let dir = InMemoryUserDirectory::new();
        let user = User::new("Ada@Example.com", "Ada");
        dir.insert(user.clone());
        assert_eq!(get_user_by_email(&dir, "ada@example.com").unwrap(), user);
    }

    #[test]
    fn missing_user_is_not_found() {
        let dir = InMemoryUserDirectory::new();
        let err = get_user_by_email(&dir, "x@y.com").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "User with email x@y.com not found");
    }
}
