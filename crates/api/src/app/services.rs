//! Service wiring shared by all routes.
//!
//! Built once at startup and handed to handlers as an `Arc<AppServices>`;
//! nothing here lives in a global.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::handler::Handler;
use crate::push::{InMemorySubscriptionStore, PushService, SubscriptionStore};
use crate::session::{InMemorySessionStore, SessionStore};
use crate::users::{InMemoryUserDirectory, UserDirectory};

pub struct AppServices {
    config: AppConfig,
    handler: Handler,
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
    push: PushService,
}

impl core::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppServices")
            .field("config", &self.config)
            .field("handler", &self.handler)
            .field("push", &self.push)
            .finish_non_exhaustive()
    }
}

impl AppServices {
    /// In-memory stores (dev/test).
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryUserDirectory::new()),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemorySubscriptionStore::new()),
        )
    }

    pub fn new(
        config: AppConfig,
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
    ) -> Self {
        let handler = Handler::new(config.mode);
        let push = PushService::new(config.vapid.clone(), subscriptions);
        Self {
            config,
            handler,
            users,
            sessions,
            push,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn users(&self) -> &dyn UserDirectory {
        &*self.users
    }

    pub fn sessions(&self) -> Arc<dyn SessionStore> {
        self.sessions.clone()
    }

    pub fn push(&self) -> &PushService {
        &self.push
    }
}
