//! Web Push subscriptions.
//!
//! The push client is built lazily from the VAPID configuration, at most once
//! per [`PushService`]. A failed build is not cached, so fixing the
//! configuration and retrying works without a restart.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use validator::Validate;

use zap_core::{AppError, AppResult};

use crate::config::VapidConfig;
use crate::users::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PushKeys {
    #[validate(length(min = 1))]
    pub auth: String,
    #[validate(length(min = 1))]
    pub p256dh: String,
}

/// Browser push subscription as produced by the Push API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PushSubscription {
    #[validate(url)]
    pub endpoint: String,
    #[validate]
    pub keys: PushKeys,
}

/// Input of the subscribe procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SubscribeInput {
    #[validate]
    pub subscription: PushSubscription,
}

/// Acknowledgement returned by subscription procedures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub message: String,
}

impl Ack {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Configured Web Push sender identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPushClient {
    subject: String,
    public_key: String,
    private_key: String,
}

impl WebPushClient {
    pub fn from_config(config: &VapidConfig) -> AppResult<Self> {
        match (&config.public_key, &config.private_key, &config.mail) {
            (Some(public_key), Some(private_key), Some(mail)) => Ok(Self {
                subject: format!("mailto:{mail}"),
                public_key: public_key.clone(),
                private_key: private_key.clone(),
            }),
            _ => Err(AppError::push_notification(concat!(
                "Web Push service is not properly configured. ",
                "Please check your VAPID keys and email settings."
            ))),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

/// Storage for one push subscription per user.
pub trait SubscriptionStore: Send + Sync {
    /// Insert or replace the user's subscription.
    fn upsert(&self, user_id: UserId, subscription: PushSubscription) -> AppResult<()>;
    /// Returns whether a subscription was removed.
    fn remove(&self, user_id: UserId) -> AppResult<bool>;
    fn get(&self, user_id: UserId) -> Option<PushSubscription>;
}

/// In-memory subscription store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    inner: RwLock<HashMap<UserId, PushSubscription>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SubscriptionStore for InMemorySubscriptionStore {
    fn upsert(&self, user_id: UserId, subscription: PushSubscription) -> AppResult<()> {
        let mut map = self.inner.write().map_err(|_| store_poisoned())?;
        map.insert(user_id, subscription);
        Ok(())
    }

    fn remove(&self, user_id: UserId) -> AppResult<bool> {
        let mut map = self.inner.write().map_err(|_| store_poisoned())?;
        Ok(map.remove(&user_id).is_some())
    }

    fn get(&self, user_id: UserId) -> Option<PushSubscription> {
        let map = self.inner.read().ok()?;
        map.get(&user_id).cloned()
    }
}

fn store_poisoned() -> AppError {
    AppError::internal("subscription store lock poisoned")
}

pub struct PushService {
    config: VapidConfig,
    client: OnceCell<WebPushClient>,
    store: Arc<dyn SubscriptionStore>,
}

impl core::fmt::Debug for PushService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PushService")
            .field("initialized", &self.client.initialized())
            .finish()
    }
}

impl PushService {
    pub fn new(config: VapidConfig, store: Arc<dyn SubscriptionStore>) -> Self {
        Self {
            config,
            client: OnceCell::new(),
            store,
        }
    }

    /// The shared client, built on first use.
    pub async fn client(&self) -> AppResult<&WebPushClient> {
        self.client
            .get_or_try_init(|| async {
                let client = WebPushClient::from_config(&self.config)?;
                tracing::info!(subject = client.subject(), "web push client initialized");
                Ok(client)
            })
            .await
    }

    pub async fn subscribe(
        &self,
        user_id: UserId,
        subscription: PushSubscription,
    ) -> AppResult<Ack> {
        self.client().await?;
        self.store.upsert(user_id, subscription)?;
        tracing::debug!(%user_id, "push subscription stored");
        Ok(Ack::new("User subscribed successfully"))
    }

    pub async fn unsubscribe(&self, user_id: UserId) -> AppResult<Ack> {
        self.client().await?;
        if !self.store.remove(user_id)? {
            tracing::debug!(%user_id, "no push subscription to remove");
        }
        Ok(Ack::new("User unsubscribed successfully"))
    }

    pub fn subscription(&self, user_id: UserId) -> Option<PushSubscription> {
        self.store.get(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zap_core::ErrorKind;

    fn subscription(endpoint: &str) -> PushSubscription {
        PushSubscription {
            endpoint: endpoint.to_string(),
            keys: PushKeys {
                auth: "auth".into(),
                p256dh: "p256dh".into(),
            },
        }
    }

    fn service(config: VapidConfig) -> PushService {
        PushService::new(config, Arc::new(InMemorySubscriptionStore::new()))
    }

    #[tokio::test]
    async fn client_is_built_once() {
        let svc = service(VapidConfig::new("pub", "priv", "ops@example.com"));
        let a = svc.client().await.unwrap() as *const WebPushClient;
        let b = svc.client().await.unwrap() as *const WebPushClient;
        assert_eq!(a, b);
        assert_eq!(svc.client().await.unwrap().subject(), "mailto:ops@example.com");
    }

    #[tokio::test]
    async fn missing_vapid_keys_is_push_error() {
        let svc = service(VapidConfig::default());
        let err = svc
            .subscribe(UserId::new(), subscription("https://push.example/1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PushNotification);
        assert!(err.message().starts_with("Web Push service is not properly configured"));
    }

    #[tokio::test]
    async fn subscribe_upserts_per_user() {
        let svc = service(VapidConfig::new("pub", "priv", "ops@example.com"));
        let user = UserId::new();
        svc.subscribe(user, subscription("https://push.example/1")).await.unwrap();
        let ack = svc.subscribe(user, subscription("https://push.example/2")).await.unwrap();
        assert_eq!(ack.message, "User subscribed successfully");
        assert_eq!(svc.subscription(user).unwrap().endpoint, "https://push.example/2");

        let ack = svc.unsubscribe(user).await.unwrap();
        assert_eq!(ack.message, "User unsubscribed successfully");
        assert!(svc.subscription(user).is_none());
    }

    #[test]
    fn subscription_rules() {
        assert!(subscription("https://push.example/1").validate().is_ok());
        assert!(subscription("not a url").validate().is_err());
    }

    #[tokio::test]
    async fn store_failures_are_reported() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        let svc = PushService::new(VapidConfig::new("pub", "priv", "ops@example.com"), store);
        let user = UserId::new();
        let err = svc.subscribe(user, subscription("https://push.example/1")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalServer);
        assert!(svc.unsubscribe(user).await.is_err());
    }
}
