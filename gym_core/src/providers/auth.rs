//! Authentication contract.

use crate::{Profile, Result, UserPlan};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_anonymous: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<User>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<User>;
    async fn sign_out(&self) -> Result<()>;
    async fn get_user(&self) -> Result<Option<User>>;

    /// Access token for API requests
    async fn get_token(&self) -> Result<Option<String>>;

    /// Auth state change notifications. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> watch::Receiver<Option<User>>;

    async fn get_profile(&self) -> Result<Option<Profile>>;
}

/// Plan of the signed-in user; anonymous users and failed lookups count as free.
pub async fn current_plan(auth: &dyn AuthProvider) -> UserPlan {
    match auth.get_profile().await {
        Ok(Some(profile)) => profile.plan,
        Ok(None) => UserPlan::Free,
        Err(e) => {
            tracing::warn!("Profile lookup failed, assuming free plan: {}", e);
            UserPlan::Free
        }
    }
}

/// Auth-state channel for adapters to back [`AuthProvider::subscribe`] with.
#[derive(Debug)]
pub struct AuthBroadcast {
    tx: watch::Sender<Option<User>>,
}

impl AuthBroadcast {
    pub fn new(initial: Option<User>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Publish a new state. Subscribers are only woken when it actually changed.
    pub fn publish(&self, user: Option<User>) {
        self.tx.send_if_modified(|current| {
            if *current == user {
                false
            } else {
                *current = user;
                true
            }
        });
    }

    pub fn current(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for AuthBroadcast {
    fn default() -> Self {
        Self::new(None)
    }
}
