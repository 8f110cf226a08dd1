//! Payment contract and the non-fatal calling conventions around it.

use crate::{Result, UserPlan};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Plans that can be purchased. Only premium is sold.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaidPlan {
    Premium,
}

impl From<PaidPlan> for UserPlan {
    fn from(plan: PaidPlan) -> Self {
        match plan {
            PaidPlan::Premium => UserPlan::Premium,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Begin the purchase flow for `plan`
    async fn start_checkout(&self, plan: PaidPlan) -> Result<()>;

    async fn get_status(&self) -> Result<UserPlan>;

    /// Mobile only: re-apply purchases made earlier on this store account.
    /// Other platforms succeed without doing anything or return
    /// [`crate::Error::Unsupported`].
    async fn restore_purchases(&self) -> Result<()>;
}

/// Run a checkout and report the plan the provider reports afterwards.
///
/// Entitlement updates can lag behind the purchase (store webhooks), so the
/// returned plan may still be [`UserPlan::Free`].
pub async fn checkout(provider: &dyn PaymentProvider, plan: PaidPlan) -> Result<UserPlan> {
    provider.start_checkout(plan).await?;
    let status = provider.get_status().await?;
    if status != UserPlan::from(plan) {
        tracing::info!("Checkout finished but plan is still {}", status);
    }
    Ok(status)
}

/// Restore purchases where supported, then read the current plan.
///
/// A failing or unsupported restore is logged and ignored.
pub async fn restore_or_skip(provider: &dyn PaymentProvider) -> Result<UserPlan> {
    if let Err(e) = provider.restore_purchases().await {
        tracing::warn!("Restoring purchases failed, continuing: {}", e);
    }
    provider.get_status().await
}
