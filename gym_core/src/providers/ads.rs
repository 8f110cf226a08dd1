//! Advertising contract.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdProvider: Send + Sync {
    /// One-time setup (SDK init, first ad request)
    async fn initialize(&self) -> Result<()>;

    /// Show a full-screen ad; resolves once it is dismissed or failed
    async fn show_interstitial(&self) -> Result<()>;

    /// Whether an ad is loaded and can be shown right now. No side effects.
    fn is_ready(&self) -> bool;
}

/// Ad frequency policy, served by the remote config endpoint
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdConfig {
    #[serde(alias = "clicksBetweenAds", default = "default_clicks_between_ads")]
    pub clicks_between_ads: u32,
}

fn default_clicks_between_ads() -> u32 {
    5
}

impl Default for AdConfig {
    fn default() -> Self {
        Self {
            clicks_between_ads: default_clicks_between_ads(),
        }
    }
}

/// Show an interstitial, swallowing failures. Returns whether it was shown.
pub async fn show_interstitial_nonfatal(provider: &dyn AdProvider) -> bool {
    match provider.show_interstitial().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Interstitial failed: {}", e);
            false
        }
    }
}
