//! Interstitial frequency policy.
//!
//! Counts qualifying clicks in a small state file and shows an interstitial
//! every `clicks_between_ads` clicks. Premium users are never counted.
//!
//! The `gymlog` terminal front end has no ad surface. App shells that embed
//! `gym_core` with a real [`AdProvider`] build a scheduler with
//! [`AdScheduler::from_config`] and call [`AdScheduler::record_click`] on
//! every qualifying tap.

use crate::local_storage::AD_CLICKS_FILE;
use crate::providers::ads::show_interstitial_nonfatal;
use crate::providers::{AdConfig, AdProvider};
use crate::{state, Config, Error, Result, UserPlan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
struct ClickCounter {
    count: u32,
}

/// What happened on a recorded click
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdOutcome {
    /// Premium plan, nothing counted
    Skipped,
    /// Click counted; value is the running count
    Counted(u32),
    /// Threshold reached and an interstitial was attempted
    Shown { displayed: bool },
}

pub struct AdScheduler {
    provider: Arc<dyn AdProvider>,
    config: AdConfig,
    counter_path: PathBuf,
    initialized: OnceCell<bool>,
}

impl AdScheduler {
    pub fn new(provider: Arc<dyn AdProvider>, config: AdConfig, counter_path: PathBuf) -> Self {
        Self {
            provider,
            config,
            counter_path,
            initialized: OnceCell::new(),
        }
    }

    /// `[ads]` settings from `config`, counter kept next to the other data files
    pub fn from_config(provider: Arc<dyn AdProvider>, config: &Config) -> Self {
        Self::new(
            provider,
            config.ads.clone(),
            config.data.data_dir.join(AD_CLICKS_FILE),
        )
    }

    /// Initialize the provider once. Later calls return the first result.
    pub async fn ensure_initialized(&self) -> bool {
        *self
            .initialized
            .get_or_init(|| async {
                match self.provider.initialize().await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!("Ad provider failed to initialize: {}", e);
                        false
                    }
                }
            })
            .await
    }

    pub fn clicks(&self) -> Result<u32> {
        Ok(state::load_or_default::<ClickCounter>(&self.counter_path)?.count)
    }

    pub async fn record_click(&self, plan: UserPlan) -> Result<AdOutcome> {
        if plan == UserPlan::Premium {
            return Ok(AdOutcome::Skipped);
        }

        self.ensure_initialized().await;

        let threshold = self.config.clicks_between_ads.max(1);
        let ready = self.provider.is_ready();
        let path = self.counter_path.clone();
        let (count, due) = tokio::task::spawn_blocking(move || {
            state::update_json(&path, |counter: &mut ClickCounter| {
                let count = counter.count.saturating_add(1);
                let due = count >= threshold && ready;
                counter.count = if due { 0 } else { count };
                Ok((count, due))
            })
        })
        .await
        .map_err(|e| Error::Other(format!("ad counter task failed: {}", e)))??;

        if !due {
            return Ok(AdOutcome::Counted(count));
        }

        let displayed = show_interstitial_nonfatal(self.provider.as_ref()).await;
        tracing::debug!("Interstitial after {} clicks (displayed: {})", count, displayed);
        Ok(AdOutcome::Shown { displayed })
    }
}
