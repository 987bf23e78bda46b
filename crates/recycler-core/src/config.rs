//! ============================================================================
//! Storefront Configuration
//! ============================================================================
//! Tunables for the reel, the simulated payment gateway and the chat
//! collaborator. Defaults match the storefront's observed timings.
//! Environment overrides:
//! - GEMINI_API_KEY (or API_KEY): chat API key
//! - RECYCLER_CHAT_MODEL: chat model name
//! - RECYCLER_CHAT_TIMEOUT_SECS: chat timeout in seconds
//! ============================================================================

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Number of items on the cosmetic reel
pub const DEFAULT_REEL_LENGTH: usize = 60;

/// First index of the winning band
pub const DEFAULT_WINNING_BAND_START: usize = 50;

/// Width of the winning band (winning index in [50, 55))
pub const DEFAULT_WINNING_BAND_WIDTH: usize = 5;

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopConfig {
    pub reel_length: usize,
    pub winning_band_start: usize,
    pub winning_band_width: usize,
    /// Spin-up pause before the reel starts moving
    pub reveal_lead_in_ms: u64,
    /// Reel animation length until the reward is shown
    pub reveal_duration_ms: u64,
    /// Simulated payment authorization latency
    pub payment_latency_ms: u64,
    /// Extra random latency added on top (0 = fixed latency)
    pub payment_jitter_ms: u64,
    /// Probability in [0, 1] that the simulated gateway declines
    pub payment_decline_rate: f64,
    pub chat_timeout_secs: u64,
    pub chat_model: String,
    #[serde(skip_serializing)]
    pub chat_api_key: Option<String>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            reel_length: DEFAULT_REEL_LENGTH,
            winning_band_start: DEFAULT_WINNING_BAND_START,
            winning_band_width: DEFAULT_WINNING_BAND_WIDTH,
            reveal_lead_in_ms: 100,
            reveal_duration_ms: 6500,
            payment_latency_ms: 3500,
            payment_jitter_ms: 0,
            payment_decline_rate: 0.0,
            chat_timeout_secs: 10,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            chat_api_key: None,
        }
    }
}

impl ShopConfig {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        config.chat_api_key = non_blank("GEMINI_API_KEY").or_else(|| non_blank("API_KEY"));

        if let Some(model) = non_blank("RECYCLER_CHAT_MODEL") {
            config.chat_model = model;
        }

        if let Some(raw) = lookup("RECYCLER_CHAT_TIMEOUT_SECS") {
            match raw.trim().parse() {
                Ok(secs) => config.chat_timeout_secs = secs,
                Err(_) => warn!("Ignoring invalid RECYCLER_CHAT_TIMEOUT_SECS={}", raw),
            }
        }

        config
    }

    /// Check that the winning band fits inside the reel
    pub fn validate(&self) -> Result<(), String> {
        if self.winning_band_width == 0 {
            return Err("winning band width must be at least 1".into());
        }
        if self.winning_band_start + self.winning_band_width > self.reel_length {
            return Err(format!(
                "winning band [{}, {}) does not fit a reel of {}",
                self.winning_band_start,
                self.winning_band_start + self.winning_band_width,
                self.reel_length
            ));
        }
        if !(0.0..=1.0).contains(&self.payment_decline_rate) {
            return Err(format!("decline rate {} outside [0, 1]", self.payment_decline_rate));
        }
        Ok(())
    }

    /// Total simulated reveal time
    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_lead_in_ms.saturating_add(self.reveal_duration_ms))
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }

    /// Zero-latency variant for scripted runs
    pub fn instant() -> Self {
        Self {
            reveal_lead_in_ms: 0,
            reveal_duration_ms: 0,
            payment_latency_ms: 0,
            ..Self::default()
        }
    }
}
