//! ============================================================================
//! Reward Reel - Supply Case Opening
//! ============================================================================
//! Opening a case:
//! 1. Deducts one case from inventory immediately (never rolled back)
//! 2. Fills a cosmetic reel with uniform draws from the reward pool
//! 3. Picks the winning slot uniformly inside a narrow band near the end of
//!    the reel and writes an independent uniform reward draw into it
//!
//! The reveal completes after a fixed delay (driven elsewhere); only one
//! reel can spin at a time. The random source is always injected.
//! ============================================================================

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::collection::CollectionState;
use crate::config::ShopConfig;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReelPhase {
    Idle,
    Spinning,
    Revealed,
}

/// One case opening
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelSession {
    pub id: Uuid,
    pub source_container_id: ItemId,
    /// Cosmetic reel; only `sequence[winning_index]` is binding
    pub sequence: Vec<ItemId>,
    pub winning_index: usize,
    pub revealed: bool,
    pub started_at: DateTime<Utc>,
}

impl ReelSession {
    /// The binding reward (hidden from views until `revealed`)
    pub fn reward_id(&self) -> &str {
        &self.sequence[self.winning_index]
    }
}

#[derive(Debug, Clone)]
pub struct RewardReel {
    length: usize,
    band_start: usize,
    band_width: usize,
    session: Option<ReelSession>,
}

impl RewardReel {
    /// Build from config; the winning band must fit inside the reel
    pub fn from_config(config: &ShopConfig) -> ShopResult<Self> {
        config.validate().map_err(ShopError::Config)?;

        Ok(Self {
            length: config.reel_length,
            band_start: config.winning_band_start,
            band_width: config.winning_band_width,
            session: None,
        })
    }

    pub fn phase(&self) -> ReelPhase {
        match &self.session {
            None => ReelPhase::Idle,
            Some(s) if s.revealed => ReelPhase::Revealed,
            Some(_) => ReelPhase::Spinning,
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.phase() == ReelPhase::Spinning
    }

    pub fn session(&self) -> Option<&ReelSession> {
        self.session.as_ref()
    }

    /// Reward of a revealed session
    pub fn revealed_reward(&self) -> Option<&str> {
        self.session
            .as_ref()
            .filter(|s| s.revealed)
            .map(|s| s.reward_id())
    }

    /// Start opening `container_id`. A revealed-but-uncleared session is
    /// replaced; a spinning one blocks.
    pub fn open<R: Rng + ?Sized>(
        &mut self,
        container_id: &str,
        collections: &mut CollectionState,
        catalog: &Catalog,
        rng: &mut R,
    ) -> ShopResult<&ReelSession> {
        if self.is_spinning() {
            return Err(ShopError::AlreadyInProgress("a case is already being opened".into()));
        }

        let container = catalog.require(container_id)?;
        if !container.is_container() {
            return Err(ShopError::InvalidItem {
                id: container_id.to_string(),
                reason: format!("{} is not a supply case", container.category.label()),
            });
        }

        if collections.inventory_count(container_id) == 0 {
            return Err(ShopError::NotFound(container_id.to_string()));
        }

        let pool = catalog.reward_pool();
        if pool.is_empty() {
            return Err(ShopError::EmptyRewardPool);
        }

        // Deducted up front, independent of whether the reveal completes
        collections.remove_from_inventory(container_id);

        let mut sequence: Vec<ItemId> = (0..self.length)
            .map(|_| pool[rng.gen_range(0..pool.len())].id.clone())
            .collect();
        let winning_index = self.band_start + rng.gen_range(0..self.band_width);
        sequence[winning_index] = pool[rng.gen_range(0..pool.len())].id.clone();

        let session = ReelSession {
            id: Uuid::new_v4(),
            source_container_id: container_id.to_string(),
            sequence,
            winning_index,
            revealed: false,
            started_at: Utc::now(),
        };

        info!(
            "Opening {} (reel {}, winning slot {})",
            container_id, session.id, winning_index
        );
        debug!("Reel {} reward: {}", session.id, session.reward_id());

        Ok(&*self.session.insert(session))
    }

    /// spinning -> revealed; returns the reward id
    pub fn complete_reveal(&mut self) -> ShopResult<ItemId> {
        match self.session.as_mut() {
            Some(session) if !session.revealed => {
                session.revealed = true;
                let reward = session.reward_id().to_string();
                info!("Reel {} revealed {}", session.id, reward);
                Ok(reward)
            }
            Some(_) => Err(ShopError::InvalidTransition("reel already revealed".into())),
            None => Err(ShopError::InvalidTransition("no case is being opened".into())),
        }
    }

    /// Clear the reel back to idle. Cancelling a spin does not return the case.
    pub fn reset(&mut self) -> Option<ReelSession> {
        let previous = self.session.take();
        if let Some(session) = &previous {
            if !session.revealed {
                warn!(
                    "Reel {} cancelled mid-reveal; {} stays consumed",
                    session.id, session.source_container_id
                );
            }
        }
        previous
    }
}
