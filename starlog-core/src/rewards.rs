//! Reward catalog and purchases.
//!
//! A purchase is checked in a fixed order: the reward must exist, must not
//! be cooling down, and must be affordable. On success the reward is locked
//! for the configured cooldown (24 hours by default) and a purchase record
//! is appended. The star balance itself is derived; see
//! [`analytics::balance`](crate::analytics::balance).

use crate::clock::Clock;
use crate::config::RewardsConfig;
use crate::error::{Error, Result};
use crate::observable::Observable;
use crate::storage::{self, keys, KeyValueStore};
use crate::types::{PurchaseRecord, Reward, RewardDraft, RewardState};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Rewards a fresh catalog starts with.
pub fn predefined_rewards() -> Vec<Reward> {
    [
        ("1", "Night Out", "🎉", "Enjoy a night out", 100),
        ("2", "Takeaway Meal", "🍕", "Order your favorite food", 50),
        ("3", "Movie Night", "🎬", "Cinema or streaming treat", 75),
        ("4", "Coffee Treat", "☕", "Premium coffee break", 25),
        ("5", "Gaming Session", "🎮", "Guilt-free gaming time", 60),
        ("6", "Shopping Spree", "🛍️", "Treat yourself shopping", 150),
        ("7", "Dessert Special", "🍰", "Sweet indulgence", 40),
        ("8", "Spa Day", "💆", "Relaxation and self-care", 200),
    ]
    .into_iter()
    .map(|(id, name, emoji, description, star_cost)| Reward {
        id: id.to_string(),
        name: name.to_string(),
        emoji: emoji.to_string(),
        description: description.to_string(),
        star_cost,
        image: None,
        cooldown_ends_at: None,
    })
    .collect()
}

/// Classify a reward for display. Cooldown wins over locked, locked over affordable.
pub fn reward_state(reward: &Reward, balance: i64, now: DateTime<Utc>) -> RewardState {
    if reward.is_on_cooldown(now) {
        RewardState::Cooldown
    } else if balance < reward.star_cost {
        RewardState::Locked
    } else {
        RewardState::Affordable
    }
}

/// Time left before the reward can be bought again (zero if available).
pub fn cooldown_remaining(reward: &Reward, now: DateTime<Utc>) -> Duration {
    match reward.cooldown_ends_at {
        Some(until) if now < until => until - now,
        _ => Duration::zero(),
    }
}

pub struct RewardCatalog {
    rewards: Observable<Vec<Reward>>,
    purchases: Observable<Vec<PurchaseRecord>>,
    clock: Arc<dyn Clock>,
    config: RewardsConfig,
}

impl RewardCatalog {
    /// Load the catalog and purchase history, mirroring both to storage.
    ///
    /// A catalog that was never stored starts from [`predefined_rewards`]
    /// when `seed_defaults` is on.
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: RewardsConfig,
    ) -> Self {
        let fallback = if config.seed_defaults {
            predefined_rewards()
        } else {
            Vec::new()
        };
        let rewards: Vec<Reward> = storage::load(store.as_ref(), keys::REWARDS, fallback);
        let purchases: Vec<PurchaseRecord> =
            storage::load(store.as_ref(), keys::PURCHASES, Vec::new());

        let mut rewards = Observable::new(rewards);
        rewards.subscribe(storage::mirror_to(store.clone(), keys::REWARDS));

        let mut purchases = Observable::new(purchases);
        purchases.subscribe(storage::mirror_to(store, keys::PURCHASES));

        Self {
            rewards,
            purchases,
            clock,
            config,
        }
    }

    pub fn list(&self) -> &[Reward] {
        self.rewards.get()
    }

    pub fn get(&self, id: &str) -> Option<&Reward> {
        self.rewards.get().iter().find(|r| r.id == id)
    }

    pub fn purchases(&self) -> &[PurchaseRecord] {
        self.purchases.get()
    }

    pub fn state_of(&self, reward: &Reward, balance: i64) -> RewardState {
        reward_state(reward, balance, self.clock.now())
    }

    /// Buy `reward_id` with `available` stars.
    pub fn purchase(&mut self, reward_id: &str, available: i64) -> Result<PurchaseRecord> {
        let now = self.clock.now();
        let reward = self
            .get(reward_id)
            .ok_or_else(|| Error::RewardNotFound(reward_id.to_string()))?;

        if let Some(until) = reward.cooldown_ends_at.filter(|until| now < *until) {
            return Err(Error::OnCooldown {
                reward_id: reward.id.clone(),
                until,
            });
        }

        if available < reward.star_cost {
            return Err(Error::InsufficientFunds {
                needed: reward.star_cost,
                available,
            });
        }

        let cooldown_ends_at = now + self.config.cooldown();
        let record = PurchaseRecord {
            id: Uuid::new_v4().to_string(),
            reward_id: reward.id.clone(),
            reward_name: reward.name.clone(),
            stars_cost: reward.star_cost,
            purchased_at: now,
            cooldown_ends_at,
        };

        self.rewards.update(|list| {
            if let Some(r) = list.iter_mut().find(|r| r.id == reward_id) {
                r.cooldown_ends_at = Some(cooldown_ends_at);
            }
        });
        self.purchases.update(|history| history.push(record.clone()));

        tracing::info!(
            reward_id,
            stars_cost = record.stars_cost,
            cooldown_ends_at = %cooldown_ends_at,
            "Reward purchased"
        );
        Ok(record)
    }

    /// Validate and prepend a new reward.
    ///
    /// The cost must be a finite whole number and strictly positive, unless
    /// the description contains the configured override phrase (any case),
    /// in which case zero and negative costs are accepted as given.
    pub fn add_reward(&mut self, draft: RewardDraft) -> Result<Reward> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("reward must have a title".to_string()));
        }

        let cost = match draft.star_cost {
            Some(cost) if cost.is_finite() => cost,
            _ => {
                return Err(Error::Validation(
                    "star cost must be provided".to_string(),
                ))
            }
        };
        // i64::MAX as f64 rounds up to 2^63, the first value that does not fit
        if cost.fract() != 0.0 || cost.abs() >= i64::MAX as f64 {
            return Err(Error::Validation(
                "star cost must be a whole number".to_string(),
            ));
        }
        let star_cost = cost as i64;

        let description = draft.description.unwrap_or_default();
        let allow_non_positive = description
            .to_lowercase()
            .contains(&self.config.override_phrase.to_lowercase());

        if !allow_non_positive && star_cost <= 0 {
            return Err(Error::Validation(
                "star cost must be a positive number".to_string(),
            ));
        }

        let reward = Reward {
            id: draft
                .id
                .unwrap_or_else(|| format!("r-{}", Uuid::new_v4().simple())),
            name: name.to_string(),
            emoji: draft.emoji.unwrap_or_default(),
            description,
            star_cost,
            image: draft.image,
            cooldown_ends_at: None,
        };

        tracing::info!(reward_id = %reward.id, star_cost, "Reward added");
        self.rewards.update(|list| list.insert(0, reward.clone()));
        Ok(reward)
    }

    pub fn clear_purchase_history(&mut self) {
        tracing::info!(
            count = self.purchases.get().len(),
            "Clearing purchase history"
        );
        self.purchases.set(Vec::new());
    }
}
