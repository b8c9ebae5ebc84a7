//! Core domain types for starlog
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Task** | A user-defined goal that sessions can be attached to |
//! | **Template** | A named evaluation questionnaire answered after a session |
//! | **Active session** | The single in-progress timed session, if any |
//! | **Session** | A completed, immutable session record with its answers |
//! | **Star** | In-app currency, earned from positive ratings, spent on rewards |
//! | **Reward** | A catalog item bought with stars, then locked for a cooldown |
//! | **Purchase** | An append-only record of one reward purchase |
//!
//! Every type here is mirrored to storage as camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================
// Tasks
// ============================================

/// A user-defined task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier (`task-<uuid>`)
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set when the task is marked complete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Free-form outcome recorded on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub name: String,
    pub goal: Option<String>,
    pub description: Option<String>,
}

/// Field-wise update for a task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub goal: Option<String>,
    pub description: Option<String>,
}

// ============================================
// Evaluation templates
// ============================================

/// One question of an evaluation template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub label: String,
    /// Input kind as understood by the front end (`rating`, `text`, `choice`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the question is answered with a star rating
    pub stars: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// An evaluation questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<Question>,
}

// ============================================
// Sessions
// ============================================

/// Answer to one question: free text, a rating, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
}

impl SessionResponse {
    pub fn rating(rating: i64) -> Self {
        Self {
            answer: None,
            rating: Some(rating),
        }
    }

    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            rating: None,
        }
    }

    /// Rating if it is strictly positive
    pub fn positive_rating(&self) -> Option<i64> {
        self.rating.filter(|r| *r > 0)
    }
}

/// Highest rating a question can be given.
pub const MAX_RATING: i64 = 5;

/// Responses keyed by question id.
pub type Responses = BTreeMap<String, SessionResponse>;

/// The single in-progress session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    pub id: String,
    /// Display name, e.g. "Session 3"
    pub name: String,
    pub template_id: String,
    pub template_name: String,
    pub questions: Vec<Question>,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_duration_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

/// A completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub template_id: String,
    pub template_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Whole seconds between start and end
    pub duration: i64,
    #[serde(default)]
    pub responses: Responses,
    /// Rating given to the template's first question
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_rating: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_duration_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Session {
    /// Stars earned by this session: the sum of its positive ratings,
    /// saturating at `i64::MAX`.
    pub fn stars_earned(&self) -> i64 {
        self.responses
            .values()
            .filter_map(SessionResponse::positive_rating)
            .fold(0i64, i64::saturating_add)
    }
}

/// Field-wise update for a historical session.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub name: Option<String>,
    pub notes: Option<String>,
    pub group: Option<String>,
    pub task_id: Option<String>,
}

// ============================================
// Rewards
// ============================================

/// A purchasable reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub description: String,
    pub star_cost: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ends_at: Option<DateTime<Utc>>,
}

impl Reward {
    /// True while the cooldown expiry lies in the future
    pub fn is_on_cooldown(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_ends_at.is_some_and(|until| now < until)
    }
}

/// Input for creating a reward. The star cost is optional so that a
/// missing value can be reported as a validation error.
#[derive(Debug, Clone, Default)]
pub struct RewardDraft {
    pub id: Option<String>,
    pub name: String,
    pub emoji: Option<String>,
    pub description: Option<String>,
    pub star_cost: Option<f64>,
    pub image: Option<String>,
}

/// One completed purchase. Name and cost are snapshots taken at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub id: String,
    pub reward_id: String,
    pub reward_name: String,
    pub stars_cost: i64,
    pub purchased_at: DateTime<Utc>,
    pub cooldown_ends_at: DateTime<Utc>,
}

/// Display classification of a reward for a given balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardState {
    Cooldown,
    Locked,
    Affordable,
}

impl RewardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardState::Cooldown => "cooldown",
            RewardState::Locked => "locked",
            RewardState::Affordable => "affordable",
        }
    }
}

impl std::fmt::Display for RewardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Tutorial
// ============================================

/// Walkthrough progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialState {
    pub is_active: bool,
    pub current_step_index: usize,
    pub completed_steps: Vec<String>,
    pub skipped: bool,
}
