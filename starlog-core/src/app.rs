//! Application state: every store plus the values derived from them.
//!
//! Session history and purchases feed two derived values, the session
//! statistics and the available star balance. Both are recomputed in full
//! after every change to either input. Mutations that touch those inputs
//! therefore go through [`AppState`] rather than the stores directly.

use crate::analytics::{self, SessionStats};
use crate::clock::Clock;
use crate::config::RewardsConfig;
use crate::error::Result;
use crate::observable::Observable;
use crate::rewards::{self, RewardCatalog};
use crate::sessions::SessionManager;
use crate::storage::{self, keys, KeyValueStore};
use crate::tasks::TaskRegistry;
use crate::tutorial::TutorialStore;
use crate::types::{
    ActiveSession, PurchaseRecord, Responses, Reward, RewardDraft, RewardState, Session,
    SessionPatch, Task, Template,
};
use std::sync::Arc;

pub struct AppState {
    clock: Arc<dyn Clock>,
    tasks: TaskRegistry,
    sessions: SessionManager,
    rewards: RewardCatalog,
    tutorial: TutorialStore,
    stats: Option<SessionStats>,
    balance: Observable<i64>,
}

impl AppState {
    /// Load every store from `store` and compute derived values.
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        rewards_config: RewardsConfig,
    ) -> Self {
        let tasks = TaskRegistry::load(store.clone(), clock.clone());
        let sessions = SessionManager::load(store.clone(), clock.clone());
        let rewards = RewardCatalog::load(store.clone(), clock.clone(), rewards_config);
        let tutorial = TutorialStore::load(store.clone());

        let initial_balance: i64 = storage::load(store.as_ref(), keys::STAR_BALANCE, 0);
        let mut balance = Observable::new(initial_balance);
        balance.subscribe(storage::mirror_to(store, keys::STAR_BALANCE));

        let mut state = Self {
            clock,
            tasks,
            sessions,
            rewards,
            tutorial,
            stats: None,
            balance,
        };
        state.refresh();
        state
    }

    // ============================================
    // Read access
    // ============================================

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// Task operations that do not cascade (add, update, complete, reopen)
    pub fn tasks_mut(&mut self) -> &mut TaskRegistry {
        &mut self.tasks
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn rewards(&self) -> &RewardCatalog {
        &self.rewards
    }

    pub fn tutorial(&self) -> &TutorialStore {
        &self.tutorial
    }

    pub fn tutorial_mut(&mut self) -> &mut TutorialStore {
        &mut self.tutorial
    }

    /// Statistics over the session history, `None` when it is empty.
    pub fn stats(&self) -> Option<&SessionStats> {
        self.stats.as_ref()
    }

    /// Stars available to spend.
    pub fn available_stars(&self) -> i64 {
        *self.balance.get()
    }

    pub fn reward_state(&self, reward: &Reward) -> RewardState {
        self.rewards.state_of(reward, self.available_stars())
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    // ============================================
    // Tasks
    // ============================================

    /// Remove a task together with its sessions.
    pub fn remove_task(&mut self, task_id: &str) -> bool {
        let removed = self.tasks.remove(task_id);
        if removed {
            self.sessions.delete_sessions_by_task(task_id);
            self.refresh();
        }
        removed
    }

    /// Remove every task together with their sessions.
    pub fn clear_tasks(&mut self) -> Vec<String> {
        let ids = self.tasks.clear_all();
        for id in &ids {
            self.sessions.delete_sessions_by_task(id);
        }
        self.refresh();
        ids
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    // ============================================
    // Sessions
    // ============================================

    pub fn start_session(
        &mut self,
        template: &Template,
        planned_duration_minutes: Option<u32>,
        task_id: Option<&str>,
    ) -> ActiveSession {
        self.sessions
            .start(template, planned_duration_minutes, task_id)
    }

    pub fn end_session(&mut self, responses: Responses) -> Option<Session> {
        let session = self.sessions.end(responses);
        if session.is_some() {
            self.refresh();
        }
        session
    }

    pub fn cancel_session(&mut self) -> Option<ActiveSession> {
        self.sessions.cancel()
    }

    pub fn clear_sessions(&mut self) {
        self.sessions.clear_all();
        self.refresh();
    }

    pub fn update_session(&mut self, session_id: &str, patch: SessionPatch) -> bool {
        let updated = self.sessions.update_session(session_id, patch);
        if updated {
            self.refresh();
        }
        updated
    }

    pub fn delete_sessions_by_task(&mut self, task_id: &str) -> usize {
        let removed = self.sessions.delete_sessions_by_task(task_id);
        self.refresh();
        removed
    }

    // ============================================
    // Rewards
    // ============================================

    /// Buy a reward with the currently available stars.
    pub fn purchase(&mut self, reward_id: &str) -> Result<PurchaseRecord> {
        let record = self.rewards.purchase(reward_id, self.available_stars())?;
        self.refresh();
        Ok(record)
    }

    pub fn add_reward(&mut self, draft: RewardDraft) -> Result<Reward> {
        self.rewards.add_reward(draft)
    }

    pub fn clear_purchase_history(&mut self) {
        self.rewards.clear_purchase_history();
        self.refresh();
    }

    /// Remaining cooldown of a reward.
    pub fn cooldown_remaining(&self, reward: &Reward) -> chrono::Duration {
        rewards::cooldown_remaining(reward, self.clock.now())
    }

    // ============================================
    // Derived values
    // ============================================

    /// Recompute statistics and balance from scratch.
    ///
    /// An orphaned spend (nothing earned, purchases on record) wipes the
    /// purchase history as part of the recomputation.
    pub fn refresh(&mut self) {
        self.stats = SessionStats::compute(self.sessions.history());

        let reconciliation =
            analytics::reconcile(self.sessions.history(), self.rewards.purchases());
        if reconciliation.reset_spend {
            tracing::warn!(
                spent = reconciliation.spent,
                "Purchases on record with no stars earned; resetting purchase history"
            );
            self.rewards.clear_purchase_history();
        }

        if *self.balance.get() != reconciliation.available {
            tracing::debug!(
                earned = reconciliation.earned,
                spent = reconciliation.spent,
                available = reconciliation.available,
                "Star balance changed"
            );
        }
        self.balance.set(reconciliation.available);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::Error;
    use crate::storage::MemoryStore;
    use crate::types::{Question, SessionResponse, TaskDraft};
    use chrono::{Duration, TimeZone, Utc};

    fn template() -> Template {
        Template {
            id: "eval".to_string(),
            name: "Eval".to_string(),
            description: String::new(),
            questions: ["q1", "q2", "q3"]
                .iter()
                .map(|id| Question {
                    id: id.to_string(),
                    label: id.to_string(),
                    kind: "rating".to_string(),
                    stars: true,
                    options: None,
                })
                .collect(),
        }
    }

    fn app() -> (AppState, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        ));
        let app = AppState::load(store.clone(), clock.clone(), RewardsConfig::default());
        (app, store, clock)
    }

    fn complete_session(app: &mut AppState, ratings: &[i64], task_id: Option<&str>) -> Session {
        app.start_session(&template(), None, task_id);
        let responses: Responses = ratings
            .iter()
            .enumerate()
            .map(|(i, r)| (format!("q{}", i + 1), SessionResponse::rating(*r)))
            .collect();
        app.end_session(responses).unwrap()
    }

    fn add_reward(app: &mut AppState, cost: f64) -> Reward {
        app.add_reward(RewardDraft {
            id: Some("big".to_string()),
            name: "Big reward".to_string(),
            star_cost: Some(cost),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_earning_and_spending_scenario() {
        let (mut app, store, clock) = app();
        add_reward(&mut app, 50.0);
        assert_eq!(app.available_stars(), 0);

        assert!(matches!(
            app.purchase("big"),
            Err(Error::InsufficientFunds { .. })
        ));

        complete_session(&mut app, &[5], None);
        assert_eq!(app.available_stars(), 5);
        assert!(matches!(
            app.purchase("big"),
            Err(Error::InsufficientFunds { .. })
        ));
        assert_eq!(app.available_stars(), 5);

        for _ in 0..3 {
            complete_session(&mut app, &[5, 5, 5], None);
        }
        assert_eq!(app.available_stars(), 50);

        let record = app.purchase("big").unwrap();
        assert_eq!(app.available_stars(), 0);
        assert_eq!(record.cooldown_ends_at, clock.now() + Duration::seconds(86_400));
        assert_eq!(store.raw(keys::STAR_BALANCE).as_deref(), Some("0"));

        let reward = app.rewards().get("big").unwrap().clone();
        assert_eq!(app.reward_state(&reward), RewardState::Cooldown);
    }

    #[test]
    fn test_successful_purchase_decreases_balance_by_cost() {
        let (mut app, _, _) = app();
        complete_session(&mut app, &[5, 5, 5], None);
        complete_session(&mut app, &[5, 5, 5], None);
        assert_eq!(app.available_stars(), 30);

        app.purchase("4").unwrap();
        assert_eq!(app.available_stars(), 5);
    }

    #[test]
    fn test_orphaned_spend_is_reset_when_history_cleared() {
        let (mut app, store, _) = app();
        complete_session(&mut app, &[5, 5, 5], None);
        complete_session(&mut app, &[5, 5, 5], None);
        app.purchase("4").unwrap();
        assert_eq!(app.rewards().purchases().len(), 1);

        app.clear_sessions();

        assert_eq!(app.available_stars(), 0);
        assert!(app.rewards().purchases().is_empty());
        assert_eq!(store.raw(keys::PURCHASES).as_deref(), Some("[]"));
        assert!(app.stats().is_none());
    }

    #[test]
    fn test_stats_follow_history() {
        let (mut app, _, clock) = app();
        assert!(app.stats().is_none());

        app.start_session(&template(), Some(25), None);
        clock.advance(Duration::seconds(600));
        app.end_session(
            [
                ("q1".to_string(), SessionResponse::rating(4)),
                ("q2".to_string(), SessionResponse::answer("phone")),
            ]
            .into_iter()
            .collect(),
        );

        let stats = app.stats().unwrap();
        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.total_answered, 2);
        assert!((stats.average_rating - 4.0).abs() < f64::EPSILON);
        assert!((stats.average_duration - 600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_task_cascades_to_sessions() {
        let (mut app, _, _) = app();
        let task = app
            .tasks_mut()
            .add(TaskDraft {
                name: "Essay".to_string(),
                ..Default::default()
            })
            .unwrap();

        complete_session(&mut app, &[3], Some(&task.id));
        complete_session(&mut app, &[2], None);
        assert_eq!(app.available_stars(), 5);

        assert!(app.remove_task(&task.id));
        assert_eq!(app.sessions().history().len(), 1);
        assert_eq!(app.available_stars(), 2);
        assert!(!app.remove_task(&task.id));
    }

    #[test]
    fn test_end_without_active_session_leaves_state() {
        let (mut app, _, _) = app();
        complete_session(&mut app, &[4], None);

        assert!(app.end_session(Responses::new()).is_none());
        assert_eq!(app.sessions().history().len(), 1);
        assert_eq!(app.available_stars(), 4);
    }

    #[test]
    fn test_state_survives_reload() {
        let (mut app, store, clock) = app();
        complete_session(&mut app, &[5, 5, 5], None);
        complete_session(&mut app, &[5, 5, 5], None);
        app.purchase("4").unwrap();
        app.tutorial_mut().start();

        let reloaded = AppState::load(store, clock, RewardsConfig::default());
        assert_eq!(reloaded.available_stars(), 5);
        assert_eq!(reloaded.sessions().history().len(), 2);
        assert_eq!(reloaded.rewards().purchases().len(), 1);
        assert!(reloaded.tutorial().state().is_active);
        assert!(reloaded.rewards().get("4").unwrap().cooldown_ends_at.is_some());
    }

    #[test]
    fn test_extreme_ratings_saturate_and_reload() {
        let (mut app, store, clock) = app();
        complete_session(&mut app, &[i64::MAX], None);
        complete_session(&mut app, &[i64::MAX, i64::MAX], None);

        assert_eq!(app.available_stars(), i64::MAX);
        let stats = app.stats().unwrap();
        assert_eq!(stats.rating_count, 3);
        assert_eq!(stats.average_rating, i64::MAX as f64);

        // a store holding these sessions must load cleanly
        let mut reloaded = AppState::load(store, clock, RewardsConfig::default());
        assert_eq!(reloaded.sessions().history().len(), 2);
        assert_eq!(reloaded.available_stars(), i64::MAX);

        let record = reloaded.purchase("8").unwrap();
        assert_eq!(record.stars_cost, 200);
        assert_eq!(reloaded.available_stars(), i64::MAX - 200);
    }
}
