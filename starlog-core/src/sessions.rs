//! Session lifecycle.
//!
//! ```text
//! Idle --start--> Active --end--> Idle   (session appended to history)
//!                   |
//!                   +--cancel--> Idle    (nothing recorded)
//! ```
//!
//! Starting while a session is active replaces it.

use crate::clock::Clock;
use crate::logging;
use crate::observable::Observable;
use crate::storage::{self, keys, KeyValueStore};
use crate::types::{ActiveSession, Responses, Session, SessionPatch, Template};
use std::sync::Arc;
use uuid::Uuid;

pub struct SessionManager {
    history: Observable<Vec<Session>>,
    active: Observable<Option<ActiveSession>>,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    /// Load history and any in-progress session, mirroring both to storage.
    pub fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let sessions: Vec<Session> = storage::load(store.as_ref(), keys::SESSIONS, Vec::new());
        let active: Option<ActiveSession> =
            storage::load(store.as_ref(), keys::ACTIVE_SESSION, None);

        let mut history = Observable::new(sessions);
        history.subscribe(storage::mirror_to(store.clone(), keys::SESSIONS));

        let mut active = Observable::new(active);
        active.subscribe(storage::mirror_optional_to(store, keys::ACTIVE_SESSION));

        Self {
            history,
            active,
            clock,
        }
    }

    pub fn history(&self) -> &[Session] {
        self.history.get()
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.get().as_ref()
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.history.get().iter().find(|s| s.id == id)
    }

    /// "Session N", where N counts completed sessions for the same task
    /// (or all completed sessions when there is no task), plus one.
    pub fn next_session_name(&self, task_id: Option<&str>) -> String {
        let prior = match task_id {
            Some(task_id) => self
                .history
                .get()
                .iter()
                .filter(|s| s.task_id.as_deref() == Some(task_id))
                .count(),
            None => self.history.get().len(),
        };
        format!("Session {}", prior + 1)
    }

    /// Begin a session from `template`. Any active session is discarded.
    pub fn start(
        &mut self,
        template: &Template,
        planned_duration_minutes: Option<u32>,
        task_id: Option<&str>,
    ) -> ActiveSession {
        if let Some(previous) = self.active() {
            tracing::warn!(
                session_id = %previous.id,
                "Starting a new session replaces the active one"
            );
        }

        let session = ActiveSession {
            id: format!("session-{}", Uuid::new_v4()),
            name: self.next_session_name(task_id),
            template_id: template.id.clone(),
            template_name: template.name.clone(),
            questions: template.questions.clone(),
            start_time: self.clock.now(),
            planned_duration_secs: planned_duration_minutes.map(|m| u64::from(m) * 60),
            task_id: task_id.map(str::to_string),
        };

        let _span = logging::session_span(&session.id, session.task_id.as_deref()).entered();
        tracing::info!(
            name = %session.name,
            template_id = %session.template_id,
            planned_secs = ?session.planned_duration_secs,
            "Session started"
        );
        self.active.set(Some(session.clone()));
        session
    }

    /// Finish the active session with the given answers.
    ///
    /// Without an active session this logs an error and returns `None`,
    /// leaving history untouched.
    pub fn end(&mut self, responses: Responses) -> Option<Session> {
        let Some(active) = self.active.get().clone() else {
            tracing::error!("No active session to end");
            return None;
        };

        let _span = logging::session_span(&active.id, active.task_id.as_deref()).entered();
        let end_time = self.clock.now();
        let duration = (end_time - active.start_time).num_seconds().max(0);
        let overall_rating = active
            .questions
            .first()
            .and_then(|q| responses.get(&q.id))
            .and_then(|r| r.rating);

        let session = Session {
            id: active.id,
            name: active.name,
            template_id: active.template_id,
            template_name: active.template_name,
            start_time: active.start_time,
            end_time,
            duration,
            responses,
            overall_rating,
            planned_duration_secs: active.planned_duration_secs,
            task_id: active.task_id,
            notes: None,
            group: None,
        };

        tracing::info!(
            duration_secs = session.duration,
            overall_rating = ?session.overall_rating,
            "Session completed"
        );
        self.history.update(|list| list.push(session.clone()));
        self.active.set(None);
        Some(session)
    }

    /// Discard the active session without recording it.
    pub fn cancel(&mut self) -> Option<ActiveSession> {
        let discarded = self.active.get().clone();
        match &discarded {
            Some(s) => {
                let _span = logging::session_span(&s.id, s.task_id.as_deref()).entered();
                tracing::info!("Session cancelled");
            }
            None => tracing::debug!("Cancel with no active session"),
        }
        self.active.set(None);
        discarded
    }

    /// Empty the history. The active session is left alone.
    pub fn clear_all(&mut self) {
        tracing::info!(count = self.history.get().len(), "Clearing session history");
        self.history.set(Vec::new());
    }

    /// Merge `patch` into a historical session. Returns false if `id` is unknown.
    pub fn update_session(&mut self, id: &str, patch: SessionPatch) -> bool {
        if self.get(id).is_none() {
            tracing::debug!(session_id = id, "Update for unknown session ignored");
            return false;
        }

        self.history.update(|list| {
            if let Some(session) = list.iter_mut().find(|s| s.id == id) {
                if let Some(name) = patch.name {
                    session.name = name;
                }
                if let Some(notes) = patch.notes {
                    session.notes = Some(notes);
                }
                if let Some(group) = patch.group {
                    session.group = Some(group);
                }
                if let Some(task_id) = patch.task_id {
                    session.task_id = Some(task_id);
                }
            }
        });
        true
    }

    /// Drop every historical session attached to `task_id`. Returns how many went.
    pub fn delete_sessions_by_task(&mut self, task_id: &str) -> usize {
        let before = self.history.get().len();
        self.history
            .update(|list| list.retain(|s| s.task_id.as_deref() != Some(task_id)));
        let removed = before - self.history.get().len();
        if removed > 0 {
            tracing::info!(task_id, removed, "Deleted sessions for task");
        }
        removed
    }
}
