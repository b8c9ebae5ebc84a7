//! Task registry.
//!
//! Tasks are kept newest first. Removing a task does not touch sessions
//! here; [`AppState`](crate::app::AppState) cascades the removal into the
//! session history.

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::observable::Observable;
use crate::storage::{self, keys, KeyValueStore};
use crate::types::{Task, TaskDraft, TaskPatch};
use std::sync::Arc;
use uuid::Uuid;

pub struct TaskRegistry {
    tasks: Observable<Vec<Task>>,
    clock: Arc<dyn Clock>,
}

impl TaskRegistry {
    /// Load tasks from storage and mirror every later change back to it.
    pub fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let initial: Vec<Task> = storage::load(store.as_ref(), keys::TASKS, Vec::new());
        let mut tasks = Observable::new(initial);
        tasks.subscribe(storage::mirror_to(store, keys::TASKS));
        Self { tasks, clock }
    }

    pub fn list(&self) -> &[Task] {
        self.tasks.get()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get().iter().find(|t| t.id == id)
    }

    pub fn add(&mut self, draft: TaskDraft) -> Result<Task> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(Error::Validation("task must have a name".to_string()));
        }

        let task = Task {
            id: format!("task-{}", Uuid::new_v4()),
            name: name.to_string(),
            goal: non_blank(draft.goal),
            description: non_blank(draft.description),
            created_at: self.clock.now(),
            completed_at: None,
            result: None,
        };

        tracing::info!(task_id = %task.id, name = %task.name, "Task added");
        self.tasks.update(|list| list.insert(0, task.clone()));
        Ok(task)
    }

    /// Merge `patch` into the task. Returns false if no task has `id`.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> bool {
        if self.get(id).is_none() {
            tracing::debug!(task_id = id, "Update for unknown task ignored");
            return false;
        }

        self.tasks.update(|list| {
            if let Some(task) = list.iter_mut().find(|t| t.id == id) {
                if let Some(name) = patch.name.as_deref().map(str::trim) {
                    if !name.is_empty() {
                        task.name = name.to_string();
                    }
                }
                if patch.goal.is_some() {
                    task.goal = non_blank(patch.goal);
                }
                if patch.description.is_some() {
                    task.description = non_blank(patch.description);
                }
            }
        });
        true
    }

    /// Mark a task complete, recording an optional outcome payload.
    pub fn complete(&mut self, id: &str, result: Option<serde_json::Value>) -> Result<Task> {
        let now = self.clock.now();
        self.modify(id, |task| {
            task.completed_at = Some(now);
            task.result = result;
        })
    }

    pub fn reopen(&mut self, id: &str) -> Result<Task> {
        self.modify(id, |task| {
            task.completed_at = None;
            task.result = None;
        })
    }

    pub(crate) fn remove(&mut self, id: &str) -> bool {
        let before = self.tasks.get().len();
        self.tasks.update(|list| list.retain(|t| t.id != id));
        let removed = self.tasks.get().len() != before;
        if removed {
            tracing::info!(task_id = id, "Task removed");
        }
        removed
    }

    /// Remove every task, returning the ids that were dropped.
    pub(crate) fn clear_all(&mut self) -> Vec<String> {
        let ids = self.tasks.get().iter().map(|t| t.id.clone()).collect();
        self.tasks.set(Vec::new());
        ids
    }

    /// Apply `f` to one task. Unknown ids fail without notifying subscribers.
    fn modify(&mut self, id: &str, f: impl FnOnce(&mut Task)) -> Result<Task> {
        if self.get(id).is_none() {
            return Err(Error::TaskNotFound(id.to_string()));
        }

        self.tasks
            .update(|list| {
                list.iter_mut().find(|t| t.id == id).map(|task| {
                    f(task);
                    task.clone()
                })
            })
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
