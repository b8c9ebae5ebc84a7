//! First-run walkthrough progress.

use crate::observable::Observable;
use crate::storage::{self, keys, KeyValueStore};
use crate::types::TutorialState;
use std::sync::Arc;

/// One step of the walkthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialStep {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// Screen the step belongs to
    pub page: &'static str,
}

pub const TUTORIAL_STEPS: &[TutorialStep] = &[
    TutorialStep {
        id: "home-welcome",
        title: "Welcome to starlog!",
        description: "Track your study sessions and stay motivated with rewards.",
        page: "home",
    },
    TutorialStep {
        id: "home-create-task",
        title: "Create your first task",
        description: "Tasks hold your study goals; sessions can be attached to them.",
        page: "home",
    },
    TutorialStep {
        id: "tasks-page",
        title: "Tasks",
        description: "View all your tasks, create new ones and track your progress.",
        page: "tasks",
    },
    TutorialStep {
        id: "tasks-create-btn",
        title: "Create a new task",
        description: "Give a task a title and a goal to track your work against.",
        page: "tasks",
    },
    TutorialStep {
        id: "store-page",
        title: "Reward store",
        description: "Earn stars by completing sessions and spend them here.",
        page: "store",
    },
    TutorialStep {
        id: "store-add-reward",
        title: "Add your own rewards",
        description: "Create rewards that motivate you, with a star cost and description.",
        page: "store",
    },
    TutorialStep {
        id: "results-page",
        title: "Results",
        description: "Averages and totals across your sessions.",
        page: "results",
    },
    TutorialStep {
        id: "home-final",
        title: "You're all set!",
        description: "Create tasks, run sessions, earn stars and treat yourself.",
        page: "home",
    },
];

pub struct TutorialStore {
    state: Observable<TutorialState>,
}

impl TutorialStore {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let initial: TutorialState =
            storage::load(store.as_ref(), keys::TUTORIAL, TutorialState::default());
        let mut state = Observable::new(initial);
        state.subscribe(storage::mirror_to(store, keys::TUTORIAL));
        Self { state }
    }

    pub fn state(&self) -> &TutorialState {
        self.state.get()
    }

    pub fn start(&mut self) {
        self.state.update(|s| {
            s.is_active = true;
            s.current_step_index = 0;
            s.skipped = false;
        });
    }

    /// Complete the current step and move on; finishing the last step ends the walkthrough.
    ///
    /// Completed steps form a set: revisiting a step does not record it twice.
    pub fn next_step(&mut self) {
        let Some(current) = TUTORIAL_STEPS.get(self.state.get().current_step_index) else {
            return;
        };
        self.state.update(|s| {
            if !s.completed_steps.iter().any(|id| id == current.id) {
                s.completed_steps.push(current.id.to_string());
            }
            s.current_step_index += 1;
            s.is_active = s.current_step_index < TUTORIAL_STEPS.len();
        });
    }

    /// Jump to `index`, marking every earlier step completed.
    pub fn set_step(&mut self, index: usize) {
        self.state.update(|s| {
            s.completed_steps = TUTORIAL_STEPS
                .iter()
                .take(index)
                .map(|step| step.id.to_string())
                .collect();
            s.current_step_index = index;
            s.is_active = index < TUTORIAL_STEPS.len();
        });
    }

    pub fn skip(&mut self) {
        self.state.update(|s| {
            s.is_active = false;
            s.skipped = true;
        });
    }

    pub fn reset(&mut self) {
        self.state.set(TutorialState::default());
    }

    pub fn complete_step(&mut self, step_id: &str) {
        if self.is_step_completed(step_id) {
            return;
        }
        self.state
            .update(|s| s.completed_steps.push(step_id.to_string()));
    }

    pub fn is_step_completed(&self, step_id: &str) -> bool {
        self.state.get().completed_steps.iter().any(|id| id == step_id)
    }

    /// The step being shown, if the walkthrough is running.
    pub fn current_step(&self) -> Option<&'static TutorialStep> {
        let state = self.state.get();
        if !state.is_active {
            return None;
        }
        TUTORIAL_STEPS.get(state.current_step_index)
    }

    /// Offer the walkthrough only to users who neither skipped nor started it.
    pub fn should_show(&self) -> bool {
        let state = self.state.get();
        !state.skipped && state.completed_steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn tutorial() -> (TutorialStore, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (TutorialStore::load(store.clone()), store)
    }

    #[test]
    fn test_walk_through_all_steps() {
        let (mut t, _) = tutorial();
        assert!(t.should_show());
        assert!(t.current_step().is_none());

        t.start();
        assert_eq!(t.current_step().map(|s| s.id), Some("home-welcome"));

        for _ in 0..TUTORIAL_STEPS.len() {
            t.next_step();
        }
        assert!(!t.state().is_active);
        assert_eq!(t.state().completed_steps.len(), TUTORIAL_STEPS.len());
        assert!(t.current_step().is_none());
        assert!(!t.should_show());

        // past the end nothing changes
        t.next_step();
        assert_eq!(t.state().completed_steps.len(), TUTORIAL_STEPS.len());
    }

    #[test]
    fn test_restarting_does_not_repeat_completed_steps() {
        let (mut t, _) = tutorial();
        t.start();
        t.next_step();
        t.start();
        t.next_step();

        assert_eq!(t.state().completed_steps, vec!["home-welcome"]);
        assert_eq!(t.current_step().map(|s| s.id), Some("home-create-task"));
    }

    #[test]
    fn test_set_step_marks_earlier_steps() {
        let (mut t, _) = tutorial();
        t.set_step(3);
        assert!(t.state().is_active);
        assert_eq!(
            t.state().completed_steps,
            vec!["home-welcome", "home-create-task", "tasks-page"]
        );
        assert_eq!(t.current_step().map(|s| s.id), Some("tasks-create-btn"));

        t.set_step(TUTORIAL_STEPS.len());
        assert!(!t.state().is_active);
    }

    #[test]
    fn test_skip_and_reset() {
        let (mut t, _) = tutorial();
        t.start();
        t.skip();
        assert!(!t.state().is_active);
        assert!(t.state().skipped);
        assert!(!t.should_show());

        t.reset();
        assert_eq!(*t.state(), TutorialState::default());
        assert!(t.should_show());
    }

    #[test]
    fn test_complete_step_is_idempotent_and_persisted() {
        let (mut t, store) = tutorial();
        t.complete_step("store-page");
        t.complete_step("store-page");
        assert_eq!(t.state().completed_steps, vec!["store-page"]);
        assert!(t.is_step_completed("store-page"));

        let reloaded = TutorialStore::load(store);
        assert!(reloaded.is_step_completed("store-page"));
    }
}
