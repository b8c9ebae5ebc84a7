//! Derived values computed from session history and purchases.
//!
//! Everything here is a pure function of its inputs and is recomputed in
//! full whenever the inputs change. [`AppState`](crate::app::AppState)
//! owns the recomputation.

pub mod balance;
pub mod stats;

pub use balance::{reconcile, total_earned, total_spent, Reconciliation};
pub use stats::SessionStats;
