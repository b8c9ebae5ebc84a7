//! Star balance reconciliation.
//!
//! available = earned - spent, clamped at zero, where earned is the sum of
//! every positive rating in the session history and spent is the sum of
//! every purchase cost on record. All sums saturate, so stored values of
//! any size reconcile without overflow.
//!
//! Orphaned spend: when nothing has been earned but purchases are still on
//! record (history was cleared, purchases were not), the purchase record is
//! considered stale and must be reset. [`reconcile`] reports this through
//! [`Reconciliation::reset_spend`]; the caller performs the reset.

use crate::types::{PurchaseRecord, Session};

/// Outcome of a balance computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub earned: i64,
    pub spent: i64,
    pub available: i64,
    /// Purchase history must be cleared
    pub reset_spend: bool,
}

pub fn total_earned(sessions: &[Session]) -> i64 {
    sessions
        .iter()
        .map(Session::stars_earned)
        .fold(0i64, i64::saturating_add)
}

pub fn total_spent(purchases: &[PurchaseRecord]) -> i64 {
    purchases
        .iter()
        .map(|p| p.stars_cost)
        .fold(0i64, i64::saturating_add)
}

pub fn reconcile(sessions: &[Session], purchases: &[PurchaseRecord]) -> Reconciliation {
    let earned = total_earned(sessions);
    let spent = total_spent(purchases);

    if earned == 0 && spent > 0 {
        return Reconciliation {
            earned,
            spent,
            available: 0,
            reset_spend: true,
        };
    }

    Reconciliation {
        earned,
        spent,
        available: earned.saturating_sub(spent).max(0),
        reset_spend: false,
    }
}
