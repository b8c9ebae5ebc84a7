//! Session statistics.

use crate::types::{Session, SessionResponse};
use serde::Serialize;

/// Aggregate statistics over the session history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    /// Number of completed sessions
    pub total_sessions: usize,
    /// Mean of every positive rating across every response of every session
    pub average_rating: f64,
    /// Mean session duration in seconds
    pub average_duration: f64,
    /// Total duration in seconds across all sessions
    pub total_duration_secs: i64,
    /// Number of answered questions (sum of response-map sizes)
    pub total_answered: usize,
    /// Number of positive ratings the average is taken over
    pub rating_count: usize,
}

impl SessionStats {
    /// Compute statistics, or `None` for an empty history.
    pub fn compute(sessions: &[Session]) -> Option<Self> {
        if sessions.is_empty() {
            return None;
        }

        let ratings: Vec<i64> = sessions
            .iter()
            .flat_map(|s| s.responses.values())
            .filter_map(SessionResponse::positive_rating)
            .collect();

        // means are taken in f64 so stored values of any size cannot overflow
        let average_rating = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().map(|r| *r as f64).sum::<f64>() / ratings.len() as f64
        };

        let average_duration =
            sessions.iter().map(|s| s.duration as f64).sum::<f64>() / sessions.len() as f64;
        let total_duration_secs = sessions
            .iter()
            .map(|s| s.duration)
            .fold(0i64, i64::saturating_add);
        let total_answered = sessions.iter().map(|s| s.responses.len()).sum();

        Some(Self {
            total_sessions: sessions.len(),
            average_rating,
            average_duration,
            total_duration_secs,
            total_answered,
            rating_count: ratings.len(),
        })
    }

    /// Format the average duration for display (e.g., "25m 30s").
    pub fn format_average_duration(&self) -> String {
        crate::format::format_duration_secs(self.average_duration.round() as i64)
    }
}
