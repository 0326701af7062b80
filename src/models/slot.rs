use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// A candidate placement. Immutable once built.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    start_at: DateTime<FixedOffset>,
    end_at: DateTime<FixedOffset>,
    duration_minutes: i64,
}

impl TimeSlot {
    pub fn new(start_at: DateTime<FixedOffset>, end_at: DateTime<FixedOffset>) -> AppResult<Self> {
        if end_at <= start_at {
            return Err(AppError::validation("slot end must be after its start"));
        }
        Ok(Self {
            start_at,
            end_at,
            duration_minutes: end_at.signed_duration_since(start_at).num_minutes(),
        })
    }

    pub fn start_at(&self) -> DateTime<FixedOffset> {
        self.start_at
    }

    pub fn end_at(&self) -> DateTime<FixedOffset> {
        self.end_at
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration_minutes
    }
}

/// Per-dimension scores (0-100) and their weighted total.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub constraint: f64,
    pub energy: f64,
    pub timing: f64,
    pub balance: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn is_zero(&self) -> bool {
        self.constraint == 0.0
            && self.energy == 0.0
            && self.timing == 0.0
            && self.balance == 0.0
            && self.total == 0.0
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SoftPenalty {
    pub name: String,
    pub penalty: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSlot {
    #[serde(flatten)]
    pub slot: TimeSlot,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub violations: Vec<String>,
    pub penalties: Vec<SoftPenalty>,
}

impl ScoredSlot {
    /// A slot rejected by at least one hard constraint. Score and breakdown stay zero.
    pub fn rejected(slot: TimeSlot, violations: Vec<String>) -> Self {
        Self {
            slot,
            score: 0.0,
            breakdown: ScoreBreakdown::default(),
            violations,
            penalties: Vec::new(),
        }
    }

    pub fn is_admissible(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.is_admissible() {
            format!(
                "{} - {}: score {:.1} (constraints {:.0}, energy {:.0}, timing {:.0}, balance {:.0})",
                self.slot.start_at.to_rfc3339(),
                self.slot.end_at.to_rfc3339(),
                self.score,
                self.breakdown.constraint,
                self.breakdown.energy,
                self.breakdown.timing,
                self.breakdown.balance,
            )
        } else {
            format!(
                "{} - {}: rejected ({})",
                self.slot.start_at.to_rfc3339(),
                self.slot.end_at.to_rfc3339(),
                self.violations.join("; "),
            )
        }
    }
}
