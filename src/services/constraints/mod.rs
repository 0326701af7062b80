//! Hard and soft scheduling rules.
//!
//! Rules are trait objects built from [`ConstraintSpec`] data, so new rules
//! plug in without touching the scorer. A rule that cannot evaluate a slot
//! reports a [`ConstraintFault`]; the provided `check`/`penalty` methods log
//! it and fall back to "satisfied" / "no penalty".

pub mod hard;
pub mod soft;

use std::fmt::Debug;
use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use tracing::warn;

use crate::error::{AppError, AppResult, ConstraintFault};
use crate::models::constraint::{ConstraintKind, ConstraintSpec};
use crate::models::context::{CalendarEvent, SchedulingContext, WeeklyWindow};
use crate::models::slot::{SoftPenalty, TimeSlot};
use crate::services::schedule_utils;

pub use hard::{NoOverlap, NotInPast, OutsideBlockedWindows, WithinDayParts, WithinWorkingHours};
pub use soft::{AvoidWindows, BufferAroundEvents, PreferredHours, SameCategoryProximity};

const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub enum HardVerdict {
    Satisfied,
    Violated(String),
}

/// Penalty points contributed by a soft rule. Zero means the preference holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftVerdict {
    pub penalty: f64,
    pub description: String,
}

impl SoftVerdict {
    pub fn none() -> Self {
        Self {
            penalty: 0.0,
            description: String::new(),
        }
    }

    pub fn penalize(penalty: f64, description: impl Into<String>) -> Self {
        Self {
            penalty: penalty.max(0.0),
            description: description.into(),
        }
    }
}

/// Admissibility gate evaluated before any scoring.
pub trait HardConstraint: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        slot: &TimeSlot,
        context: &SchedulingContext,
    ) -> Result<HardVerdict, ConstraintFault>;

    /// Evaluates the rule, treating a fault as satisfied.
    fn check(&self, slot: &TimeSlot, context: &SchedulingContext) -> HardVerdict {
        match self.evaluate(slot, context) {
            Ok(verdict) => verdict,
            Err(fault) => {
                warn!(
                    target: "app::scheduler::constraints",
                    constraint = self.name(),
                    %fault,
                    "hard constraint could not be evaluated; treating as satisfied"
                );
                HardVerdict::Satisfied
            }
        }
    }
}

/// Preference rule that lowers a slot's constraint score.
pub trait SoftConstraint: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn evaluate(
        &self,
        slot: &TimeSlot,
        context: &SchedulingContext,
    ) -> Result<SoftVerdict, ConstraintFault>;

    /// Evaluates the rule, treating a fault as zero penalty.
    fn penalty(&self, slot: &TimeSlot, context: &SchedulingContext) -> SoftVerdict {
        match self.evaluate(slot, context) {
            Ok(verdict) => verdict,
            Err(fault) => {
                warn!(
                    target: "app::scheduler::constraints",
                    constraint = self.name(),
                    %fault,
                    "soft constraint could not be evaluated; applying no penalty"
                );
                SoftVerdict::none()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HardValidation {
    pub admissible: bool,
    pub violations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoftScore {
    pub score: f64,
    pub penalties: Vec<SoftPenalty>,
}

/// Runs every hard rule without short-circuiting so the caller sees all violations.
pub fn validate_hard(
    slot: &TimeSlot,
    context: &SchedulingContext,
    constraints: &[Arc<dyn HardConstraint>],
) -> HardValidation {
    let violations: Vec<String> = constraints
        .iter()
        .filter_map(|constraint| match constraint.check(slot, context) {
            HardVerdict::Satisfied => None,
            HardVerdict::Violated(description) => {
                Some(format!("{}: {}", constraint.name(), description))
            }
        })
        .collect();

    HardValidation {
        admissible: violations.is_empty(),
        violations,
    }
}

/// Starts at 100 and subtracts every soft penalty, floored at 0.
pub fn score_soft(
    slot: &TimeSlot,
    context: &SchedulingContext,
    constraints: &[Arc<dyn SoftConstraint>],
) -> SoftScore {
    let mut penalties = Vec::new();
    for constraint in constraints {
        let verdict = constraint.penalty(slot, context);
        if verdict.penalty > 0.0 {
            penalties.push(SoftPenalty {
                name: constraint.name().to_string(),
                penalty: verdict.penalty,
                description: verdict.description,
            });
        }
    }

    let total: f64 = penalties.iter().map(|p| p.penalty).sum();
    SoftScore {
        score: (MAX_SCORE - total).clamp(0.0, MAX_SCORE),
        penalties,
    }
}

/// Rules applied to one scheduling request. Cloning shares the rule objects.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    pub hard: Vec<Arc<dyn HardConstraint>>,
    pub soft: Vec<Arc<dyn SoftConstraint>>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(hard: &[ConstraintSpec], soft: &[ConstraintSpec]) -> AppResult<Self> {
        Ok(Self {
            hard: hard
                .iter()
                .map(ConstraintSpec::build_hard)
                .collect::<AppResult<Vec<_>>>()?,
            soft: soft
                .iter()
                .map(ConstraintSpec::build_soft)
                .collect::<AppResult<Vec<_>>>()?,
        })
    }

    pub fn with_hard(mut self, constraint: impl HardConstraint + 'static) -> Self {
        self.hard.push(Arc::new(constraint));
        self
    }

    pub fn with_soft(mut self, constraint: impl SoftConstraint + 'static) -> Self {
        self.soft.push(Arc::new(constraint));
        self
    }

    pub fn len(&self) -> usize {
        self.hard.len() + self.soft.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hard.is_empty() && self.soft.is_empty()
    }
}

impl ConstraintSpec {
    pub fn build_hard(&self) -> AppResult<Arc<dyn HardConstraint>> {
        self.validate()?;
        let rule: Arc<dyn HardConstraint> = match self {
            ConstraintSpec::NoOverlap {
                blocking_categories,
            } => Arc::new(NoOverlap::new(blocking_categories.clone())),
            ConstraintSpec::NotInPast => Arc::new(NotInPast),
            ConstraintSpec::WithinDayParts { filter } => {
                Arc::new(WithinDayParts::new(filter.clone()))
            }
            ConstraintSpec::OutsideBlockedWindows => Arc::new(OutsideBlockedWindows),
            ConstraintSpec::WithinWorkingHours => Arc::new(WithinWorkingHours),
            other => return Err(kind_mismatch(other, ConstraintKind::Hard)),
        };
        Ok(rule)
    }

    pub fn build_soft(&self) -> AppResult<Arc<dyn SoftConstraint>> {
        self.validate()?;
        let rule: Arc<dyn SoftConstraint> = match self {
            ConstraintSpec::SameCategoryProximity {
                category,
                min_gap_minutes,
                penalty,
            } => Arc::new(SameCategoryProximity::new(
                category.clone(),
                *min_gap_minutes,
                *penalty,
            )),
            ConstraintSpec::PreferredHours {
                start_minute,
                end_minute,
                penalty,
            } => Arc::new(PreferredHours::new(*start_minute, *end_minute, *penalty)),
            ConstraintSpec::AvoidWindows { windows, penalty } => {
                Arc::new(AvoidWindows::new(windows.clone(), *penalty))
            }
            ConstraintSpec::BufferAroundEvents {
                buffer_minutes,
                penalty,
            } => Arc::new(BufferAroundEvents::new(*buffer_minutes, *penalty)),
            other => return Err(kind_mismatch(other, ConstraintKind::Soft)),
        };
        Ok(rule)
    }

    pub fn validate(&self) -> AppResult<()> {
        match self {
            ConstraintSpec::WithinDayParts { filter } => filter.validate(),
            ConstraintSpec::SameCategoryProximity {
                min_gap_minutes,
                penalty,
                ..
            } => {
                ensure_positive_minutes("minGapMinutes", *min_gap_minutes)?;
                ensure_penalty(*penalty)
            }
            ConstraintSpec::PreferredHours {
                start_minute,
                end_minute,
                penalty,
            } => {
                ensure_minute_range(*start_minute, *end_minute)?;
                ensure_penalty(*penalty)
            }
            ConstraintSpec::AvoidWindows { windows, penalty } => {
                for window in windows {
                    ensure_weekly_window(window)?;
                }
                ensure_penalty(*penalty)
            }
            ConstraintSpec::BufferAroundEvents {
                buffer_minutes,
                penalty,
            } => {
                ensure_positive_minutes("bufferMinutes", *buffer_minutes)?;
                ensure_penalty(*penalty)
            }
            ConstraintSpec::NoOverlap { .. }
            | ConstraintSpec::NotInPast
            | ConstraintSpec::OutsideBlockedWindows
            | ConstraintSpec::WithinWorkingHours => Ok(()),
        }
    }
}

fn kind_mismatch(spec: &ConstraintSpec, expected: ConstraintKind) -> AppError {
    AppError::config(format!(
        "{spec:?} is a {} constraint, expected {expected}",
        spec.kind()
    ))
}

fn ensure_penalty(penalty: f64) -> AppResult<()> {
    if !penalty.is_finite() || penalty < 0.0 {
        return Err(AppError::validation_with_details(
            "penalty must be finite and non-negative",
            json!({"penalty": penalty}),
        ));
    }
    Ok(())
}

fn ensure_positive_minutes(field: &str, minutes: i64) -> AppResult<()> {
    if minutes <= 0 {
        return Err(AppError::validation_with_details(
            "minutes must be positive",
            json!({"field": field, "value": minutes}),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_minute_range(start_minute: u32, end_minute: u32) -> AppResult<()> {
    if start_minute >= end_minute || end_minute > 24 * 60 {
        return Err(AppError::validation_with_details(
            "minute range must satisfy start < end <= 1440",
            json!({"startMinute": start_minute, "endMinute": end_minute}),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_weekly_window(window: &WeeklyWindow) -> AppResult<()> {
    if window.weekday > 6 {
        return Err(AppError::validation_with_details(
            "weekday must be between 0 (Monday) and 6 (Sunday)",
            json!({"weekday": window.weekday}),
        ));
    }
    ensure_minute_range(window.start_minute, window.end_minute)
}

pub(crate) fn checked_event(event: &CalendarEvent) -> Result<(), ConstraintFault> {
    if event.end_at <= event.start_at {
        return Err(ConstraintFault::Evaluation(format!(
            "event {} has an empty or inverted time range",
            event.id
        )));
    }
    Ok(())
}

/// Minutes between a slot and an event, zero when they touch or overlap.
pub(crate) fn gap_minutes(slot: &TimeSlot, event: &CalendarEvent) -> i64 {
    if event.end_at <= slot.start_at() {
        slot.start_at().signed_duration_since(event.end_at).num_minutes()
    } else if event.start_at >= slot.end_at() {
        event.start_at.signed_duration_since(slot.end_at()).num_minutes()
    } else {
        0
    }
}

/// Minutes of `slot` falling inside concrete occurrences of a weekly window.
pub(crate) fn weekly_window_overlap(slot: &TimeSlot, window: &WeeklyWindow) -> i64 {
    let first_day = schedule_utils::start_of_day(slot.start_at());
    let mut total = 0;
    let mut day = first_day;
    while day < slot.end_at() {
        if schedule_utils::weekday_index(day) == window.weekday {
            let window_start = day + Duration::minutes(i64::from(window.start_minute));
            let window_end = day + Duration::minutes(i64::from(window.end_minute));
            total += schedule_utils::overlap_minutes(
                slot.start_at(),
                slot.end_at(),
                window_start,
                window_end,
            );
        }
        day += Duration::days(1);
    }
    total
}
