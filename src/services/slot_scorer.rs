use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::models::context::SchedulingContext;
use crate::models::request::Priority;
use crate::models::settings::{BalanceParams, EngineSettings, TimingParams};
use crate::models::slot::{ScoreBreakdown, ScoredSlot, TimeSlot};
use crate::models::weights::{ScoreWeights, ScoreWeightsUpdate};
use crate::services::constraints::{self, HardConstraint, SoftConstraint};
use crate::services::{energy_profile, schedule_utils};

const MAX_SCORE: f64 = 100.0;
const DAYS_PER_WEEK: f64 = 7.0;

/// Multi-factor slot scorer.
///
/// Hard rules gate admissibility; admissible slots are scored on four
/// dimensions (soft constraints, energy, timing, balance) combined by
/// weights that always sum to 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotScorer {
    weights: ScoreWeights,
    timing: TimingParams,
    balance: BalanceParams,
}

impl Default for SlotScorer {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            timing: TimingParams::default(),
            balance: BalanceParams::default(),
        }
    }
}

impl SlotScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoreWeights) -> AppResult<Self> {
        Ok(Self {
            weights: weights.normalized()?,
            ..Self::default()
        })
    }

    pub fn from_settings(settings: &EngineSettings) -> AppResult<Self> {
        ensure_timing(&settings.timing)?;
        ensure_balance(&settings.balance)?;
        Ok(Self {
            weights: settings.weights.normalized()?,
            timing: settings.timing,
            balance: settings.balance,
        })
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    pub fn timing_params(&self) -> TimingParams {
        self.timing
    }

    pub fn balance_params(&self) -> BalanceParams {
        self.balance
    }

    /// Merges `update` over the current weights and renormalizes all four.
    /// The scorer is left untouched when the update is invalid.
    pub fn update_weights(&mut self, update: &ScoreWeightsUpdate) -> AppResult<()> {
        let merged = self.weights.merged(update)?;
        info!(
            target: "app::scheduler::scorer",
            constraints = merged.constraints,
            energy = merged.energy,
            timing = merged.timing,
            balance = merged.balance,
            "score weights updated"
        );
        self.weights = merged;
        Ok(())
    }

    pub fn score_slot(
        &self,
        slot: &TimeSlot,
        context: &SchedulingContext,
        hard: &[Arc<dyn HardConstraint>],
        soft: &[Arc<dyn SoftConstraint>],
        priority: Priority,
    ) -> ScoredSlot {
        let validation = constraints::validate_hard(slot, context, hard);
        if !validation.admissible {
            return ScoredSlot::rejected(*slot, validation.violations);
        }

        let soft_score = constraints::score_soft(slot, context, soft);
        let constraint = soft_score.score;
        let energy = energy_profile::slot_energy_score(slot, context.chronotype);
        let timing = self.timing_score(slot, context.now, priority);
        let balance = self.balance_score(slot, context);

        let total = constraint * self.weights.constraints
            + energy * self.weights.energy
            + timing * self.weights.timing
            + balance * self.weights.balance;

        ScoredSlot {
            slot: *slot,
            score: total,
            breakdown: ScoreBreakdown {
                constraint,
                energy,
                timing,
                balance,
                total,
            },
            violations: Vec::new(),
            penalties: soft_score.penalties,
        }
    }

    /// Scores every candidate and ranks them by total score, highest first.
    /// Equal scores keep their candidate order.
    pub fn score_slots<I>(
        &self,
        slots: I,
        context: &SchedulingContext,
        hard: &[Arc<dyn HardConstraint>],
        soft: &[Arc<dyn SoftConstraint>],
        priority: Priority,
        limit: Option<usize>,
    ) -> Vec<ScoredSlot>
    where
        I: IntoIterator<Item = TimeSlot>,
    {
        let mut scored: Vec<ScoredSlot> = slots
            .into_iter()
            .map(|slot| self.score_slot(&slot, context, hard, soft, priority))
            .collect();

        let candidates = scored.len();
        let admissible = scored.iter().filter(|s| s.is_admissible()).count();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        if let Some(limit) = limit {
            scored.truncate(limit);
        }

        debug!(
            target: "app::scheduler::scorer",
            candidates,
            admissible,
            priority = %priority,
            best = scored.first().map(|s| s.score),
            "scored candidate slots"
        );

        scored
    }

    /// Highest ranked candidate; `None` only when there were no candidates.
    pub fn find_best_slot<I>(
        &self,
        slots: I,
        context: &SchedulingContext,
        hard: &[Arc<dyn HardConstraint>],
        soft: &[Arc<dyn SoftConstraint>],
        priority: Priority,
    ) -> Option<ScoredSlot>
    where
        I: IntoIterator<Item = TimeSlot>,
    {
        self.score_slots(slots, context, hard, soft, priority, Some(1))
            .into_iter()
            .next()
    }

    /// 100 inside the priority's ideal lead time, then decays by
    /// `decay_per_period` per additional ideal period. Past slots score 0.
    pub fn timing_score(
        &self,
        slot: &TimeSlot,
        now: DateTime<FixedOffset>,
        priority: Priority,
    ) -> f64 {
        let hours_until = slot.start_at().signed_duration_since(now).num_seconds() as f64 / 3600.0;
        if hours_until < 0.0 {
            return 0.0;
        }

        let ideal = priority.ideal_lead_hours();
        if hours_until <= ideal {
            return MAX_SCORE;
        }

        let periods = (hours_until - ideal) / ideal;
        (MAX_SCORE * self.timing.decay_per_period.powf(periods)).clamp(0.0, MAX_SCORE)
    }

    /// Compares the slot's day load (candidate included) with the average
    /// daily load of its Sunday-started week; falls linearly to 0 at
    /// `max_deviation_minutes` of absolute deviation.
    pub fn balance_score(&self, slot: &TimeSlot, context: &SchedulingContext) -> f64 {
        let day_start = schedule_utils::start_of_day(slot.start_at());
        let day_end = day_start + Duration::days(1);
        let week_start = schedule_utils::start_of_week(slot.start_at());
        let week_end = week_start + Duration::days(7);

        let mut day_minutes = 0;
        let mut week_minutes = 0;
        for event in context
            .events
            .iter()
            .filter(|event| event.end_at > event.start_at)
        {
            day_minutes +=
                schedule_utils::overlap_minutes(event.start_at, event.end_at, day_start, day_end);
            week_minutes +=
                schedule_utils::overlap_minutes(event.start_at, event.end_at, week_start, week_end);
        }

        let projected = (day_minutes + slot.duration_minutes()) as f64;
        let weekly_average = week_minutes as f64 / DAYS_PER_WEEK;
        let deviation = (projected - weekly_average).abs();

        (MAX_SCORE * (1.0 - deviation / self.balance.max_deviation_minutes)).clamp(0.0, MAX_SCORE)
    }
}

pub(crate) fn ensure_timing(timing: &TimingParams) -> AppResult<()> {
    let decay = timing.decay_per_period;
    if !decay.is_finite() || decay <= 0.0 || decay > 1.0 {
        return Err(AppError::validation_with_details(
            "timing decay must be in (0, 1]",
            json!({"decayPerPeriod": decay}),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_balance(balance: &BalanceParams) -> AppResult<()> {
    let max = balance.max_deviation_minutes;
    if !max.is_finite() || max <= 0.0 {
        return Err(AppError::validation_with_details(
            "balance deviation threshold must be positive",
            json!({"maxDeviationMinutes": max}),
        ));
    }
    Ok(())
}
