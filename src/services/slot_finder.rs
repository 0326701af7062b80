//! Entry points used by the UI and assistant layers.
//!
//! "Next available", "morning" and "focus" searches are all the same
//! generator with a different day-part filter.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, FixedOffset};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::context::SchedulingContext;
use crate::models::request::{DayPartFilter, Priority, SearchWindow, SlotRequest};
use crate::models::settings::{EngineSettings, DEFAULT_HORIZON_DAYS};
use crate::models::slot::{ScoredSlot, TimeSlot};
use crate::models::weights::{ScoreWeights, ScoreWeightsUpdate};
use crate::services::constraints::{ConstraintSet, HardConstraint, WithinDayParts};
use crate::services::slot_generator::SlotGenerator;
use crate::services::slot_scorer::SlotScorer;

pub struct SlotFinder {
    scorer: RwLock<SlotScorer>,
    constraints: ConstraintSet,
    default_step_minutes: i64,
    horizon_days: i64,
}

impl SlotFinder {
    pub fn new(
        scorer: SlotScorer,
        constraints: ConstraintSet,
        default_step_minutes: i64,
    ) -> AppResult<Self> {
        if default_step_minutes <= 0 {
            return Err(AppError::validation("step granularity must be positive"));
        }
        Ok(Self {
            scorer: RwLock::new(scorer),
            constraints,
            default_step_minutes,
            horizon_days: DEFAULT_HORIZON_DAYS,
        })
    }

    pub fn with_horizon_days(mut self, days: i64) -> AppResult<Self> {
        if days <= 0 {
            return Err(AppError::validation("horizon must cover at least one day"));
        }
        self.horizon_days = days;
        Ok(self)
    }

    pub fn from_settings(settings: &EngineSettings) -> AppResult<Self> {
        let scorer = SlotScorer::from_settings(settings)?;
        let constraints =
            ConstraintSet::from_specs(&settings.hard_constraints, &settings.soft_constraints)?;
        Self::new(scorer, constraints, settings.step_minutes)?
            .with_horizon_days(settings.horizon_days)
    }

    /// `[now, now + horizon)`, the default search window.
    pub fn horizon_window(&self, now: DateTime<FixedOffset>) -> SearchWindow {
        SearchWindow::new(now, now + Duration::days(self.horizon_days))
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn weights(&self) -> AppResult<ScoreWeights> {
        let guard = self
            .scorer
            .read()
            .map_err(|_| AppError::other("slot scorer lock poisoned"))?;
        Ok(guard.weights())
    }

    pub fn update_weights(&self, update: &ScoreWeightsUpdate) -> AppResult<ScoreWeights> {
        let mut guard = self
            .scorer
            .write()
            .map_err(|_| AppError::other("slot scorer lock poisoned"))?;
        guard.update_weights(update)?;
        Ok(guard.weights())
    }

    /// Candidates for `request`, in generation order.
    pub fn candidates(
        &self,
        request: &SlotRequest,
        context: &SchedulingContext,
    ) -> AppResult<Vec<TimeSlot>> {
        request.validate()?;
        Ok(self.generator_for(request, context)?.candidates().collect())
    }

    pub fn score_slots(
        &self,
        request: &SlotRequest,
        context: &SchedulingContext,
    ) -> AppResult<Vec<ScoredSlot>> {
        self.score_with(request, context, &self.constraints, request.limit)
    }

    pub fn find_best_slot(
        &self,
        request: &SlotRequest,
        context: &SchedulingContext,
    ) -> AppResult<Option<ScoredSlot>> {
        Ok(self
            .score_with(request, context, &self.constraints, Some(1))?
            .into_iter()
            .next())
    }

    /// Earliest slot that passes every hard rule; soft preferences and
    /// quality scores play no part. Stops at the first admissible candidate.
    pub fn next_available_slot(
        &self,
        duration_minutes: i64,
        window: SearchWindow,
        context: &SchedulingContext,
    ) -> AppResult<Option<ScoredSlot>> {
        let request = SlotRequest::new(duration_minutes, window);
        request.validate()?;
        let generator = self.generator_for(&request, context)?;
        let hard = self.hard_rules(&request, &self.constraints);

        let scorer = self
            .scorer
            .read()
            .map_err(|_| AppError::other("slot scorer lock poisoned"))?;
        let mut examined = 0usize;
        let found = generator
            .candidates()
            .inspect(|_| examined += 1)
            .map(|slot| scorer.score_slot(&slot, context, &hard, &[], request.priority))
            .find(ScoredSlot::is_admissible);

        debug!(
            target: "app::scheduler::finder",
            duration = duration_minutes,
            examined,
            found = found.is_some(),
            "next available search finished"
        );
        Ok(found)
    }

    pub fn morning_slot(
        &self,
        duration_minutes: i64,
        priority: Priority,
        window: SearchWindow,
        context: &SchedulingContext,
    ) -> AppResult<Option<ScoredSlot>> {
        let request = SlotRequest::new(duration_minutes, window)
            .with_priority(priority)
            .with_day_parts(DayPartFilter::Morning);
        self.find_best_slot(&request, context)
    }

    pub fn focus_slot(
        &self,
        duration_minutes: i64,
        priority: Priority,
        window: SearchWindow,
        context: &SchedulingContext,
    ) -> AppResult<Option<ScoredSlot>> {
        let request = SlotRequest::new(duration_minutes, window)
            .with_priority(priority)
            .with_day_parts(DayPartFilter::Focus);
        self.find_best_slot(&request, context)
    }

    fn generator_for(
        &self,
        request: &SlotRequest,
        context: &SchedulingContext,
    ) -> AppResult<SlotGenerator> {
        let step = request.step_minutes.unwrap_or(self.default_step_minutes);
        let generator =
            SlotGenerator::new(request.duration_minutes, step, request.window, context.now)?;
        Ok(match &request.day_parts {
            Some(filter) => generator.with_day_parts(filter),
            None => generator,
        })
    }

    fn hard_rules(
        &self,
        request: &SlotRequest,
        constraints: &ConstraintSet,
    ) -> Vec<Arc<dyn HardConstraint>> {
        let mut hard = constraints.hard.clone();
        if let Some(filter) = &request.day_parts {
            hard.push(Arc::new(WithinDayParts::new(filter.clone())));
        }
        hard
    }

    fn score_with(
        &self,
        request: &SlotRequest,
        context: &SchedulingContext,
        constraints: &ConstraintSet,
        limit: Option<usize>,
    ) -> AppResult<Vec<ScoredSlot>> {
        request.validate()?;
        let generator = self.generator_for(request, context)?;

        let hard = self.hard_rules(request, constraints);

        let scorer = self
            .scorer
            .read()
            .map_err(|_| AppError::other("slot scorer lock poisoned"))?;
        let scored = scorer.score_slots(
            generator.candidates(),
            context,
            &hard,
            &constraints.soft,
            request.priority,
            limit,
        );

        debug!(
            target: "app::scheduler::finder",
            duration = request.duration_minutes,
            day_parts = request.day_parts.as_ref().map(DayPartFilter::label).as_deref(),
            returned = scored.len(),
            "slot search finished"
        );
        Ok(scored)
    }
}
