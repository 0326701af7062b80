use chrono::Duration;

use crate::error::ConstraintFault;
use crate::models::context::{SchedulingContext, WeeklyWindow};
use crate::models::slot::TimeSlot;
use crate::services::schedule_utils;

use super::{checked_event, gap_minutes, weekly_window_overlap, SoftConstraint, SoftVerdict};

/// Light penalty for sitting too close to another event of the same category.
/// Scales linearly from the full penalty (touching) to zero (at `min_gap_minutes`).
#[derive(Debug, Clone)]
pub struct SameCategoryProximity {
    category: String,
    min_gap_minutes: i64,
    penalty: f64,
}

impl SameCategoryProximity {
    pub fn new(category: impl Into<String>, min_gap_minutes: i64, penalty: f64) -> Self {
        Self {
            category: category.into(),
            min_gap_minutes,
            penalty,
        }
    }
}

impl SoftConstraint for SameCategoryProximity {
    fn name(&self) -> &'static str {
        "same-category-proximity"
    }

    fn evaluate(
        &self,
        slot: &TimeSlot,
        context: &SchedulingContext,
    ) -> Result<SoftVerdict, ConstraintFault> {
        let mut closest: Option<(i64, &str)> = None;
        for event in context.events.iter().filter(|e| e.category == self.category) {
            checked_event(event)?;
            let gap = gap_minutes(slot, event);
            if gap < self.min_gap_minutes && closest.map_or(true, |(best, _)| gap < best) {
                closest = Some((gap, event.id.as_str()));
            }
        }

        Ok(match closest {
            Some((gap, id)) => {
                let shortfall = (self.min_gap_minutes - gap) as f64 / self.min_gap_minutes as f64;
                SoftVerdict::penalize(
                    self.penalty * shortfall,
                    format!(
                        "{gap} min from {} event {id} (wants {} min)",
                        self.category, self.min_gap_minutes
                    ),
                )
            }
            None => SoftVerdict::none(),
        })
    }
}

/// Moderate penalty proportional to the share of the slot outside preferred hours.
#[derive(Debug, Clone)]
pub struct PreferredHours {
    start_minute: u32,
    end_minute: u32,
    penalty: f64,
}

impl PreferredHours {
    pub fn new(start_minute: u32, end_minute: u32, penalty: f64) -> Self {
        Self {
            start_minute,
            end_minute,
            penalty,
        }
    }
}

impl SoftConstraint for PreferredHours {
    fn name(&self) -> &'static str {
        "preferred-hours"
    }

    fn evaluate(
        &self,
        slot: &TimeSlot,
        _context: &SchedulingContext,
    ) -> Result<SoftVerdict, ConstraintFault> {
        let day = schedule_utils::start_of_day(slot.start_at());
        let preferred_start = day + Duration::minutes(i64::from(self.start_minute));
        let preferred_end = day + Duration::minutes(i64::from(self.end_minute));
        let inside = schedule_utils::overlap_minutes(
            slot.start_at(),
            slot.end_at(),
            preferred_start,
            preferred_end,
        );
        let outside = slot.duration_minutes() - inside;
        if outside <= 0 {
            return Ok(SoftVerdict::none());
        }

        let fraction = outside as f64 / slot.duration_minutes() as f64;
        Ok(SoftVerdict::penalize(
            self.penalty * fraction,
            format!("{outside} min outside preferred hours"),
        ))
    }
}

/// Penalty proportional to the share of the slot inside windows the user
/// would rather keep free.
#[derive(Debug, Clone)]
pub struct AvoidWindows {
    windows: Vec<WeeklyWindow>,
    penalty: f64,
}

impl AvoidWindows {
    pub fn new(windows: Vec<WeeklyWindow>, penalty: f64) -> Self {
        Self { windows, penalty }
    }
}

impl SoftConstraint for AvoidWindows {
    fn name(&self) -> &'static str {
        "avoid-windows"
    }

    fn evaluate(
        &self,
        slot: &TimeSlot,
        _context: &SchedulingContext,
    ) -> Result<SoftVerdict, ConstraintFault> {
        let overlap: i64 = self
            .windows
            .iter()
            .map(|window| weekly_window_overlap(slot, window))
            .sum();
        if overlap == 0 {
            return Ok(SoftVerdict::none());
        }

        let fraction = (overlap as f64 / slot.duration_minutes() as f64).min(1.0);
        Ok(SoftVerdict::penalize(
            self.penalty * fraction,
            format!("{overlap} min inside avoided windows"),
        ))
    }
}

/// Penalizes slots that leave less than `buffer_minutes` around any event.
#[derive(Debug, Clone)]
pub struct BufferAroundEvents {
    buffer_minutes: i64,
    penalty: f64,
}

impl BufferAroundEvents {
    pub fn new(buffer_minutes: i64, penalty: f64) -> Self {
        Self {
            buffer_minutes,
            penalty,
        }
    }
}

impl SoftConstraint for BufferAroundEvents {
    fn name(&self) -> &'static str {
        "buffer-around-events"
    }

    fn evaluate(
        &self,
        slot: &TimeSlot,
        context: &SchedulingContext,
    ) -> Result<SoftVerdict, ConstraintFault> {
        let mut tightest: Option<i64> = None;
        for event in &context.events {
            checked_event(event)?;
            let gap = gap_minutes(slot, event);
            if gap < self.buffer_minutes {
                tightest = Some(tightest.map_or(gap, |current| current.min(gap)));
            }
        }

        Ok(match tightest {
            Some(gap) => {
                let shortfall = (self.buffer_minutes - gap) as f64 / self.buffer_minutes as f64;
                SoftVerdict::penalize(
                    self.penalty * shortfall,
                    format!("only {gap} min of buffer (wants {})", self.buffer_minutes),
                )
            }
            None => SoftVerdict::none(),
        })
    }
}
