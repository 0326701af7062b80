use crate::error::ConstraintFault;
use crate::models::context::SchedulingContext;
use crate::models::request::{DayPart, DayPartFilter};
use crate::models::slot::TimeSlot;
use crate::services::schedule_utils;

use super::{checked_event, weekly_window_overlap, HardConstraint, HardVerdict};

/// Rejects slots that overlap an existing event of a blocking category.
#[derive(Debug, Clone, Default)]
pub struct NoOverlap {
    blocking_categories: Vec<String>,
}

impl NoOverlap {
    /// An empty list means every category blocks.
    pub fn new(blocking_categories: Vec<String>) -> Self {
        Self {
            blocking_categories,
        }
    }

    pub fn all_categories() -> Self {
        Self::default()
    }

    fn blocks(&self, category: &str) -> bool {
        self.blocking_categories.is_empty()
            || self.blocking_categories.iter().any(|c| c == category)
    }
}

impl HardConstraint for NoOverlap {
    fn name(&self) -> &'static str {
        "no-overlap"
    }

    fn evaluate(
        &self,
        slot: &TimeSlot,
        context: &SchedulingContext,
    ) -> Result<HardVerdict, ConstraintFault> {
        let mut conflicts = Vec::new();
        for event in context.events.iter().filter(|e| self.blocks(&e.category)) {
            checked_event(event)?;
            if slot.start_at() < event.end_at && event.start_at < slot.end_at() {
                conflicts.push(format!("{} ({})", event.id, event.category));
            }
        }

        if conflicts.is_empty() {
            Ok(HardVerdict::Satisfied)
        } else {
            Ok(HardVerdict::Violated(format!(
                "overlaps {}",
                conflicts.join(", ")
            )))
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotInPast;

impl HardConstraint for NotInPast {
    fn name(&self) -> &'static str {
        "not-in-past"
    }

    fn evaluate(
        &self,
        slot: &TimeSlot,
        context: &SchedulingContext,
    ) -> Result<HardVerdict, ConstraintFault> {
        if slot.start_at() < context.now {
            Ok(HardVerdict::Violated(format!(
                "starts at {} which is before now ({})",
                slot.start_at().to_rfc3339(),
                context.now.to_rfc3339()
            )))
        } else {
            Ok(HardVerdict::Satisfied)
        }
    }
}

fn within_any(slot: &TimeSlot, parts: &[DayPart]) -> bool {
    let start_minute = schedule_utils::midnight_minutes_of(slot.start_at());
    let end_minute = start_minute + slot.duration_minutes();
    parts
        .iter()
        .any(|part| part.contains(start_minute, end_minute))
}

/// Keeps slots inside the day parts the caller asked for.
#[derive(Debug, Clone)]
pub struct WithinDayParts {
    filter: DayPartFilter,
    parts: Vec<DayPart>,
}

impl WithinDayParts {
    pub fn new(filter: DayPartFilter) -> Self {
        let parts = filter.windows();
        Self { filter, parts }
    }
}

impl HardConstraint for WithinDayParts {
    fn name(&self) -> &'static str {
        "within-day-parts"
    }

    fn evaluate(
        &self,
        slot: &TimeSlot,
        _context: &SchedulingContext,
    ) -> Result<HardVerdict, ConstraintFault> {
        if within_any(slot, &self.parts) {
            Ok(HardVerdict::Satisfied)
        } else {
            Ok(HardVerdict::Violated(format!(
                "outside the requested {} day parts",
                self.filter.label()
            )))
        }
    }
}

/// Rejects slots touching the user's blocked weekly windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutsideBlockedWindows;

impl HardConstraint for OutsideBlockedWindows {
    fn name(&self) -> &'static str {
        "outside-blocked-windows"
    }

    fn evaluate(
        &self,
        slot: &TimeSlot,
        context: &SchedulingContext,
    ) -> Result<HardVerdict, ConstraintFault> {
        let hits = context
            .blocked_windows
            .iter()
            .filter(|window| weekly_window_overlap(slot, window) > 0)
            .count();

        if hits == 0 {
            Ok(HardVerdict::Satisfied)
        } else {
            Ok(HardVerdict::Violated(format!(
                "falls in {hits} blocked window(s)"
            )))
        }
    }
}

/// Requires the slot to sit inside the context's working hours.
#[derive(Debug, Clone, Copy, Default)]
pub struct WithinWorkingHours;

impl HardConstraint for WithinWorkingHours {
    fn name(&self) -> &'static str {
        "within-working-hours"
    }

    fn evaluate(
        &self,
        slot: &TimeSlot,
        context: &SchedulingContext,
    ) -> Result<HardVerdict, ConstraintFault> {
        let hours = context
            .working_hours
            .ok_or(ConstraintFault::MissingContext("working hours"))?;
        let part = DayPart::new("working-hours", hours.start_minute, hours.end_minute);

        if within_any(slot, std::slice::from_ref(&part)) {
            Ok(HardVerdict::Satisfied)
        } else {
            Ok(HardVerdict::Violated(
                "outside working hours".to_string(),
            ))
        }
    }
}
