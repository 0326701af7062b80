//! Candidate slot enumeration.
//!
//! One stepping loop serves every search shape: a plain horizon scan, a
//! morning-only search, a focus-block search, or any custom set of daily
//! windows. Slots always lie inside `[max(now, window start), window end]`.

use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Duration, FixedOffset};
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::request::{DayPart, DayPartFilter, SearchWindow};
use crate::models::slot::TimeSlot;
use crate::services::schedule_utils;

#[derive(Debug, Clone)]
pub struct SlotGenerator {
    duration: Duration,
    step: Duration,
    step_minutes: i64,
    range_start: DateTime<FixedOffset>,
    range_end: DateTime<FixedOffset>,
    day_parts: Option<Vec<DayPart>>,
}

impl SlotGenerator {
    pub fn new(
        duration_minutes: i64,
        step_minutes: i64,
        window: SearchWindow,
        now: DateTime<FixedOffset>,
    ) -> AppResult<Self> {
        if duration_minutes <= 0 {
            return Err(AppError::validation_with_details(
                "duration must be positive",
                json!({"durationMinutes": duration_minutes}),
            ));
        }
        if step_minutes <= 0 {
            return Err(AppError::validation_with_details(
                "step granularity must be positive",
                json!({"stepMinutes": step_minutes}),
            ));
        }
        if window.end_at < window.start_at {
            return Err(AppError::validation("search window ends before it starts"));
        }

        Ok(Self {
            duration: Duration::minutes(duration_minutes),
            step: Duration::minutes(step_minutes),
            step_minutes,
            range_start: window.start_at.max(now),
            range_end: window.end_at,
            day_parts: None,
        })
    }

    pub fn with_day_parts(mut self, filter: &DayPartFilter) -> Self {
        let mut windows = filter.windows();
        windows.sort_by_key(|part| (part.start_minute, part.end_minute));
        self.day_parts = Some(windows);
        self
    }

    pub fn candidates(&self) -> CandidateSlots<'_> {
        let fits = self.range_end.signed_duration_since(self.range_start) >= self.duration;
        let cursor = if !fits {
            None
        } else if self.day_parts.is_some() {
            Some(schedule_utils::start_of_day(self.range_start))
        } else {
            schedule_utils::round_up_to_step(self.range_start, self.step_minutes).ok()
        };

        CandidateSlots {
            generator: self,
            cursor,
            pending: VecDeque::new(),
        }
    }

    fn fits(&self, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> bool {
        start >= self.range_start && end <= self.range_end
    }

    /// Slots for every day-part window of the day starting at `day_start`,
    /// deduplicated by start instant and in chronological order.
    fn day_slots(&self, parts: &[DayPart], day_start: DateTime<FixedOffset>) -> Vec<TimeSlot> {
        let mut starts = BTreeSet::new();
        for part in parts {
            let window_start = day_start + Duration::minutes(i64::from(part.start_minute));
            let window_end = day_start + Duration::minutes(i64::from(part.end_minute));
            let mut start = window_start;
            while start + self.duration <= window_end {
                if self.fits(start, start + self.duration) {
                    starts.insert(start);
                }
                start += self.step;
            }
        }

        starts
            .into_iter()
            .filter_map(|start| TimeSlot::new(start, start + self.duration).ok())
            .collect()
    }
}

/// Lazy, finite sequence of candidates produced by a [`SlotGenerator`].
pub struct CandidateSlots<'a> {
    generator: &'a SlotGenerator,
    cursor: Option<DateTime<FixedOffset>>,
    pending: VecDeque<TimeSlot>,
}

impl Iterator for CandidateSlots<'_> {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<Self::Item> {
        let generator = self.generator;
        match &generator.day_parts {
            None => {
                let start = self.cursor?;
                let end = start.checked_add_signed(generator.duration)?;
                if end > generator.range_end {
                    self.cursor = None;
                    return None;
                }
                self.cursor = start.checked_add_signed(generator.step);
                TimeSlot::new(start, end).ok()
            }
            Some(parts) => loop {
                if let Some(slot) = self.pending.pop_front() {
                    return Some(slot);
                }
                let day_start = self.cursor?;
                if day_start > generator.range_end {
                    self.cursor = None;
                    return None;
                }
                self.pending.extend(generator.day_slots(parts, day_start));
                self.cursor = day_start.checked_add_signed(Duration::days(1));
            },
        }
    }
}
