use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

use crate::error::{AppError, AppResult};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Scheduling urgency, 1 (most urgent) through 5.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const LOWEST: Priority = Priority(5);

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Lead time within which a slot counts as ideally timed.
    pub fn ideal_lead_hours(&self) -> f64 {
        match self.0 {
            1 => 4.0,
            2 => 24.0,
            3 => 72.0,
            4 => 168.0,
            _ => 336.0,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority(3)
    }
}

impl TryFrom<u8> for Priority {
    type Error = AppError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=5).contains(&value) {
            Ok(Priority(value))
        } else {
            Err(AppError::validation_with_details(
                "priority must be between 1 and 5",
                json!({"priority": value}),
            ))
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A named daily window, in minutes from local midnight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayPart {
    pub name: String,
    pub start_minute: u32,
    pub end_minute: u32,
}

impl DayPart {
    pub fn new(name: impl Into<String>, start_minute: u32, end_minute: u32) -> Self {
        Self {
            name: name.into(),
            start_minute,
            end_minute,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.start_minute >= self.end_minute || self.end_minute > MINUTES_PER_DAY {
            return Err(AppError::validation_with_details(
                "day part must satisfy start < end <= 24:00",
                json!({
                    "name": self.name,
                    "startMinute": self.start_minute,
                    "endMinute": self.end_minute,
                }),
            ));
        }
        Ok(())
    }

    /// True when `[start, end)` (minutes from midnight) lies inside this window.
    pub fn contains(&self, start_minute: i64, end_minute: i64) -> bool {
        start_minute >= i64::from(self.start_minute) && end_minute <= i64::from(self.end_minute)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DayPartFilter {
    /// 09:00-12:00
    Morning,
    /// 13:00-17:00
    Afternoon,
    /// 09:00-11:00 and 14:00-16:00
    Focus,
    /// 09:00-18:00
    WorkingHours,
    Custom(Vec<DayPart>),
}

impl DayPartFilter {
    pub fn windows(&self) -> Vec<DayPart> {
        match self {
            DayPartFilter::Morning => vec![DayPart::new("morning", 9 * 60, 12 * 60)],
            DayPartFilter::Afternoon => vec![DayPart::new("afternoon", 13 * 60, 17 * 60)],
            DayPartFilter::Focus => vec![
                DayPart::new("focus-am", 9 * 60, 11 * 60),
                DayPart::new("focus-pm", 14 * 60, 16 * 60),
            ],
            DayPartFilter::WorkingHours => vec![DayPart::new("working-hours", 9 * 60, 18 * 60)],
            DayPartFilter::Custom(parts) => parts.clone(),
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        let windows = self.windows();
        if windows.is_empty() {
            return Err(AppError::validation("day-part filter has no windows"));
        }
        windows.iter().try_for_each(DayPart::validate)
    }

    pub fn label(&self) -> String {
        match self {
            DayPartFilter::Morning => "morning".to_string(),
            DayPartFilter::Afternoon => "afternoon".to_string(),
            DayPartFilter::Focus => "focus".to_string(),
            DayPartFilter::WorkingHours => "working-hours".to_string(),
            DayPartFilter::Custom(parts) => parts
                .iter()
                .map(|part| part.name.as_str())
                .collect::<Vec<_>>()
                .join("+"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchWindow {
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
}

impl SearchWindow {
    pub fn new(start_at: DateTime<FixedOffset>, end_at: DateTime<FixedOffset>) -> Self {
        Self { start_at, end_at }
    }
}

/// What the UI/assistant layer asks for when it needs a place for an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub duration_minutes: i64,
    #[serde(default)]
    pub priority: Priority,
    pub window: SearchWindow,
    #[serde(default)]
    pub day_parts: Option<DayPartFilter>,
    #[serde(default)]
    pub step_minutes: Option<i64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SlotRequest {
    pub fn new(duration_minutes: i64, window: SearchWindow) -> Self {
        Self {
            duration_minutes,
            priority: Priority::default(),
            window,
            day_parts: None,
            step_minutes: None,
            limit: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_day_parts(mut self, filter: DayPartFilter) -> Self {
        self.day_parts = Some(filter);
        self
    }

    pub fn with_step_minutes(mut self, step: i64) -> Self {
        self.step_minutes = Some(step);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.duration_minutes <= 0 {
            return Err(AppError::validation_with_details(
                "duration must be positive",
                json!({"durationMinutes": self.duration_minutes}),
            ));
        }
        if self.window.end_at < self.window.start_at {
            return Err(AppError::validation_with_details(
                "search window ends before it starts",
                json!({
                    "startAt": self.window.start_at.to_rfc3339(),
                    "endAt": self.window.end_at.to_rfc3339(),
                }),
            ));
        }
        if let Some(step) = self.step_minutes {
            if step <= 0 {
                return Err(AppError::validation_with_details(
                    "step granularity must be positive",
                    json!({"stepMinutes": step}),
                ));
            }
        }
        if let Some(filter) = &self.day_parts {
            filter.validate()?;
        }
        Ok(())
    }
}
