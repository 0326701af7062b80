use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// Energy-over-the-day profile reported by the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Chronotype {
    Morning,
    Evening,
    #[default]
    Balanced,
}

impl Chronotype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chronotype::Morning => "morning",
            Chronotype::Evening => "evening",
            Chronotype::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Chronotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Chronotype {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "morning" => Ok(Chronotype::Morning),
            "evening" => Ok(Chronotype::Evening),
            "balanced" => Ok(Chronotype::Balanced),
            other => Err(AppError::validation(format!(
                "unsupported chronotype: {other}"
            ))),
        }
    }
}

/// A materialized event instance supplied by calendar storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    pub category: String,
}

impl CalendarEvent {
    pub fn new(
        id: impl Into<String>,
        start_at: DateTime<FixedOffset>,
        end_at: DateTime<FixedOffset>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            start_at,
            end_at,
            category: category.into(),
        }
    }
}

/// A recurring weekly window, `weekday` counted from Monday = 0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyWindow {
    pub weekday: u32,
    pub start_minute: u32,
    pub end_minute: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub start_minute: u32,
    pub end_minute: u32,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start_minute: 9 * 60,
            end_minute: 18 * 60,
        }
    }
}

/// Read-only snapshot of everything the engine needs to know about the user.
///
/// All instants are expected in a single reference offset; `now` anchors
/// past-slot rejection and the timing dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingContext {
    pub now: DateTime<FixedOffset>,
    #[serde(default)]
    pub events: Vec<CalendarEvent>,
    #[serde(default)]
    pub chronotype: Chronotype,
    #[serde(default)]
    pub blocked_windows: Vec<WeeklyWindow>,
    #[serde(default)]
    pub working_hours: Option<WorkingHours>,
}

impl SchedulingContext {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now,
            events: Vec::new(),
            chronotype: Chronotype::default(),
            blocked_windows: Vec::new(),
            working_hours: None,
        }
    }

    pub fn with_events(mut self, events: Vec<CalendarEvent>) -> Self {
        self.events = events;
        self
    }

    pub fn with_chronotype(mut self, chronotype: Chronotype) -> Self {
        self.chronotype = chronotype;
        self
    }

    pub fn with_blocked_windows(mut self, windows: Vec<WeeklyWindow>) -> Self {
        self.blocked_windows = windows;
        self
    }

    pub fn with_working_hours(mut self, hours: WorkingHours) -> Self {
        self.working_hours = Some(hours);
        self
    }
}
