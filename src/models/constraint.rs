use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::context::WeeklyWindow;
use crate::models::request::DayPartFilter;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    Hard,
    Soft,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Hard => "hard",
            ConstraintKind::Soft => "soft",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of a scheduling rule, as found in settings files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConstraintSpec {
    #[serde(rename_all = "camelCase")]
    NoOverlap {
        /// Categories that block a slot. Empty means every category blocks.
        #[serde(default)]
        blocking_categories: Vec<String>,
    },
    NotInPast,
    #[serde(rename_all = "camelCase")]
    WithinDayParts { filter: DayPartFilter },
    OutsideBlockedWindows,
    WithinWorkingHours,
    #[serde(rename_all = "camelCase")]
    SameCategoryProximity {
        category: String,
        #[serde(default = "default_proximity_gap")]
        min_gap_minutes: i64,
        #[serde(default = "default_light_penalty")]
        penalty: f64,
    },
    #[serde(rename_all = "camelCase")]
    PreferredHours {
        start_minute: u32,
        end_minute: u32,
        #[serde(default = "default_moderate_penalty")]
        penalty: f64,
    },
    #[serde(rename_all = "camelCase")]
    AvoidWindows {
        windows: Vec<WeeklyWindow>,
        #[serde(default = "default_avoid_penalty")]
        penalty: f64,
    },
    #[serde(rename_all = "camelCase")]
    BufferAroundEvents {
        buffer_minutes: i64,
        #[serde(default = "default_light_penalty")]
        penalty: f64,
    },
}

impl ConstraintSpec {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            ConstraintSpec::NoOverlap { .. }
            | ConstraintSpec::NotInPast
            | ConstraintSpec::WithinDayParts { .. }
            | ConstraintSpec::OutsideBlockedWindows
            | ConstraintSpec::WithinWorkingHours => ConstraintKind::Hard,
            ConstraintSpec::SameCategoryProximity { .. }
            | ConstraintSpec::PreferredHours { .. }
            | ConstraintSpec::AvoidWindows { .. }
            | ConstraintSpec::BufferAroundEvents { .. } => ConstraintKind::Soft,
        }
    }
}

fn default_proximity_gap() -> i64 {
    15
}

fn default_light_penalty() -> f64 {
    10.0
}

fn default_moderate_penalty() -> f64 {
    25.0
}

fn default_avoid_penalty() -> f64 {
    30.0
}
