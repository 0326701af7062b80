use serde::{Deserialize, Serialize};

use crate::models::constraint::ConstraintSpec;
use crate::models::weights::ScoreWeights;

pub const DEFAULT_DECAY_PER_PERIOD: f64 = 0.95;
pub const DEFAULT_MAX_DEVIATION_MINUTES: f64 = 240.0;
pub const DEFAULT_STEP_MINUTES: i64 = 30;
pub const DEFAULT_HORIZON_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TimingParams {
    /// Multiplier applied per ideal period a slot lies beyond its ideal lead time.
    pub decay_per_period: f64,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            decay_per_period: DEFAULT_DECAY_PER_PERIOD,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceParams {
    /// Deviation from the weekly daily average at which the balance score hits zero.
    pub max_deviation_minutes: f64,
}

impl Default for BalanceParams {
    fn default() -> Self {
        Self {
            max_deviation_minutes: DEFAULT_MAX_DEVIATION_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    pub weights: ScoreWeights,
    pub timing: TimingParams,
    pub balance: BalanceParams,
    pub step_minutes: i64,
    pub horizon_days: i64,
    pub hard_constraints: Vec<ConstraintSpec>,
    pub soft_constraints: Vec<ConstraintSpec>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            timing: TimingParams::default(),
            balance: BalanceParams::default(),
            step_minutes: DEFAULT_STEP_MINUTES,
            horizon_days: DEFAULT_HORIZON_DAYS,
            hard_constraints: vec![
                ConstraintSpec::NoOverlap {
                    blocking_categories: Vec::new(),
                },
                ConstraintSpec::NotInPast,
                ConstraintSpec::OutsideBlockedWindows,
            ],
            soft_constraints: Vec::new(),
        }
    }
}
