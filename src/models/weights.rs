use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};

/// Weighting coefficients of the four scoring dimensions. Always sum to 1.0
/// once they leave [`ScoreWeights::normalized`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreWeights {
    pub constraints: f64,
    pub energy: f64,
    pub timing: f64,
    pub balance: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            constraints: 0.40,
            energy: 0.25,
            timing: 0.20,
            balance: 0.15,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.constraints + self.energy + self.timing + self.balance
    }

    /// Rescales every weight so the set sums to 1.0.
    pub fn normalized(self) -> AppResult<Self> {
        for (name, value) in [
            ("constraints", self.constraints),
            ("energy", self.energy),
            ("timing", self.timing),
            ("balance", self.balance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::validation_with_details(
                    "weights must be finite and non-negative",
                    json!({"weight": name, "value": value}),
                ));
            }
        }

        let total = self.sum();
        if total <= 0.0 {
            return Err(AppError::validation("at least one weight must be positive"));
        }

        Ok(Self {
            constraints: self.constraints / total,
            energy: self.energy / total,
            timing: self.timing / total,
            balance: self.balance / total,
        })
    }

    /// Merges a partial update over the current weights and renormalizes.
    pub fn merged(self, update: &ScoreWeightsUpdate) -> AppResult<Self> {
        Self {
            constraints: update.constraints.unwrap_or(self.constraints),
            energy: update.energy.unwrap_or(self.energy),
            timing: update.timing.unwrap_or(self.timing),
            balance: update.balance.unwrap_or(self.balance),
        }
        .normalized()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScoreWeightsUpdate {
    #[serde(default)]
    pub constraints: Option<f64>,
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default)]
    pub timing: Option<f64>,
    #[serde(default)]
    pub balance: Option<f64>,
}
