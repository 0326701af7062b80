use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::json;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::constraint::{ConstraintKind, ConstraintSpec};
use crate::models::settings::EngineSettings;
use crate::models::weights::ScoreWeightsUpdate;
use crate::services::slot_scorer::{ensure_balance, ensure_timing};

const MAX_STEP_MINUTES: i64 = 24 * 60;
const MAX_HORIZON_DAYS: i64 = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Yaml,
    Json,
}

impl SettingsFormat {
    pub fn from_path(path: &Path) -> AppResult<Self> {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => Ok(SettingsFormat::Yaml),
            Some("json") => Ok(SettingsFormat::Json),
            _ => Err(AppError::config(format!(
                "unsupported settings file extension: {}",
                path.display()
            ))),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SettingsUpdateInput {
    pub weights: Option<ScoreWeightsUpdate>,
    pub decay_per_period: Option<f64>,
    pub max_deviation_minutes: Option<f64>,
    pub step_minutes: Option<i64>,
    pub horizon_days: Option<i64>,
}

/// Engine settings backed by an optional YAML/JSON file, cached after first read.
pub struct SettingsService {
    path: Option<PathBuf>,
    cache: RwLock<Option<EngineSettings>>,
}

impl SettingsService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            cache: RwLock::new(None),
        }
    }

    pub fn in_memory(settings: EngineSettings) -> AppResult<Self> {
        let settings = validate_settings(settings)?;
        Ok(Self {
            path: None,
            cache: RwLock::new(Some(settings)),
        })
    }

    pub fn get(&self) -> AppResult<EngineSettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return Ok(settings.clone());
            }
        }

        let settings = match &self.path {
            Some(path) if path.exists() => load_from_path(path)?,
            Some(path) => {
                warn!(
                    target: "app::config",
                    path = %path.display(),
                    "settings file not found, using defaults"
                );
                EngineSettings::default()
            }
            None => EngineSettings::default(),
        };

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    pub fn update(&self, input: SettingsUpdateInput) -> AppResult<EngineSettings> {
        let mut current = self.get()?;

        if let Some(update) = input.weights.as_ref() {
            current.weights = current.weights.merged(update)?;
        }
        if let Some(decay) = input.decay_per_period {
            current.timing.decay_per_period = decay;
        }
        if let Some(max_deviation) = input.max_deviation_minutes {
            current.balance.max_deviation_minutes = max_deviation;
        }
        if let Some(step) = input.step_minutes {
            current.step_minutes = step;
        }
        if let Some(days) = input.horizon_days {
            current.horizon_days = days;
        }

        let validated = validate_settings(current)?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(validated.clone());
        }
        info!(target: "app::config", "engine settings updated");
        Ok(validated)
    }

    /// Writes the cached settings back to the backing file, if any.
    pub fn save(&self) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let settings = self.get()?;
        let raw = match SettingsFormat::from_path(path)? {
            SettingsFormat::Yaml => serde_yaml::to_string(&settings)?,
            SettingsFormat::Json => serde_json::to_string_pretty(&settings)?,
        };
        std::fs::write(path, raw)?;
        info!(target: "app::config", path = %path.display(), "engine settings saved");
        Ok(())
    }
}

pub fn load_from_path(path: &Path) -> AppResult<EngineSettings> {
    let format = SettingsFormat::from_path(path)?;
    let raw = std::fs::read_to_string(path)?;
    let settings = parse_settings(&raw, format)?;
    info!(
        target: "app::config",
        path = %path.display(),
        hard = settings.hard_constraints.len(),
        soft = settings.soft_constraints.len(),
        "engine settings loaded"
    );
    Ok(settings)
}

pub fn parse_settings(raw: &str, format: SettingsFormat) -> AppResult<EngineSettings> {
    let settings: EngineSettings = match format {
        SettingsFormat::Yaml => serde_yaml::from_str(raw)
            .map_err(|err| AppError::config(format!("invalid yaml settings: {err}")))?,
        SettingsFormat::Json => serde_json::from_str(raw)
            .map_err(|err| AppError::config(format!("invalid json settings: {err}")))?,
    };
    validate_settings(settings)
}

/// Checks every field and returns the settings with normalized weights.
pub fn validate_settings(mut settings: EngineSettings) -> AppResult<EngineSettings> {
    settings.weights = settings.weights.normalized()?;
    ensure_timing(&settings.timing)?;
    ensure_balance(&settings.balance)?;

    if !(1..=MAX_STEP_MINUTES).contains(&settings.step_minutes) {
        return Err(AppError::validation_with_details(
            "step minutes must be between 1 and 1440",
            json!({"stepMinutes": settings.step_minutes}),
        ));
    }
    if !(1..=MAX_HORIZON_DAYS).contains(&settings.horizon_days) {
        return Err(AppError::validation_with_details(
            "horizon days must be between 1 and 366",
            json!({"horizonDays": settings.horizon_days}),
        ));
    }

    ensure_specs(&settings.hard_constraints, ConstraintKind::Hard)?;
    ensure_specs(&settings.soft_constraints, ConstraintKind::Soft)?;
    Ok(settings)
}

fn ensure_specs(specs: &[ConstraintSpec], expected: ConstraintKind) -> AppResult<()> {
    for spec in specs {
        if spec.kind() != expected {
            return Err(AppError::config(format!(
                "{spec:?} listed under {expected} constraints but is {}",
                spec.kind()
            )));
        }
        spec.validate()?;
    }
    Ok(())
}
