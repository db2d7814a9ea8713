use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::Signal;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub risk_bands: RiskBands,
    pub blood_pressure: BloodPressureCutoffs,
    pub weights: SymptomWeights,
    pub trend: TrendConfig,
    pub symptom_flag_severity: SymptomFlagSeverity,
    pub safety: SafetyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskBands {
    pub moderate: f64,
    pub high: f64,
}

impl Default for RiskBands {
    fn default() -> Self {
        Self {
            moderate: 30.0,
            high: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloodPressureCutoffs {
    pub high_systolic: u16,
    pub high_diastolic: u16,
    pub moderate_systolic: u16,
    pub moderate_diastolic: u16,
}

impl Default for BloodPressureCutoffs {
    fn default() -> Self {
        Self {
            high_systolic: 140,
            high_diastolic: 90,
            moderate_systolic: 130,
            moderate_diastolic: 85,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymptomWeights {
    pub headache: f64,
    pub swelling: f64,
    pub sleep_quality: f64,
    pub fatigue: f64,
    pub mood: f64,
    pub dizziness: f64,
}

impl Default for SymptomWeights {
    fn default() -> Self {
        Self {
            headache: 22.0,
            swelling: 22.0,
            sleep_quality: 12.0,
            fatigue: 14.0,
            mood: 12.0,
            dizziness: 18.0,
        }
    }
}

impl SymptomWeights {
    pub fn weight(&self, signal: Signal) -> f64 {
        match signal {
            Signal::Headache => self.headache,
            Signal::Swelling => self.swelling,
            Signal::SleepQuality => self.sleep_quality,
            Signal::Fatigue => self.fatigue,
            Signal::Mood => self.mood,
            Signal::Dizziness => self.dizziness,
            Signal::BloodPressure => 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        Signal::SYMPTOMS.iter().map(|signal| self.weight(*signal)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Largest gap between consecutive check-ins that still counts as a trend.
    pub max_gap_weeks: u32,
    pub min_prior_weeks: usize,
    pub min_rising_signals: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            max_gap_weeks: 3,
            min_prior_weeks: 2,
            min_rising_signals: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymptomFlagSeverity(pub u8);

impl Default for SymptomFlagSeverity {
    fn default() -> Self {
        Self(4)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    pub negative_streak_threshold: usize,
    pub preview_debounce_ms: u64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            negative_streak_threshold: 3,
            preview_debounce_ms: 500,
        }
    }
}

impl SafetyConfig {
    pub fn preview_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }
}

impl EngineConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bands = &self.risk_bands;
        if !(0.0 < bands.moderate && bands.moderate < bands.high && bands.high <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "risk bands must satisfy 0 < moderate < high <= 100, got {} and {}",
                bands.moderate, bands.high
            )));
        }

        let bp = &self.blood_pressure;
        if bp.moderate_systolic >= bp.high_systolic || bp.moderate_diastolic >= bp.high_diastolic {
            return Err(ConfigError::Invalid(
                "moderate blood pressure cutoffs must sit below the high cutoffs".to_string(),
            ));
        }

        if let Some(signal) = Signal::SYMPTOMS
            .iter()
            .find(|signal| self.weights.weight(**signal) < 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "weight for {} must not be negative",
                signal.label()
            )));
        }
        if self.weights.total() <= 0.0 {
            return Err(ConfigError::Invalid(
                "symptom weights must not all be zero".to_string(),
            ));
        }

        if self.trend.min_prior_weeks == 0 || self.trend.min_rising_signals == 0 {
            return Err(ConfigError::Invalid(
                "trend windows need at least one prior week and one rising signal".to_string(),
            ));
        }

        if self.safety.negative_streak_threshold == 0 {
            return Err(ConfigError::Invalid(
                "negative_streak_threshold must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
