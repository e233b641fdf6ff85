//! Calculator configuration
//!
//! Every constant the engines use has a default matching the published
//! calculator behavior. A JSON file can override any subset of them; missing
//! sections and fields fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::clock::WallClock;
use crate::error::{CalcError, Result};

/// Default sleep cycle length in minutes
pub const DEFAULT_CYCLE_MINUTES: u32 = 90;

/// Default time to fall asleep in minutes
pub const DEFAULT_LATENCY_MINUTES: u32 = 15;

/// Default caffeine half-life in hours
pub const DEFAULT_HALF_LIFE_HOURS: f64 = 5.0;

/// Candidate waits after the last dose, in hours
pub const DEFAULT_WAIT_HOURS: [f64; 4] = [6.0, 8.0, 10.0, 12.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepSettings {
    pub cycle_minutes: u32,
    pub latency_minutes: u32,
    /// Cycle range enumerated when no age is given
    pub default_min_cycles: u32,
    pub default_max_cycles: u32,
    /// Bounds on the widened range enumerated for an age band
    pub min_enumerated_cycles: u32,
    pub max_enumerated_cycles: u32,
}

impl Default for SleepSettings {
    fn default() -> Self {
        Self {
            cycle_minutes: DEFAULT_CYCLE_MINUTES,
            latency_minutes: DEFAULT_LATENCY_MINUTES,
            default_min_cycles: 4,
            default_max_cycles: 7,
            min_enumerated_cycles: 3,
            max_enumerated_cycles: 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaffeineSettings {
    pub half_life_hours: f64,
    pub wait_hours: Vec<f64>,
    /// Level considered low enough not to disturb sleep (mg)
    pub sleep_threshold_mg: f64,
}

impl Default for CaffeineSettings {
    fn default() -> Self {
        Self {
            half_life_hours: DEFAULT_HALF_LIFE_HOURS,
            wait_hours: DEFAULT_WAIT_HOURS.to_vec(),
            sleep_threshold_mg: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JetLagSettings {
    pub baseline_bedtime: WallClock,
    pub baseline_waketime: WallClock,
    /// Shift applied per preparation day (minutes)
    pub daily_shift_minutes: i64,
    pub max_preparation_days: u32,
    pub min_recovery_days: u32,
    pub max_recovery_days: u32,
}

impl Default for JetLagSettings {
    fn default() -> Self {
        Self {
            baseline_bedtime: WallClock::from_hm(22, 0),
            baseline_waketime: WallClock::from_hm(7, 0),
            daily_shift_minutes: 60,
            max_preparation_days: 5,
            min_recovery_days: 2,
            max_recovery_days: 14,
        }
    }
}

/// Configuration for all three calculators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub sleep: SleepSettings,
    pub caffeine: CaffeineSettings,
    pub jet_lag: JetLagSettings,
}

impl CalculatorConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: CalculatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings the engines cannot work with
    pub fn validate(&self) -> Result<()> {
        let sleep = &self.sleep;
        if sleep.cycle_minutes == 0 {
            return Err(CalcError::InvalidConfig("sleep.cycle_minutes must be positive".into()));
        }
        if sleep.default_min_cycles > sleep.default_max_cycles {
            return Err(CalcError::InvalidConfig(
                "sleep.default_min_cycles exceeds sleep.default_max_cycles".into(),
            ));
        }
        if sleep.min_enumerated_cycles > sleep.max_enumerated_cycles {
            return Err(CalcError::InvalidConfig(
                "sleep.min_enumerated_cycles exceeds sleep.max_enumerated_cycles".into(),
            ));
        }

        let caffeine = &self.caffeine;
        if !(caffeine.half_life_hours.is_finite() && caffeine.half_life_hours > 0.0) {
            return Err(CalcError::InvalidConfig(format!(
                "caffeine.half_life_hours must be a positive number, got {}",
                caffeine.half_life_hours
            )));
        }
        if caffeine.wait_hours.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CalcError::InvalidConfig(
                "caffeine.wait_hours must be non-negative numbers".into(),
            ));
        }
        if !(caffeine.sleep_threshold_mg.is_finite() && caffeine.sleep_threshold_mg > 0.0) {
            return Err(CalcError::InvalidConfig(
                "caffeine.sleep_threshold_mg must be positive".into(),
            ));
        }

        let jet_lag = &self.jet_lag;
        if jet_lag.min_recovery_days > jet_lag.max_recovery_days {
            return Err(CalcError::InvalidConfig(
                "jet_lag.min_recovery_days exceeds jet_lag.max_recovery_days".into(),
            ));
        }

        Ok(())
    }
}
