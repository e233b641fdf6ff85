//! Request API
//!
//! This module is the boundary callers talk to. Requests carry raw strings
//! (times, dates) exactly as a form would submit them; parsing happens here so
//! that format errors surface as [`CalcError`] values. Reports are plain
//! serializable records.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::caffeine::CaffeineCalculator;
use crate::clock::WallClock;
use crate::config::CalculatorConfig;
use crate::error::{CalcError, Result};
use crate::jetlag::{parse_date, JetLagCalculator, JetLagTrip, TimeZoneOffset};
use crate::sleep::{recommendation_for_age, SleepCycleCalculator};
use crate::types::{
    AgeSleepRecommendation, CaffeineBedtimeOption, CaffeineIntake, CycleDirection, JetLagPlan,
    SleepCycleOption,
};

/// Sleep calculator input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepRequest {
    /// Wake time or bedtime, `"HH:MM"` or `"h:mm AM/PM"`
    pub anchor: String,
    #[serde(default = "default_direction")]
    pub direction: CycleDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_years: Option<f64>,
}

fn default_direction() -> CycleDirection {
    CycleDirection::FromWake
}

#[derive(Debug, Clone, Serialize)]
pub struct SleepReport {
    pub anchor: WallClock,
    pub direction: CycleDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_recommendation: Option<AgeSleepRecommendation>,
    pub options: Vec<SleepCycleOption>,
}

/// One dose as entered by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeRequest {
    pub amount_mg: f64,
    pub time: String,
}

/// Caffeine calculator input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaffeineRequest {
    #[serde(default)]
    pub intakes: Vec<IntakeRequest>,
    pub query_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaffeineReport {
    pub query_time: WallClock,
    pub remaining_mg: f64,
    pub total_intake_mg: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_intake_time: Option<WallClock>,
    pub bedtime_options: Vec<CaffeineBedtimeOption>,
    /// Hours after the query time until the level drops below the sleep threshold
    pub hours_until_sleep_safe: f64,
    pub sleep_safe_at: WallClock,
}

/// Jet lag calculator input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JetLagRequest {
    pub from_offset: TimeZoneOffset,
    pub to_offset: TimeZoneOffset,
    /// `YYYY-MM-DD`
    pub departure_date: String,
    pub departure_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
}

/// Convert a sleep request JSON into a sleep report JSON.
///
/// # Example
/// ```ignore
/// let report = sleep_options_json(r#"{"anchor": "07:00", "age_years": 34}"#)?;
/// ```
pub fn sleep_options_json(request_json: &str) -> Result<String> {
    let request: SleepRequest = serde_json::from_str(request_json)?;
    let report = Calculator::new().sleep_options(&request)?;
    Ok(serde_json::to_string(&report)?)
}

/// Convert a caffeine request JSON into a caffeine report JSON
pub fn caffeine_report_json(request_json: &str) -> Result<String> {
    let request: CaffeineRequest = serde_json::from_str(request_json)?;
    let report = Calculator::new().caffeine_report(&request)?;
    Ok(serde_json::to_string(&report)?)
}

/// Convert a jet lag request JSON into a plan JSON
pub fn jet_lag_plan_json(request_json: &str) -> Result<String> {
    let request: JetLagRequest = serde_json::from_str(request_json)?;
    let plan = Calculator::new().jet_lag_plan(&request)?;
    Ok(serde_json::to_string(&plan)?)
}

/// All three calculators sharing one configuration.
///
/// Use this when the defaults have been overridden; the free functions above
/// always use the defaults.
#[derive(Debug, Clone)]
pub struct Calculator {
    config: CalculatorConfig,
    sleep: SleepCycleCalculator,
    caffeine: CaffeineCalculator,
    jet_lag: JetLagCalculator,
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

impl Calculator {
    /// Create a calculator with default settings
    pub fn new() -> Self {
        Self::build(CalculatorConfig::default())
    }

    /// Create a calculator from a validated configuration
    pub fn with_config(config: CalculatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: CalculatorConfig) -> Self {
        Self {
            sleep: SleepCycleCalculator::new(config.sleep.clone()),
            caffeine: CaffeineCalculator::new(config.caffeine.clone()),
            jet_lag: JetLagCalculator::new(config.jet_lag.clone()),
            config,
        }
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    pub fn sleep_options(&self, request: &SleepRequest) -> Result<SleepReport> {
        let anchor = WallClock::parse(&request.anchor)?;
        let options = self
            .sleep
            .compute_options(anchor, request.direction, request.age_years);

        Ok(SleepReport {
            anchor,
            direction: request.direction,
            age_recommendation: request
                .age_years
                .and_then(recommendation_for_age)
                .cloned(),
            options,
        })
    }

    /// Wake times for going to bed at `now`
    pub fn sleep_now(&self, now: WallClock, age_years: Option<f64>) -> SleepReport {
        SleepReport {
            anchor: now,
            direction: CycleDirection::FromBed,
            age_recommendation: age_years.and_then(recommendation_for_age).cloned(),
            options: self.sleep.sleep_now(now, age_years),
        }
    }

    pub fn caffeine_report(&self, request: &CaffeineRequest) -> Result<CaffeineReport> {
        let query_time = WallClock::parse(&request.query_time)?;
        let intakes = request
            .intakes
            .iter()
            .map(|i| {
                if !i.amount_mg.is_finite() || i.amount_mg < 0.0 {
                    return Err(CalcError::InvalidAmount(format!(
                        "{} mg at {}",
                        i.amount_mg, i.time
                    )));
                }
                Ok(CaffeineIntake::new(i.amount_mg, WallClock::parse(&i.time)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(self.caffeine_report_for(&intakes, query_time))
    }

    /// Build a report from already-parsed intakes
    pub fn caffeine_report_for(&self, intakes: &[CaffeineIntake], query_time: WallClock) -> CaffeineReport {
        let total_intake_mg: f64 = intakes.iter().map(|i| i.amount_mg).sum();
        let last_intake_time = intakes.iter().map(|i| i.time).max();
        let bedtime_options = last_intake_time
            .map(|last| self.caffeine.bedtime_options(total_intake_mg, last))
            .unwrap_or_default();
        let hours_until_sleep_safe = self.caffeine.hours_until_sleep_safe(intakes, query_time);

        CaffeineReport {
            query_time,
            remaining_mg: self.caffeine.remaining(intakes, query_time),
            total_intake_mg,
            last_intake_time,
            bedtime_options,
            hours_until_sleep_safe,
            sleep_safe_at: query_time.add_minutes((hours_until_sleep_safe * 60.0).ceil() as i64),
        }
    }

    pub fn jet_lag_plan(&self, request: &JetLagRequest) -> Result<JetLagPlan> {
        let departure_date = parse_date(&request.departure_date)?;
        let departure_time = WallClock::parse(&request.departure_time)?;
        let arrival_date = request.arrival_date.as_deref().map(parse_date).transpose()?;
        let arrival_time = request
            .arrival_time
            .as_deref()
            .map(WallClock::parse)
            .transpose()?;

        let trip = JetLagTrip {
            from: request.from_offset,
            to: request.to_offset,
            departure_date,
            departure_time,
            arrival_date,
            arrival_time,
        };
        debug!(?trip, "jet lag request parsed");

        Ok(self.jet_lag.plan(&trip))
    }
}
