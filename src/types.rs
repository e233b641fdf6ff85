//! Core types for the Sleep Calc engines
//!
//! This module defines the value records returned by each calculator. Every
//! record is produced fresh by a single calculation call and never mutated.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::clock::WallClock;
use crate::error::CalcError;

/// Which end of the night the anchor time fixes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleDirection {
    /// Anchor is the wake time; compute bedtimes
    FromWake,
    /// Anchor is the bedtime; compute wake times
    FromBed,
}

/// Quality rating of a whole-cycle sleep duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleRating {
    Poor,
    Fair,
    Good,
    Ideal,
}

impl CycleRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleRating::Poor => "poor",
            CycleRating::Fair => "fair",
            CycleRating::Good => "good",
            CycleRating::Ideal => "ideal",
        }
    }
}

/// One candidate bedtime or wake time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepCycleOption {
    /// Bedtime (from wake) or wake time (from bed)
    pub target_time: WallClock,
    /// Number of complete sleep cycles
    pub cycles: u32,
    /// Hours of sleep excluding the fall-asleep latency
    pub total_sleep_hours: f64,
    pub rating: CycleRating,
    /// Whether `cycles` falls inside the age band's recommended range
    pub is_recommended_for_age: bool,
}

/// Recommended nightly sleep for an age band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeSleepRecommendation {
    pub age_group_label: &'static str,
    pub min_hours: f64,
    pub max_hours: f64,
    pub min_cycles: u32,
    pub max_cycles: u32,
}

/// A single caffeine dose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaffeineIntake {
    pub amount_mg: f64,
    pub time: WallClock,
}

impl CaffeineIntake {
    pub fn new(amount_mg: f64, time: WallClock) -> Self {
        Self { amount_mg, time }
    }
}

/// How disruptive the residual caffeine at bedtime is expected to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BedtimeQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl BedtimeQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            BedtimeQuality::Poor => "poor",
            BedtimeQuality::Fair => "fair",
            BedtimeQuality::Good => "good",
            BedtimeQuality::Excellent => "excellent",
        }
    }
}

/// Residual caffeine if going to bed after waiting `wait_hours`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaffeineBedtimeOption {
    pub wait_hours: f64,
    pub bedtime: WallClock,
    pub remaining_mg: f64,
    pub quality: BedtimeQuality,
}

/// Direction of a time-zone crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelDirection {
    Eastward,
    Westward,
}

impl TravelDirection {
    pub fn is_eastward(&self) -> bool {
        matches!(self, TravelDirection::Eastward)
    }
}

/// Display-only severity bucket for the size of the shift
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JetLagSeverity {
    Minimal,
    Moderate,
    Significant,
    Severe,
}

impl JetLagSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            JetLagSeverity::Minimal => "minimal",
            JetLagSeverity::Moderate => "moderate",
            JetLagSeverity::Significant => "significant",
            JetLagSeverity::Severe => "severe",
        }
    }
}

/// Phase of a jet-lag plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePhase {
    Preparation,
    Travel,
    Recovery,
}

/// A scheduled bedtime or wake time; `InTransit` on the travel day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleTime {
    At(WallClock),
    InTransit,
}

impl ScheduleTime {
    pub fn wall_clock(&self) -> Option<WallClock> {
        match self {
            ScheduleTime::At(time) => Some(*time),
            ScheduleTime::InTransit => None,
        }
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleTime::At(time) => write!(f, "{}", time),
            ScheduleTime::InTransit => f.write_str("in-transit"),
        }
    }
}

impl FromStr for ScheduleTime {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("in-transit") {
            Ok(ScheduleTime::InTransit)
        } else {
            WallClock::parse(s).map(ScheduleTime::At)
        }
    }
}

impl Serialize for ScheduleTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScheduleTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One day of a jet-lag adjustment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub label: String,
    pub date: NaiveDate,
    pub bedtime: ScheduleTime,
    pub waketime: ScheduleTime,
    pub light_exposure_guidance: String,
    pub notes: String,
    pub phase: SchedulePhase,
}

/// Full jet-lag plan with its classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetLagPlan {
    pub direction: TravelDirection,
    /// Absolute offset difference in hours
    pub hours_diff: f64,
    pub severity: JetLagSeverity,
    pub preparation_days: u32,
    pub recovery_days: u32,
    pub days: Vec<ScheduleDay>,
}

impl JetLagPlan {
    /// Days belonging to one phase, in plan order
    pub fn phase(&self, phase: SchedulePhase) -> impl Iterator<Item = &ScheduleDay> {
        self.days.iter().filter(move |d| d.phase == phase)
    }
}
