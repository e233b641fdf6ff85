//! Jet lag schedule planner
//!
//! A trip is two UTC offsets plus a departure date. The planner derives the
//! direction and size of the shift, then lays out three phases:
//!
//! 1. Preparation - up to five days before departure, moving bedtime and wake
//!    time one step per day toward the destination.
//! 2. Travel - a single in-transit day.
//! 3. Recovery - fixed local bedtime and wake time with day-specific guidance.
//!
//! Eastward trips (phase advance) get a longer recovery than westward ones.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::clock::WallClock;
use crate::config::JetLagSettings;
use crate::error::{CalcError, Result};
use crate::types::{
    JetLagPlan, JetLagSeverity, ScheduleDay, SchedulePhase, ScheduleTime, TravelDirection,
};

/// Westernmost civil offset, UTC-12:00
pub const MIN_OFFSET_MINUTES: i32 = -12 * 60;

/// Easternmost civil offset, UTC+14:00
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Offset from UTC with minute resolution (covers :30 and :45 zones)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeZoneOffset {
    total_minutes: i32,
}

impl TimeZoneOffset {
    pub const UTC: TimeZoneOffset = TimeZoneOffset { total_minutes: 0 };

    /// `hours` carries the sign; `minutes` extends it away from zero
    pub fn new(hours: i32, minutes: u32) -> Self {
        let minutes = minutes.min(59) as i32;
        let total_minutes = if hours < 0 {
            hours * 60 - minutes
        } else {
            hours * 60 + minutes
        };
        Self { total_minutes }
    }

    /// From a real number of hours, rounded to the minute
    pub fn from_hours(hours: f64) -> Self {
        Self {
            total_minutes: (hours * 60.0).round() as i32,
        }
    }

    /// Like [`TimeZoneOffset::from_hours`], but rejects non-finite values and
    /// offsets outside UTC-12:00..UTC+14:00
    pub fn try_from_hours(hours: f64) -> Result<Self> {
        let minutes = hours * 60.0;
        if !minutes.is_finite()
            || minutes.round() < f64::from(MIN_OFFSET_MINUTES)
            || minutes.round() > f64::from(MAX_OFFSET_MINUTES)
        {
            return Err(CalcError::InvalidOffset(format!("{} hours", hours)));
        }
        Ok(Self::from_hours(hours))
    }

    pub fn from_minutes(total_minutes: i32) -> Self {
        Self { total_minutes }
    }

    pub fn total_minutes(&self) -> i32 {
        self.total_minutes
    }

    pub fn as_hours(&self) -> f64 {
        f64::from(self.total_minutes) / 60.0
    }

    /// Parse `"+05:30"`, `"UTC-3:30"`, `"GMT+1"`, `"5.75"` or `"-8"`.
    ///
    /// Offsets outside UTC-12:00..UTC+14:00 are rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || CalcError::InvalidOffset(input.to_string());

        let upper = input.trim().to_ascii_uppercase();
        let body = upper
            .strip_prefix("UTC")
            .or_else(|| upper.strip_prefix("GMT"))
            .unwrap_or(upper.as_str())
            .trim();
        if body.is_empty() || body == "Z" {
            return Ok(Self::UTC);
        }

        let (negative, unsigned) = match body.as_bytes()[0] {
            b'+' => (false, &body[1..]),
            b'-' => (true, &body[1..]),
            _ => (false, body),
        };

        let magnitude = if let Some((h, m)) = unsigned.split_once(':') {
            let hours: u32 = h.parse().map_err(|_| invalid())?;
            let minutes: u32 = m.parse().map_err(|_| invalid())?;
            if m.len() != 2 || minutes >= 60 {
                return Err(invalid());
            }
            (hours * 60 + minutes) as i32
        } else {
            let hours: f64 = unsigned.parse().map_err(|_| invalid())?;
            if !hours.is_finite() || hours < 0.0 {
                return Err(invalid());
            }
            (hours * 60.0).round() as i32
        };

        let total_minutes = if negative { -magnitude } else { magnitude };
        if !(MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&total_minutes) {
            return Err(invalid());
        }
        Ok(Self { total_minutes })
    }
}

impl fmt::Display for TimeZoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.total_minutes < 0 { '-' } else { '+' };
        let magnitude = self.total_minutes.unsigned_abs();
        write!(f, "UTC{}{:02}:{:02}", sign, magnitude / 60, magnitude % 60)
    }
}

impl FromStr for TimeZoneOffset {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for TimeZoneOffset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_hours())
    }
}

impl<'de> Deserialize<'de> for TimeZoneOffset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawOffset {
            Hours(f64),
            Text(String),
        }

        match RawOffset::deserialize(deserializer)? {
            RawOffset::Hours(hours) => Self::try_from_hours(hours).map_err(serde::de::Error::custom),
            RawOffset::Text(text) => Self::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| CalcError::InvalidDate(format!("{}: {}", input, e)))
}

/// Severity bucket for an absolute shift in hours
pub fn classify_severity(hours_diff: f64) -> JetLagSeverity {
    if hours_diff <= 2.0 {
        JetLagSeverity::Minimal
    } else if hours_diff <= 5.0 {
        JetLagSeverity::Moderate
    } else if hours_diff <= 8.0 {
        JetLagSeverity::Significant
    } else {
        JetLagSeverity::Severe
    }
}

/// A journey between two time zones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JetLagTrip {
    pub from: TimeZoneOffset,
    pub to: TimeZoneOffset,
    pub departure_date: NaiveDate,
    pub departure_time: WallClock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<WallClock>,
}

impl JetLagTrip {
    pub fn new(
        from: TimeZoneOffset,
        to: TimeZoneOffset,
        departure_date: NaiveDate,
        departure_time: WallClock,
    ) -> Self {
        Self {
            from,
            to,
            departure_date,
            departure_time,
            arrival_date: None,
            arrival_time: None,
        }
    }

    pub fn with_arrival(mut self, date: NaiveDate, time: Option<WallClock>) -> Self {
        self.arrival_date = Some(date);
        self.arrival_time = time;
        self
    }

    /// Signed difference `to - from` in hours; positive means eastward
    pub fn offset_diff_hours(&self) -> f64 {
        (i64::from(self.to.total_minutes()) - i64::from(self.from.total_minutes())) as f64 / 60.0
    }

    pub fn direction(&self) -> TravelDirection {
        if self.offset_diff_hours() > 0.0 {
            TravelDirection::Eastward
        } else {
            TravelDirection::Westward
        }
    }

    pub fn hours_diff(&self) -> f64 {
        self.offset_diff_hours().abs()
    }

    /// Plan with the default 22:00 / 07:00 baseline
    pub fn plan(&self) -> JetLagPlan {
        JetLagCalculator::default().plan(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecoveryTier {
    ArrivalDay,
    SecondDay,
    ThirdDay,
    FirstHalf,
    SecondHalf,
    Penultimate,
    Final,
}

impl RecoveryTier {
    /// First match wins: day one, last day, next to last, day two, day three,
    /// then by how far through recovery the day falls.
    ///
    /// The last two days are checked before the day-number and percentage
    /// tiers, since the half tiers match every remaining day and would leave
    /// them unreachable. A two-day recovery is therefore arrival then final.
    fn select(day: u32, total: u32, percent_adjusted: u32) -> Self {
        match day {
            1 => RecoveryTier::ArrivalDay,
            d if d == total => RecoveryTier::Final,
            d if d + 1 == total => RecoveryTier::Penultimate,
            2 => RecoveryTier::SecondDay,
            3 => RecoveryTier::ThirdDay,
            _ if percent_adjusted <= 50 => RecoveryTier::FirstHalf,
            _ => RecoveryTier::SecondHalf,
        }
    }

    fn note(&self) -> &'static str {
        match self {
            RecoveryTier::ArrivalDay => {
                "Arrival day: stay awake until local bedtime and keep any nap under 30 minutes."
            }
            RecoveryTier::SecondDay => {
                "Fatigue usually peaks today; eat meals on local time and stay hydrated."
            }
            RecoveryTier::ThirdDay => {
                "Energy should start to return; avoid caffeine after noon."
            }
            RecoveryTier::FirstHalf => {
                "Keep a fixed bedtime and wake time while your body clock catches up."
            }
            RecoveryTier::SecondHalf => {
                "Most symptoms should be easing; keep exercising outdoors in daylight."
            }
            RecoveryTier::Penultimate => "Almost there: hold the routine for one more day.",
            RecoveryTier::Final => "You should now be fully adjusted to local time.",
        }
    }
}

/// Jet lag planner bound to a set of settings
#[derive(Debug, Clone, Default)]
pub struct JetLagCalculator {
    settings: JetLagSettings,
}

impl JetLagCalculator {
    pub fn new(settings: JetLagSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &JetLagSettings {
        &self.settings
    }

    /// `min(ceil(hours_diff / 2), max_preparation_days)`
    pub fn preparation_days(&self, hours_diff: f64) -> u32 {
        ((hours_diff / 2.0).ceil() as u32).min(self.settings.max_preparation_days)
    }

    /// `clamp(ceil(hours_diff), min, max)`, plus 20% for long eastward trips
    pub fn recovery_days(&self, hours_diff: f64, direction: TravelDirection) -> u32 {
        let min = self.settings.min_recovery_days;
        let max = self.settings.max_recovery_days;
        let base = (hours_diff.ceil() as u32).clamp(min, max);
        if direction.is_eastward() && hours_diff > 5.0 {
            base.saturating_add((hours_diff * 0.2).ceil() as u32).min(max)
        } else {
            base
        }
    }

    pub fn plan(&self, trip: &JetLagTrip) -> JetLagPlan {
        let direction = trip.direction();
        let hours_diff = trip.hours_diff();
        let preparation_days = self.preparation_days(hours_diff);
        let recovery_days = self.recovery_days(hours_diff, direction);

        debug!(
            from = %trip.from,
            to = %trip.to,
            ?direction,
            hours_diff,
            preparation_days,
            recovery_days,
            "planning jet lag schedule"
        );

        let mut days = Vec::with_capacity((preparation_days + 1 + recovery_days) as usize);
        days.extend(self.preparation_phase(trip, direction, preparation_days));
        days.push(self.travel_day(trip, direction));
        days.extend(self.recovery_phase(trip, direction, recovery_days));

        JetLagPlan {
            direction,
            hours_diff,
            severity: classify_severity(hours_diff),
            preparation_days,
            recovery_days,
            days,
        }
    }

    fn preparation_phase(
        &self,
        trip: &JetLagTrip,
        direction: TravelDirection,
        count: u32,
    ) -> Vec<ScheduleDay> {
        let step_minutes = match direction {
            TravelDirection::Eastward => -self.settings.daily_shift_minutes,
            TravelDirection::Westward => self.settings.daily_shift_minutes,
        };
        let (guidance, relation) = match direction {
            TravelDirection::Eastward => (
                "Morning light: get bright light soon after waking and dim the lights in the evening.",
                "earlier",
            ),
            TravelDirection::Westward => (
                "Evening light: get bright light in the late afternoon and evening and keep mornings dim.",
                "later",
            ),
        };

        (1..=count)
            .rev()
            .map(|i| {
                let step = count - i + 1;
                let shift = i64::from(step) * step_minutes;
                ScheduleDay {
                    label: if i == 1 {
                        "1 day before departure".to_string()
                    } else {
                        format!("{} days before departure", i)
                    },
                    date: shift_date(trip.departure_date, -i64::from(i)),
                    bedtime: ScheduleTime::At(self.settings.baseline_bedtime.add_minutes(shift)),
                    waketime: ScheduleTime::At(self.settings.baseline_waketime.add_minutes(shift)),
                    light_exposure_guidance: guidance.to_string(),
                    notes: format!(
                        "Go to bed and wake up {} {} than usual.",
                        describe_minutes(shift.abs()),
                        relation
                    ),
                    phase: SchedulePhase::Preparation,
                }
            })
            .collect()
    }

    fn travel_day(&self, trip: &JetLagTrip, direction: TravelDirection) -> ScheduleDay {
        let guidance = match direction {
            TravelDirection::Eastward => {
                "Try to sleep on the plane while it is night at your destination; use an eye mask and skip caffeine."
            }
            TravelDirection::Westward => {
                "Stay awake on the flight until evening at your destination; keep the shade open and move around."
            }
        };

        let mut notes = format!("Depart at {}.", trip.departure_time.format_12h());
        match (trip.arrival_date, trip.arrival_time) {
            (Some(date), Some(time)) => {
                notes.push_str(&format!(" Arrive {} at {}.", date, time.format_12h()))
            }
            (Some(date), None) => notes.push_str(&format!(" Arrive {}.", date)),
            (None, Some(time)) => notes.push_str(&format!(" Arrive at {}.", time.format_12h())),
            (None, None) => {}
        }
        notes.push_str(&format!(" Set your watch to {} when you board.", trip.to));

        ScheduleDay {
            label: "Travel day".to_string(),
            date: trip.departure_date,
            bedtime: ScheduleTime::InTransit,
            waketime: ScheduleTime::InTransit,
            light_exposure_guidance: guidance.to_string(),
            notes,
            phase: SchedulePhase::Travel,
        }
    }

    fn recovery_phase(
        &self,
        trip: &JetLagTrip,
        direction: TravelDirection,
        count: u32,
    ) -> Vec<ScheduleDay> {
        let anchor = trip
            .arrival_date
            .unwrap_or_else(|| shift_date(trip.departure_date, 1));
        let guidance = match direction {
            TravelDirection::Eastward => {
                "Get outdoor light in the morning and avoid bright light after sunset."
            }
            TravelDirection::Westward => {
                "Get outdoor light in the late afternoon and evening; avoid bright light early in the morning."
            }
        };

        (1..=count)
            .map(|i| {
                let percent = percent_adjusted(i, count);
                let tier = RecoveryTier::select(i, count, percent);
                ScheduleDay {
                    label: format!("Recovery day {}", i),
                    date: shift_date(anchor, i64::from(i) - 1),
                    bedtime: ScheduleTime::At(self.settings.baseline_bedtime),
                    waketime: ScheduleTime::At(self.settings.baseline_waketime),
                    light_exposure_guidance: guidance.to_string(),
                    notes: format!("{} (about {}% adjusted)", tier.note(), percent),
                    phase: SchedulePhase::Recovery,
                }
            })
            .collect()
    }
}

/// Plan a trip from raw offsets in hours with the default settings
pub fn plan(
    from_offset_hours: f64,
    to_offset_hours: f64,
    departure_date: NaiveDate,
    departure_time: WallClock,
    arrival_date: Option<NaiveDate>,
) -> Vec<ScheduleDay> {
    let mut trip = JetLagTrip::new(
        TimeZoneOffset::from_hours(from_offset_hours),
        TimeZoneOffset::from_hours(to_offset_hours),
        departure_date,
        departure_time,
    );
    trip.arrival_date = arrival_date;
    trip.plan().days
}

/// `round(day / total * 100)`
fn percent_adjusted(day: u32, total: u32) -> u32 {
    if total == 0 {
        return 100;
    }
    (f64::from(day) / f64::from(total) * 100.0).round() as u32
}

fn shift_date(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

fn describe_minutes(minutes: i64) -> String {
    match minutes {
        60 => "1 hour".to_string(),
        m if m % 60 == 0 => format!("{} hours", m / 60),
        m => format!("{} minutes", m),
    }
}
