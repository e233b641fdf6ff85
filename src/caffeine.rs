//! Caffeine decay calculator
//!
//! First-order elimination: each dose decays independently as
//! `amount * 0.5^(elapsed / half_life)`, and the total is the sum over doses.
//! The model lives on a single 24-hour dial, so a query time earlier than a
//! dose is read as the next day.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::WallClock;
use crate::config::{CaffeineSettings, DEFAULT_HALF_LIFE_HOURS, DEFAULT_WAIT_HOURS};
use crate::error::CalcError;
use crate::types::{BedtimeQuality, CaffeineBedtimeOption, CaffeineIntake};

/// Fraction of a dose left after `elapsed_hours`
pub fn decay_factor(elapsed_hours: f64, half_life_hours: f64) -> f64 {
    0.5_f64.powf(elapsed_hours / half_life_hours)
}

/// Hours from `intake` to `query`, in `[0, 24)`
pub fn elapsed_hours(intake: WallClock, query: WallClock) -> f64 {
    f64::from(intake.minutes_until(query)) / 60.0
}

/// Unrounded caffeine left at `query_time` (mg)
pub fn remaining_caffeine_exact(
    intakes: &[CaffeineIntake],
    query_time: WallClock,
    half_life_hours: f64,
) -> f64 {
    intakes
        .iter()
        .map(|i| i.amount_mg * decay_factor(elapsed_hours(i.time, query_time), half_life_hours))
        .sum()
}

/// Caffeine left at `query_time`, rounded to whole milligrams
pub fn remaining_caffeine(
    intakes: &[CaffeineIntake],
    query_time: WallClock,
    half_life_hours: f64,
) -> f64 {
    remaining_caffeine_exact(intakes, query_time, half_life_hours).round()
}

/// [`remaining_caffeine`] with the default 5-hour half-life
pub fn remaining_caffeine_default(intakes: &[CaffeineIntake], query_time: WallClock) -> f64 {
    remaining_caffeine(intakes, query_time, DEFAULT_HALF_LIFE_HOURS)
}

/// Bucket residual caffeine at bedtime; thresholds are checked high to low
pub fn classify_bedtime(remaining_mg: f64) -> BedtimeQuality {
    if remaining_mg > 100.0 {
        BedtimeQuality::Poor
    } else if remaining_mg > 50.0 {
        BedtimeQuality::Fair
    } else if remaining_mg > 25.0 {
        BedtimeQuality::Good
    } else {
        BedtimeQuality::Excellent
    }
}

/// Bedtime options for the default 6, 8, 10 and 12 hour waits
pub fn bedtime_options(
    total_intake_mg: f64,
    last_intake_time: WallClock,
    half_life_hours: f64,
) -> Vec<CaffeineBedtimeOption> {
    bedtime_options_for_waits(total_intake_mg, last_intake_time, half_life_hours, &DEFAULT_WAIT_HOURS)
}

/// [`bedtime_options`] with the default 5-hour half-life
pub fn bedtime_options_default(
    total_intake_mg: f64,
    last_intake_time: WallClock,
) -> Vec<CaffeineBedtimeOption> {
    bedtime_options(total_intake_mg, last_intake_time, DEFAULT_HALF_LIFE_HOURS)
}

fn bedtime_options_for_waits(
    total_intake_mg: f64,
    last_intake_time: WallClock,
    half_life_hours: f64,
    waits: &[f64],
) -> Vec<CaffeineBedtimeOption> {
    waits
        .iter()
        .map(|&wait_hours| {
            let remaining_mg = (total_intake_mg * decay_factor(wait_hours, half_life_hours)).round();
            CaffeineBedtimeOption {
                wait_hours,
                bedtime: last_intake_time.add_minutes((wait_hours * 60.0).round() as i64),
                remaining_mg,
                quality: classify_bedtime(remaining_mg),
            }
        })
        .collect()
}

/// Hours after `query_time` until the total falls to `threshold_mg`.
///
/// Zero when already at or below the threshold. All doses share one half-life,
/// so the total decays as a single exponential from the current level.
pub fn hours_until_below(
    intakes: &[CaffeineIntake],
    query_time: WallClock,
    threshold_mg: f64,
    half_life_hours: f64,
) -> f64 {
    let current = remaining_caffeine_exact(intakes, query_time, half_life_hours);
    if current <= threshold_mg || threshold_mg <= 0.0 {
        return 0.0;
    }
    half_life_hours * (current / threshold_mg).log2()
}

/// Caffeine calculator bound to a set of settings
#[derive(Debug, Clone, Default)]
pub struct CaffeineCalculator {
    settings: CaffeineSettings,
}

impl CaffeineCalculator {
    pub fn new(settings: CaffeineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CaffeineSettings {
        &self.settings
    }

    pub fn remaining(&self, intakes: &[CaffeineIntake], query_time: WallClock) -> f64 {
        let remaining = remaining_caffeine(intakes, query_time, self.settings.half_life_hours);
        debug!(
            doses = intakes.len(),
            query = %query_time,
            remaining_mg = remaining,
            "computed remaining caffeine"
        );
        remaining
    }

    pub fn bedtime_options(
        &self,
        total_intake_mg: f64,
        last_intake_time: WallClock,
    ) -> Vec<CaffeineBedtimeOption> {
        bedtime_options_for_waits(
            total_intake_mg,
            last_intake_time,
            self.settings.half_life_hours,
            &self.settings.wait_hours,
        )
    }

    /// Hours until the total drops below the configured sleep threshold
    pub fn hours_until_sleep_safe(&self, intakes: &[CaffeineIntake], query_time: WallClock) -> f64 {
        hours_until_below(
            intakes,
            query_time,
            self.settings.sleep_threshold_mg,
            self.settings.half_life_hours,
        )
    }
}

/// Typical caffeine content of common drinks and foods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaffeineSource {
    Coffee,
    Espresso,
    BlackTea,
    GreenTea,
    Cola,
    EnergyDrink,
    DarkChocolate,
}

impl CaffeineSource {
    pub const ALL: [CaffeineSource; 7] = [
        CaffeineSource::Coffee,
        CaffeineSource::Espresso,
        CaffeineSource::BlackTea,
        CaffeineSource::GreenTea,
        CaffeineSource::Cola,
        CaffeineSource::EnergyDrink,
        CaffeineSource::DarkChocolate,
    ];

    /// Caffeine per standard serving (mg)
    pub fn amount_mg(&self) -> f64 {
        match self {
            CaffeineSource::Coffee => 95.0,
            CaffeineSource::Espresso => 63.0,
            CaffeineSource::BlackTea => 47.0,
            CaffeineSource::GreenTea => 28.0,
            CaffeineSource::Cola => 34.0,
            CaffeineSource::EnergyDrink => 80.0,
            CaffeineSource::DarkChocolate => 24.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaffeineSource::Coffee => "coffee",
            CaffeineSource::Espresso => "espresso",
            CaffeineSource::BlackTea => "black_tea",
            CaffeineSource::GreenTea => "green_tea",
            CaffeineSource::Cola => "cola",
            CaffeineSource::EnergyDrink => "energy_drink",
            CaffeineSource::DarkChocolate => "dark_chocolate",
        }
    }

    /// One serving taken at `time`
    pub fn intake_at(&self, time: WallClock) -> CaffeineIntake {
        CaffeineIntake::new(self.amount_mg(), time)
    }
}

impl fmt::Display for CaffeineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaffeineSource {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(&['-', ' '][..], "_");
        CaffeineSource::ALL
            .into_iter()
            .find(|source| source.as_str() == normalized)
            .ok_or_else(|| CalcError::InvalidSource(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(s: &str) -> WallClock {
        WallClock::parse(s).unwrap()
    }

    #[test]
    fn test_half_life_points() {
        let dose = [CaffeineIntake::new(100.0, hm("08:00"))];
        assert_eq!(remaining_caffeine_default(&dose, hm("08:00")), 100.0);
        assert_eq!(remaining_caffeine_default(&dose, hm("13:00")), 50.0);
        assert_eq!(remaining_caffeine_default(&dose, hm("18:00")), 25.0);
    }

    #[test]
    fn test_single_coffee_at_night() {
        // 95 * 0.5^(13/5) = 15.67
        let dose = [CaffeineIntake::new(95.0, hm("09:00"))];
        assert_eq!(remaining_caffeine_default(&dose, hm("22:00")), 16.0);
    }

    #[test]
    fn test_query_before_intake_wraps_to_next_day() {
        let dose = [CaffeineIntake::new(200.0, hm("20:00"))];
        // 08:00 is read as 12 hours after 20:00
        let expected = (200.0 * 0.5_f64.powf(12.0 / 5.0)).round();
        assert_eq!(remaining_caffeine_default(&dose, hm("08:00")), expected);
        assert!((elapsed_hours(hm("20:00"), hm("08:00")) - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_additivity() {
        let a = CaffeineIntake::new(95.0, hm("07:30"));
        let b = CaffeineIntake::new(63.0, hm("14:10"));
        for query in ["07:30", "12:00", "16:45", "23:59", "03:00"] {
            let q = hm(query);
            let both = remaining_caffeine_exact(&[a, b], q, 5.0);
            let separate = remaining_caffeine_exact(&[a], q, 5.0) + remaining_caffeine_exact(&[b], q, 5.0);
            assert!((both - separate).abs() < 1e-9, "query {query}");
        }

        // Exact at half-life multiples, so rounding agrees too
        let c = CaffeineIntake::new(100.0, hm("08:00"));
        let d = CaffeineIntake::new(200.0, hm("13:00"));
        let q = hm("18:00");
        assert_eq!(
            remaining_caffeine_default(&[c, d], q),
            remaining_caffeine_default(&[c], q) + remaining_caffeine_default(&[d], q)
        );
    }

    #[test]
    fn test_decay_is_monotonic_until_wrap() {
        let dose = [CaffeineIntake::new(300.0, hm("06:00"))];
        let mut previous = f64::INFINITY;
        for minutes in 0..1440 {
            let q = hm("06:00").add_minutes(minutes);
            let level = remaining_caffeine_exact(&dose, q, 5.0);
            assert!(level < previous, "not decreasing at +{minutes} min");
            previous = level;
        }
    }

    #[test]
    fn test_empty_intake_list() {
        assert_eq!(remaining_caffeine_default(&[], hm("12:00")), 0.0);
    }

    #[test]
    fn test_bedtime_options() {
        let options = bedtime_options_default(200.0, hm("15:00"));
        let summary: Vec<(f64, String, f64, BedtimeQuality)> = options
            .iter()
            .map(|o| (o.wait_hours, o.bedtime.format_24h(), o.remaining_mg, o.quality))
            .collect();

        // 200 * 0.5^(6/5) = 87.06, 0.5^(8/5) = 65.98, 0.5^2 = 50, 0.5^(12/5) = 37.89
        assert_eq!(
            summary,
            vec![
                (6.0, "21:00".to_string(), 87.0, BedtimeQuality::Fair),
                (8.0, "23:00".to_string(), 66.0, BedtimeQuality::Fair),
                (10.0, "01:00".to_string(), 50.0, BedtimeQuality::Good),
                (12.0, "03:00".to_string(), 38.0, BedtimeQuality::Good),
            ]
        );
    }

    #[test]
    fn test_quality_thresholds() {
        assert_eq!(classify_bedtime(101.0), BedtimeQuality::Poor);
        assert_eq!(classify_bedtime(100.0), BedtimeQuality::Fair);
        assert_eq!(classify_bedtime(51.0), BedtimeQuality::Fair);
        assert_eq!(classify_bedtime(50.0), BedtimeQuality::Good);
        assert_eq!(classify_bedtime(26.0), BedtimeQuality::Good);
        assert_eq!(classify_bedtime(25.0), BedtimeQuality::Excellent);
        assert_eq!(classify_bedtime(0.0), BedtimeQuality::Excellent);
    }

    #[test]
    fn test_hours_until_below() {
        let dose = [CaffeineIntake::new(200.0, hm("08:00"))];
        // 200 -> 50 is two half-lives
        assert!((hours_until_below(&dose, hm("08:00"), 50.0, 5.0) - 10.0).abs() < 1e-9);
        // Already below
        assert_eq!(hours_until_below(&dose, hm("08:00"), 250.0, 5.0), 0.0);
    }

    #[test]
    fn test_calculator_uses_settings() {
        let calc = CaffeineCalculator::new(CaffeineSettings {
            half_life_hours: 4.0,
            wait_hours: vec![4.0],
            ..CaffeineSettings::default()
        });
        let dose = [CaffeineIntake::new(120.0, hm("10:00"))];
        assert_eq!(calc.remaining(&dose, hm("14:00")), 60.0);

        let options = calc.bedtime_options(120.0, hm("10:00"));
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].remaining_mg, 60.0);
        assert_eq!(options[0].bedtime.format_24h(), "14:00");
        assert!((calc.hours_until_sleep_safe(&dose, hm("10:00")) - 4.0 * (120.0_f64 / 50.0).log2()).abs() < 1e-9);
    }

    #[test]
    fn test_sources() {
        assert_eq!("coffee".parse::<CaffeineSource>().unwrap(), CaffeineSource::Coffee);
        assert_eq!("Energy Drink".parse::<CaffeineSource>().unwrap(), CaffeineSource::EnergyDrink);
        assert_eq!("green-tea".parse::<CaffeineSource>().unwrap(), CaffeineSource::GreenTea);
        assert!(matches!("mate".parse::<CaffeineSource>(), Err(CalcError::InvalidSource(_))));

        let intake = CaffeineSource::Espresso.intake_at(hm("10:00"));
        assert_eq!(intake.amount_mg, 63.0);
        assert_eq!(intake.time, hm("10:00"));
    }
}
