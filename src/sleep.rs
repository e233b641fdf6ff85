//! Sleep cycle calculator
//!
//! Given a fixed wake time or bedtime, enumerate the opposite end of the night
//! in whole sleep cycles. A fall-asleep latency is added between getting into
//! bed and the first cycle. An optional age selects one of nine recommendation
//! bands, which widens the enumerated range and flags the recommended options.

use tracing::debug;

use crate::clock::WallClock;
use crate::config::SleepSettings;
use crate::types::{AgeSleepRecommendation, CycleDirection, CycleRating, SleepCycleOption};

/// Oldest age covered by the recommendation table
pub const MAX_AGE_YEARS: f64 = 120.0;

/// An age interval and its recommendation
#[derive(Debug, Clone, PartialEq)]
pub struct AgeBand {
    pub lower: f64,
    pub lower_inclusive: bool,
    pub upper: f64,
    pub upper_inclusive: bool,
    pub recommendation: AgeSleepRecommendation,
}

impl AgeBand {
    fn contains(&self, age: f64) -> bool {
        let above = if self.lower_inclusive { age >= self.lower } else { age > self.lower };
        let below = if self.upper_inclusive { age <= self.upper } else { age < self.upper };
        above && below
    }
}

const fn band(
    lower: f64,
    lower_inclusive: bool,
    upper: f64,
    upper_inclusive: bool,
    label: &'static str,
    hours: (f64, f64),
    cycles: (u32, u32),
) -> AgeBand {
    AgeBand {
        lower,
        lower_inclusive,
        upper,
        upper_inclusive,
        recommendation: AgeSleepRecommendation {
            age_group_label: label,
            min_hours: hours.0,
            max_hours: hours.1,
            min_cycles: cycles.0,
            max_cycles: cycles.1,
        },
    }
}

// Ordered, first match wins. Together the bands cover [0, 120] without gaps.
static AGE_BANDS: [AgeBand; 9] = [
    band(0.0, true, 0.25, false, "Newborn (0-3 months)", (14.0, 17.0), (9, 11)),
    band(0.25, true, 1.0, false, "Infant (4-11 months)", (12.0, 15.0), (8, 10)),
    band(1.0, true, 2.0, true, "Toddler (1-2 years)", (11.0, 14.0), (7, 9)),
    band(2.0, false, 5.0, true, "Preschool (3-5 years)", (10.0, 13.0), (7, 9)),
    band(5.0, false, 13.0, true, "School age (6-13 years)", (9.0, 11.0), (6, 7)),
    band(13.0, false, 17.0, true, "Teen (14-17 years)", (8.0, 10.0), (5, 7)),
    band(17.0, false, 25.0, true, "Young adult (18-25 years)", (7.0, 9.0), (5, 6)),
    band(25.0, false, 64.0, true, "Adult (26-64 years)", (7.0, 9.0), (5, 6)),
    band(64.0, false, MAX_AGE_YEARS, true, "Older adult (65+ years)", (7.0, 8.0), (5, 5)),
];

/// The full age table, youngest first
pub fn age_bands() -> &'static [AgeBand] {
    &AGE_BANDS
}

/// Look up the recommendation for an age in years.
///
/// Ages outside `[0, 120]` are clamped into it; NaN has no recommendation.
pub fn recommendation_for_age(age_years: f64) -> Option<&'static AgeSleepRecommendation> {
    if age_years.is_nan() {
        return None;
    }
    let age = age_years.clamp(0.0, MAX_AGE_YEARS);
    AGE_BANDS
        .iter()
        .find(|b| b.contains(age))
        .map(|b| &b.recommendation)
}

/// Fixed rating by cycle count, independent of age
pub fn rate_cycles(cycles: u32) -> CycleRating {
    match cycles {
        4 => CycleRating::Fair,
        5 | 7 => CycleRating::Good,
        6 => CycleRating::Ideal,
        _ => CycleRating::Poor,
    }
}

/// Sleep cycle calculator with configurable cycle length and latency
#[derive(Debug, Clone, Default)]
pub struct SleepCycleCalculator {
    settings: SleepSettings,
}

impl SleepCycleCalculator {
    pub fn new(settings: SleepSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SleepSettings {
        &self.settings
    }

    /// Enumerate candidate times in ascending cycle order.
    ///
    /// For [`CycleDirection::FromWake`] each target is a bedtime
    /// `anchor - (cycles * cycle + latency)`; for [`CycleDirection::FromBed`]
    /// it is a wake time `anchor + latency + cycles * cycle`.
    pub fn compute_options(
        &self,
        anchor: WallClock,
        direction: CycleDirection,
        age_years: Option<f64>,
    ) -> Vec<SleepCycleOption> {
        let recommendation = age_years.and_then(recommendation_for_age);
        let (first, last) = self.cycle_range(recommendation);
        let cycle = i64::from(self.settings.cycle_minutes);
        let latency = i64::from(self.settings.latency_minutes);

        debug!(
            anchor = %anchor,
            ?direction,
            ?age_years,
            first,
            last,
            "computing sleep cycle options"
        );

        (first..=last)
            .map(|cycles| {
                let span = i64::from(cycles) * cycle + latency;
                let target_time = match direction {
                    CycleDirection::FromWake => anchor.add_minutes(-span),
                    CycleDirection::FromBed => anchor.add_minutes(span),
                };
                SleepCycleOption {
                    target_time,
                    cycles,
                    total_sleep_hours: (i64::from(cycles) * cycle) as f64 / 60.0,
                    rating: rate_cycles(cycles),
                    is_recommended_for_age: recommendation
                        .map(|r| (r.min_cycles..=r.max_cycles).contains(&cycles))
                        .unwrap_or(false),
                }
            })
            .collect()
    }

    /// Wake times for someone going to bed right now
    pub fn sleep_now(&self, now: WallClock, age_years: Option<f64>) -> Vec<SleepCycleOption> {
        self.compute_options(now, CycleDirection::FromBed, age_years)
    }

    fn cycle_range(&self, recommendation: Option<&AgeSleepRecommendation>) -> (u32, u32) {
        match recommendation {
            Some(r) => (
                r.min_cycles
                    .saturating_sub(1)
                    .max(self.settings.min_enumerated_cycles),
                (r.max_cycles + 1).min(self.settings.max_enumerated_cycles),
            ),
            None => (self.settings.default_min_cycles, self.settings.default_max_cycles),
        }
    }
}

/// Compute options with the default 90-minute cycle and 15-minute latency
pub fn compute_options(
    anchor: WallClock,
    direction: CycleDirection,
    age_years: Option<f64>,
) -> Vec<SleepCycleOption> {
    SleepCycleCalculator::default().compute_options(anchor, direction, age_years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hm(s: &str) -> WallClock {
        WallClock::parse(s).unwrap()
    }

    fn summary(options: &[SleepCycleOption]) -> Vec<(String, u32, CycleRating)> {
        options
            .iter()
            .map(|o| (o.target_time.format_24h(), o.cycles, o.rating))
            .collect()
    }

    #[test]
    fn test_bedtimes_from_wake_without_age() {
        let options = compute_options(hm("07:00"), CycleDirection::FromWake, None);

        assert_eq!(
            summary(&options),
            vec![
                ("00:45".to_string(), 4, CycleRating::Fair),
                ("23:15".to_string(), 5, CycleRating::Good),
                ("21:45".to_string(), 6, CycleRating::Ideal),
                ("20:15".to_string(), 7, CycleRating::Good),
            ]
        );
        assert!(options.iter().all(|o| !o.is_recommended_for_age));
        assert_eq!(options[2].total_sleep_hours, 9.0);
    }

    #[test]
    fn test_wake_times_from_bed() {
        let options = compute_options(hm("23:00"), CycleDirection::FromBed, None);
        let times: Vec<String> = options.iter().map(|o| o.target_time.format_24h()).collect();
        assert_eq!(times, vec!["05:15", "06:45", "08:15", "09:45"]);
    }

    #[test]
    fn test_directions_are_inverse() {
        for anchor in ["07:00", "00:10", "12:00", "23:59", "05:30"] {
            let wake = hm(anchor);
            for age in [None, Some(0.1), Some(30.0), Some(70.0)] {
                for option in compute_options(wake, CycleDirection::FromWake, age) {
                    let back = compute_options(option.target_time, CycleDirection::FromBed, age);
                    let same_cycles = back.iter().find(|o| o.cycles == option.cycles).unwrap();
                    assert_eq!(same_cycles.target_time, wake);
                }
            }
        }
    }

    #[test]
    fn test_age_bands_partition_range() {
        let mut age = 0.0;
        while age <= MAX_AGE_YEARS {
            let matches = AGE_BANDS.iter().filter(|b| b.contains(age)).count();
            assert_eq!(matches, 1, "age {age} matched {matches} bands");
            age += 0.05;
        }
        for boundary in [0.0, 0.25, 1.0, 2.0, 5.0, 13.0, 17.0, 25.0, 64.0, 120.0] {
            assert_eq!(AGE_BANDS.iter().filter(|b| b.contains(boundary)).count(), 1);
        }
    }

    #[test]
    fn test_band_boundaries() {
        let label = |age: f64| recommendation_for_age(age).unwrap().age_group_label;
        assert_eq!(label(0.0), "Newborn (0-3 months)");
        assert_eq!(label(0.25), "Infant (4-11 months)");
        assert_eq!(label(1.0), "Toddler (1-2 years)");
        assert_eq!(label(2.0), "Toddler (1-2 years)");
        assert_eq!(label(2.5), "Preschool (3-5 years)");
        assert_eq!(label(13.0), "School age (6-13 years)");
        assert_eq!(label(17.0), "Teen (14-17 years)");
        assert_eq!(label(25.0), "Young adult (18-25 years)");
        assert_eq!(label(64.0), "Adult (26-64 years)");
        assert_eq!(label(64.5), "Older adult (65+ years)");
    }

    #[test]
    fn test_out_of_range_ages_are_clamped() {
        assert_eq!(recommendation_for_age(-3.0).unwrap().age_group_label, "Newborn (0-3 months)");
        assert_eq!(recommendation_for_age(150.0).unwrap().age_group_label, "Older adult (65+ years)");
        assert!(recommendation_for_age(f64::NAN).is_none());
    }

    #[test]
    fn test_age_widens_range_and_flags_recommended() {
        // Adult band recommends 5-6 cycles; enumerate 4..=7
        let options = compute_options(hm("07:00"), CycleDirection::FromWake, Some(30.0));
        let cycles: Vec<u32> = options.iter().map(|o| o.cycles).collect();
        assert_eq!(cycles, vec![4, 5, 6, 7]);
        let recommended: Vec<u32> = options
            .iter()
            .filter(|o| o.is_recommended_for_age)
            .map(|o| o.cycles)
            .collect();
        assert_eq!(recommended, vec![5, 6]);
    }

    #[test]
    fn test_newborn_range_clamped_to_eleven() {
        // Newborn band 9-11 widens to 8..=12, clamped to 8..=11
        let options = compute_options(hm("07:00"), CycleDirection::FromWake, Some(0.1));
        let cycles: Vec<u32> = options.iter().map(|o| o.cycles).collect();
        assert_eq!(cycles, vec![8, 9, 10, 11]);
        assert!(!options[0].is_recommended_for_age);
        assert!(options[1..].iter().all(|o| o.is_recommended_for_age));
        assert!(options.iter().all(|o| o.rating == CycleRating::Poor));
    }

    #[test]
    fn test_older_adult_single_recommended_cycle() {
        let options = compute_options(hm("06:00"), CycleDirection::FromWake, Some(80.0));
        let cycles: Vec<u32> = options.iter().map(|o| o.cycles).collect();
        assert_eq!(cycles, vec![4, 5, 6]);
        let recommended: Vec<u32> = options
            .iter()
            .filter(|o| o.is_recommended_for_age)
            .map(|o| o.cycles)
            .collect();
        assert_eq!(recommended, vec![5]);
    }

    #[test]
    fn test_rating_table() {
        assert_eq!(rate_cycles(3), CycleRating::Poor);
        assert_eq!(rate_cycles(4), CycleRating::Fair);
        assert_eq!(rate_cycles(5), CycleRating::Good);
        assert_eq!(rate_cycles(6), CycleRating::Ideal);
        assert_eq!(rate_cycles(7), CycleRating::Good);
        assert_eq!(rate_cycles(8), CycleRating::Poor);
    }

    #[test]
    fn test_sleep_now_matches_from_bed() {
        let calc = SleepCycleCalculator::default();
        let now = hm("22:40");
        assert_eq!(
            calc.sleep_now(now, None),
            calc.compute_options(now, CycleDirection::FromBed, None)
        );
    }

    #[test]
    fn test_custom_cycle_length() {
        let calc = SleepCycleCalculator::new(SleepSettings {
            cycle_minutes: 100,
            latency_minutes: 20,
            ..SleepSettings::default()
        });
        let options = calc.compute_options(hm("07:00"), CycleDirection::FromWake, None);
        // 4 * 100 + 20 = 420 minutes before 07:00
        assert_eq!(options[0].target_time.format_24h(), "00:00");
        assert!((options[0].total_sleep_hours - 400.0 / 60.0).abs() < 1e-9);
    }
}
