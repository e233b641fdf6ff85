//! Wall-clock time arithmetic
//!
//! All calculators work on a single 24-hour dial. A [`WallClock`] is a count of
//! minutes since midnight, always normalized into `[0, 1440)`. Parsing is
//! permissive: out-of-range hours and minutes are clamped rather than rejected,
//! and only structurally malformed strings fail.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::{CalcError, Result};

/// Minutes in one day
pub const MINUTES_PER_DAY: i64 = 1440;

/// A time of day with minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WallClock(u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl WallClock {
    /// Midnight (00:00)
    pub const MIDNIGHT: WallClock = WallClock(0);

    /// Build from any minute count, wrapping into a single day
    pub fn from_minutes(minutes: i64) -> Self {
        Self(minutes.rem_euclid(MINUTES_PER_DAY) as u16)
    }

    /// Build from an hour and minute, clamping each into range
    pub fn from_hm(hour: u32, minute: u32) -> Self {
        Self((hour.min(23) * 60 + minute.min(59)) as u16)
    }

    /// Parse `"H:MM"`/`"HH:MM"`, optionally followed by `AM`/`PM`.
    ///
    /// Hours are clamped to 0-23 (0-12 with a meridiem, 0 reading as 12) and
    /// minutes to 0-59.
    pub fn parse(input: &str) -> Result<Self> {
        let upper = input.trim().to_ascii_uppercase();
        let (body, meridiem) = if let Some(body) = upper.strip_suffix("AM") {
            (body.trim_end(), Some(Meridiem::Am))
        } else if let Some(body) = upper.strip_suffix("PM") {
            (body.trim_end(), Some(Meridiem::Pm))
        } else {
            (upper.as_str(), None)
        };

        let invalid = || CalcError::InvalidFormat(input.to_string());

        let (hour_str, minute_str) = body.split_once(':').ok_or_else(invalid)?;
        let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if hour_str.len() > 2 || minute_str.len() != 2 || !is_digits(hour_str) || !is_digits(minute_str) {
            return Err(invalid());
        }

        let raw_hour: u32 = hour_str.parse().map_err(|_| invalid())?;
        let raw_minute: u32 = minute_str.parse().map_err(|_| invalid())?;

        // With a meridiem, hour 0 reads like 12 ("0:10 AM" is 00:10)
        let minute = raw_minute.min(59);
        let hour = match meridiem {
            None => raw_hour.min(23),
            Some(Meridiem::Am) => raw_hour.min(12) % 12,
            Some(Meridiem::Pm) => raw_hour.min(12) % 12 + 12,
        };

        let clamped_hour = match meridiem {
            None => hour != raw_hour,
            Some(_) => raw_hour > 12,
        };
        if clamped_hour || minute != raw_minute {
            warn!(input, "clamped out-of-range time components");
        }

        Ok(Self::from_hm(hour, minute))
    }

    /// Minutes since midnight, in `[0, 1440)`
    pub fn to_minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u32 {
        u32::from(self.0) / 60
    }

    pub fn minute(self) -> u32 {
        u32::from(self.0) % 60
    }

    /// Shift by a signed number of minutes, wrapping around midnight as many
    /// times as needed.
    pub fn add_minutes(self, delta: i64) -> Self {
        Self::from_minutes(i64::from(self.0) + delta.rem_euclid(MINUTES_PER_DAY))
    }

    /// Forward distance on the dial from `self` to `later`, in `[0, 1440)`
    pub fn minutes_until(self, later: WallClock) -> u16 {
        (i64::from(later.0) - i64::from(self.0)).rem_euclid(MINUTES_PER_DAY) as u16
    }

    /// `"h:mm AM"` / `"h:mm PM"`
    pub fn format_12h(self) -> String {
        let (hour, suffix) = match self.hour() {
            0 => (12, "AM"),
            h @ 1..=11 => (h, "AM"),
            12 => (12, "PM"),
            h => (h - 12, "PM"),
        };
        format!("{}:{:02} {}", hour, self.minute(), suffix)
    }

    /// `"HH:MM"`
    pub fn format_24h(self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or_default()
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for WallClock {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<NaiveTime> for WallClock {
    fn from(time: NaiveTime) -> Self {
        Self::from_hm(time.hour(), time.minute())
    }
}

impl Serialize for WallClock {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WallClock {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_24h() {
        assert_eq!(WallClock::parse("07:00").unwrap().to_minutes(), 420);
        assert_eq!(WallClock::parse("7:05").unwrap().to_minutes(), 425);
        assert_eq!(WallClock::parse(" 23:59 ").unwrap().to_minutes(), 1439);
        assert_eq!(WallClock::parse("0:00").unwrap(), WallClock::MIDNIGHT);
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        assert_eq!(WallClock::parse("25:00").unwrap().format_24h(), "23:00");
        assert_eq!(WallClock::parse("10:75").unwrap().format_24h(), "10:59");
        assert_eq!(WallClock::parse("99:99").unwrap().format_24h(), "23:59");
    }

    #[test]
    fn test_parse_meridiem() {
        assert_eq!(WallClock::parse("12:00 AM").unwrap().format_24h(), "00:00");
        assert_eq!(WallClock::parse("12:30 pm").unwrap().format_24h(), "12:30");
        assert_eq!(WallClock::parse("9:15PM").unwrap().format_24h(), "21:15");
        assert_eq!(WallClock::parse("0:10 AM").unwrap().format_24h(), "00:10");
        assert_eq!(WallClock::parse("0:10 PM").unwrap().format_24h(), "12:10");
        assert_eq!(WallClock::parse("15:00 PM").unwrap().format_24h(), "12:00");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "7", "7:0", "123:00", "ab:cd", "07-00", "07:000", ":30", "7:3a", "-1:00"] {
            let err = WallClock::parse(bad).unwrap_err();
            assert!(matches!(err, CalcError::InvalidFormat(_)), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_add_minutes_wraps() {
        let eleven_pm = WallClock::from_hm(23, 0);
        assert_eq!(eleven_pm.add_minutes(90).format_24h(), "00:30");
        assert_eq!(WallClock::from_hm(1, 0).add_minutes(-120).format_24h(), "23:00");
        assert_eq!(WallClock::from_hm(6, 0).add_minutes(3 * 1440 + 30).format_24h(), "06:30");
        assert_eq!(WallClock::from_hm(6, 0).add_minutes(-5 * 1440 - 30).format_24h(), "05:30");
    }

    #[test]
    fn test_add_minutes_is_invertible() {
        let deltas = [0, 1, -1, 59, 1439, 1440, -1441, 10_000, -98_765, i64::MAX, i64::MIN + 1];
        for start in [0, 1, 420, 719, 1439] {
            let w = WallClock::from_minutes(start);
            for d in deltas {
                let shifted = w.add_minutes(d);
                assert!(shifted.to_minutes() < 1440);
                assert_eq!(shifted.add_minutes(-d), w, "start {start} delta {d}");
            }
        }
    }

    #[test]
    fn test_format_12h() {
        assert_eq!(WallClock::from_hm(0, 0).format_12h(), "12:00 AM");
        assert_eq!(WallClock::from_hm(9, 5).format_12h(), "9:05 AM");
        assert_eq!(WallClock::from_hm(12, 0).format_12h(), "12:00 PM");
        assert_eq!(WallClock::from_hm(21, 45).format_12h(), "9:45 PM");
    }

    #[test]
    fn test_minutes_until() {
        let bed = WallClock::from_hm(23, 0);
        let wake = WallClock::from_hm(7, 0);
        assert_eq!(bed.minutes_until(wake), 480);
        assert_eq!(wake.minutes_until(bed), 960);
        assert_eq!(wake.minutes_until(wake), 0);
    }

    #[test]
    fn test_naive_time_conversion() {
        let t = NaiveTime::from_hms_opt(18, 45, 30).unwrap();
        let w = WallClock::from(t);
        assert_eq!(w.format_24h(), "18:45");
        assert_eq!(w.to_naive_time(), NaiveTime::from_hms_opt(18, 45, 0).unwrap());
    }

    #[test]
    fn test_serde_as_string() {
        let w = WallClock::from_hm(6, 30);
        assert_eq!(serde_json::to_string(&w).unwrap(), "\"06:30\"");
        let back: WallClock = serde_json::from_str("\"6:30 AM\"").unwrap();
        assert_eq!(back, w);
        assert!(serde_json::from_str::<WallClock>("\"noon\"").is_err());
    }
}
