//! Simulated calendar derived from the tick counter.

use eco_core::{
    DAYS_PER_MONTH, HOURS_PER_DAY, MINUTES_PER_HOUR, MONTHS_PER_SEASON, MONTHS_PER_YEAR,
    SEASONS_PER_YEAR, TICKS_PER_MINUTE,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    fn from_index(index: u64) -> Self {
        match index % SEASONS_PER_YEAR {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        };
        f.write_str(name)
    }
}

/// Elapsed time since the simulation started. `minute`, `hour`, `day` and `month`
/// are totals, not positions within the enclosing unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Calendar {
    pub tick: u64,
    pub minute: u64,
    pub hour: u64,
    pub day: u64,
    pub month: u64,
    pub season: Season,
}

impl Default for Season {
    fn default() -> Self {
        Season::Spring
    }
}

impl Calendar {
    pub fn at(tick: u64) -> Self {
        let minute = tick / TICKS_PER_MINUTE;
        let hour = minute / MINUTES_PER_HOUR;
        let day = hour / HOURS_PER_DAY;
        let month = day / DAYS_PER_MONTH;
        Self {
            tick,
            minute,
            hour,
            day,
            month,
            season: Season::from_index(month / MONTHS_PER_SEASON),
        }
    }

    pub fn year(&self) -> u64 {
        self.month / MONTHS_PER_YEAR
    }

    pub fn minute_of_hour(&self) -> u64 {
        self.minute % MINUTES_PER_HOUR
    }

    pub fn hour_of_day(&self) -> u64 {
        self.hour % HOURS_PER_DAY
    }

    pub fn day_of_month(&self) -> u64 {
        self.day % DAYS_PER_MONTH
    }

    pub fn month_of_year(&self) -> u64 {
        self.month % MONTHS_PER_YEAR
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.year() > 0 {
            write!(f, "{} ", plural(self.year(), "year"))?;
        }
        if self.month > 0 {
            write!(f, "{} ", plural(self.month_of_year(), "month"))?;
        }
        write!(
            f,
            "{}, {:02}:{:02} ({})",
            plural(self.day_of_month(), "day"),
            self.hour_of_day(),
            self.minute_of_hour(),
            self.season
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::{TICKS_PER_DAY, TICKS_PER_HOUR, TICKS_PER_YEAR};
    use proptest::prelude::*;

    #[test]
    fn test_calendar_start() {
        let calendar = Calendar::at(0);
        assert_eq!(calendar.hour, 0);
        assert_eq!(calendar.season, Season::Spring);
        assert_eq!(calendar.to_string(), "0 days, 00:00 (Spring)");
    }

    #[test]
    fn test_calendar_divisions() {
        let calendar = Calendar::at(TICKS_PER_DAY * 95 + TICKS_PER_HOUR * 7 + 6 * 5);
        assert_eq!(calendar.day, 95);
        assert_eq!(calendar.month, 3);
        assert_eq!(calendar.season, Season::Summer);
        assert_eq!(calendar.hour_of_day(), 7);
        assert_eq!(calendar.minute_of_hour(), 5);
        assert_eq!(calendar.day_of_month(), 5);
    }

    #[test]
    fn test_seasons_wrap_each_year() {
        assert_eq!(Calendar::at(TICKS_PER_YEAR - 1).season, Season::Winter);
        assert_eq!(Calendar::at(TICKS_PER_YEAR).season, Season::Spring);
        assert_eq!(Calendar::at(TICKS_PER_YEAR).year(), 1);
    }

    #[test]
    fn test_display_long_run() {
        let calendar = Calendar::at(TICKS_PER_YEAR + TICKS_PER_DAY * 31 + TICKS_PER_HOUR * 13);
        assert_eq!(calendar.to_string(), "1 year 1 month 1 day, 13:00 (Spring)");
    }

    proptest! {
        #[test]
        fn prop_fields_never_decrease(tick in 0u64..50_000_000, step in 1u64..100_000) {
            let a = Calendar::at(tick);
            let b = Calendar::at(tick + step);
            prop_assert!(b.minute >= a.minute);
            prop_assert!(b.hour >= a.hour);
            prop_assert!(b.day >= a.day);
            prop_assert!(b.month >= a.month);
        }
    }
}
