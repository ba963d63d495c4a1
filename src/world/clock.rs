//! World time derivation.
//!
//! The in-world clock is never stored or incremented. Every caller derives
//! the current world minute from `(wall now - epoch) * acceleration`, so the
//! simulation is immune to process restarts, missed invocations, and uneven
//! request arrival. One in-game day (1440 world minutes) passes every two
//! real hours: one world minute per five wall seconds.

use chrono::{DateTime, Utc};

use super::types::{DayPeriod, MoonPhase, Season, TimeOfDay};

/// World minutes per elapsed real minute.
pub const ACCELERATION: u64 = 12;
/// Wall seconds per world minute (60 / ACCELERATION).
pub const SECONDS_PER_WORLD_MINUTE: u64 = 5;

pub const MINUTES_PER_HOUR: u64 = 60;
pub const MINUTES_PER_DAY: u64 = 1440;
pub const DAYS_PER_YEAR: u64 = 120;
pub const DAYS_PER_SEASON: u64 = 30;
pub const DAYS_PER_MONTH: u64 = 10;
pub const LUNAR_CYCLE_DAYS: u64 = 30;

/// Month names across the 120-day year, ten days each.
pub const MONTH_NAMES: [&str; 12] = [
    "Firstmoon",
    "Thawtide",
    "Bloomtide",
    "Flameheart",
    "Suncrown",
    "Harvestmoon",
    "Fallowtide",
    "Frostfall",
    "Leafbare",
    "Deepwinter",
    "Icetide",
    "Lastfrost",
];

/// The fixed world epoch. Thin and `Copy`-cheap; everything interesting is a
/// pure function of the minute count it derives.
#[derive(Debug, Clone)]
pub struct WorldClock {
    epoch: DateTime<Utc>,
}

impl WorldClock {
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    /// World minutes elapsed at the given wall instant. Pure: the same wall
    /// instant always yields the same world minute.
    pub fn minutes_at(&self, wall: DateTime<Utc>) -> u64 {
        let elapsed = wall.signed_duration_since(self.epoch).num_seconds();
        if elapsed <= 0 {
            return 0;
        }
        elapsed as u64 / SECONDS_PER_WORLD_MINUTE
    }

    pub fn now_minutes(&self) -> u64 {
        self.minutes_at(Utc::now())
    }
}

/// Minute within the current world day (0..1440).
pub fn minute_of_day(total_minutes: u64) -> u64 {
    total_minutes % MINUTES_PER_DAY
}

/// Day within the current world year (0..120).
pub fn day_of_year(total_minutes: u64) -> u64 {
    (total_minutes / MINUTES_PER_DAY) % DAYS_PER_YEAR
}

pub fn season(total_minutes: u64) -> Season {
    match day_of_year(total_minutes) / DAYS_PER_SEASON {
        0 => Season::Spring,
        1 => Season::Summer,
        2 => Season::Autumn,
        _ => Season::Winter,
    }
}

/// Month name and 1-based day of month.
pub fn month(total_minutes: u64) -> (&'static str, u64) {
    let day = day_of_year(total_minutes);
    let index = (day / DAYS_PER_MONTH) as usize;
    (MONTH_NAMES[index.min(11)], day % DAYS_PER_MONTH + 1)
}

/// Lunar phase over a 30-day cycle split into eight equal spans.
pub fn moon_phase(total_minutes: u64) -> MoonPhase {
    let minutes_per_cycle = LUNAR_CYCLE_DAYS * MINUTES_PER_DAY;
    let in_cycle = total_minutes % minutes_per_cycle;
    // Eight phases over the cycle; integer arithmetic avoids float drift.
    let index = in_cycle * 8 / minutes_per_cycle;
    match index {
        0 => MoonPhase::New,
        1 => MoonPhase::WaxingCrescent,
        2 => MoonPhase::FirstQuarter,
        3 => MoonPhase::WaxingGibbous,
        4 => MoonPhase::Full,
        5 => MoonPhase::WaningGibbous,
        6 => MoonPhase::LastQuarter,
        _ => MoonPhase::WaningCrescent,
    }
}

pub fn moon_description(phase: MoonPhase) -> &'static str {
    match phase {
        MoonPhase::New => "The sky is dark; the moon hides its face tonight.",
        MoonPhase::WaxingCrescent => "A thin sliver of moon hangs low in the sky.",
        MoonPhase::FirstQuarter => "Half the moon glows steadily overhead.",
        MoonPhase::WaxingGibbous => "The moon swells toward fullness, bright and bold.",
        MoonPhase::Full => "The full moon floods the land with silver light.",
        MoonPhase::WaningGibbous => "The moon has begun to shrink, though it still shines bright.",
        MoonPhase::LastQuarter => "Half the moon remains, fading night by night.",
        MoonPhase::WaningCrescent => "Only a waning sliver of moon remains in the sky.",
    }
}

/// Sunrise and sunset minutes from midnight for a season.
pub fn sunrise_sunset(season: Season) -> (u64, u64) {
    match season {
        Season::Spring => (390, 1170),
        Season::Summer => (360, 1200),
        Season::Autumn => (390, 1170),
        Season::Winter => (420, 1140),
    }
}

/// Bucket the world minute into dawn/day/dusk/night using the season's
/// sunrise and sunset. Dawn and dusk are the 30-minute windows either side.
pub fn time_of_day(total_minutes: u64) -> TimeOfDay {
    let minute = minute_of_day(total_minutes);
    let (sunrise, sunset) = sunrise_sunset(season(total_minutes));

    let dawn_start = sunrise.saturating_sub(30);
    let dawn_end = sunrise + 30;
    let dusk_start = sunset.saturating_sub(30);
    let dusk_end = (sunset + 30).min(MINUTES_PER_DAY);

    if (dawn_start..dawn_end).contains(&minute) {
        TimeOfDay::Dawn
    } else if (dawn_end..dusk_start).contains(&minute) {
        TimeOfDay::Day
    } else if (dusk_start..dusk_end).contains(&minute) {
        TimeOfDay::Dusk
    } else {
        TimeOfDay::Night
    }
}

/// Coarse day/night split used for dawn/dusk announcement edges: dawn and
/// day count as day, dusk and night as night.
pub fn day_period(total_minutes: u64) -> DayPeriod {
    match time_of_day(total_minutes) {
        TimeOfDay::Dawn | TimeOfDay::Day => DayPeriod::Day,
        TimeOfDay::Dusk | TimeOfDay::Night => DayPeriod::Night,
    }
}

/// Render the minute of day as a 12-hour clock string, "6:05AM" style.
pub fn clock_string(total_minutes: u64) -> String {
    let minute = minute_of_day(total_minutes);
    let hour24 = minute / MINUTES_PER_HOUR;
    let min = minute % MINUTES_PER_HOUR;
    let suffix = if hour24 < 12 { "AM" } else { "PM" };
    let hour12 = match hour24 % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02}{}", hour12, min, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn clock() -> WorldClock {
        WorldClock::new(Utc::now() - Duration::hours(1))
    }

    #[test]
    fn derivation_is_pure_for_fixed_instant() {
        let clock = clock();
        let wall = Utc::now();
        assert_eq!(clock.minutes_at(wall), clock.minutes_at(wall));
    }

    #[test]
    fn one_real_hour_is_720_world_minutes() {
        let epoch = Utc::now();
        let clock = WorldClock::new(epoch);
        let later = epoch + Duration::hours(1);
        assert_eq!(clock.minutes_at(later), 720);
    }

    #[test]
    fn epoch_in_future_clamps_to_zero() {
        let clock = WorldClock::new(Utc::now() + Duration::hours(5));
        assert_eq!(clock.now_minutes(), 0);
    }

    #[test]
    fn seasons_rotate_every_thirty_days() {
        assert_eq!(season(0), Season::Spring);
        assert_eq!(season(30 * MINUTES_PER_DAY), Season::Summer);
        assert_eq!(season(60 * MINUTES_PER_DAY), Season::Autumn);
        assert_eq!(season(90 * MINUTES_PER_DAY), Season::Winter);
        assert_eq!(season(120 * MINUTES_PER_DAY), Season::Spring);
    }

    #[test]
    fn months_are_ten_days() {
        assert_eq!(month(0), ("Firstmoon", 1));
        assert_eq!(month(9 * MINUTES_PER_DAY), ("Firstmoon", 10));
        assert_eq!(month(10 * MINUTES_PER_DAY), ("Thawtide", 1));
        assert_eq!(month(119 * MINUTES_PER_DAY), ("Lastfrost", 10));
    }

    #[test]
    fn moon_cycles_through_eight_phases() {
        assert_eq!(moon_phase(0), MoonPhase::New);
        // Full moon lands in the fifth span of the 30-day cycle.
        assert_eq!(moon_phase(15 * MINUTES_PER_DAY), MoonPhase::Full);
        assert_eq!(moon_phase(29 * MINUTES_PER_DAY), MoonPhase::WaningCrescent);
        assert_eq!(moon_phase(30 * MINUTES_PER_DAY), MoonPhase::New);
    }

    #[test]
    fn time_of_day_brackets_follow_season() {
        // Spring sunrise is 6:30 (390). 6:15 is dawn, 7:05 is day.
        assert_eq!(time_of_day(375), TimeOfDay::Dawn);
        assert_eq!(time_of_day(425), TimeOfDay::Day);
        // Spring sunset 19:30 (1170): 19:15 dusk, 20:05 night.
        assert_eq!(time_of_day(1155), TimeOfDay::Dusk);
        assert_eq!(time_of_day(1205), TimeOfDay::Night);
        // Winter sunrise 7:00 (420): 6:15 is still night.
        let winter = 90 * MINUTES_PER_DAY;
        assert_eq!(time_of_day(winter + 375), TimeOfDay::Night);
        assert_eq!(time_of_day(winter + 395), TimeOfDay::Dawn);
    }

    #[test]
    fn clock_string_formats_twelve_hour() {
        assert_eq!(clock_string(0), "12:00AM");
        assert_eq!(clock_string(365), "6:05AM");
        assert_eq!(clock_string(720), "12:00PM");
        assert_eq!(clock_string(1170), "7:30PM");
    }
}
