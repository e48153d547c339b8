use chrono::Weekday;
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: i32 = 1440;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

impl TimeWindow {
    /// Parses the window into minutes since local midnight. "23:59" and
    /// "24:00" both close the day.
    pub fn as_minutes(&self) -> Option<(i32, i32)> {
        let start = parse_hhmm(&self.start)?;
        let mut end = parse_hhmm(&self.end)?;
        if end == MINUTES_PER_DAY - 1 {
            end = MINUTES_PER_DAY;
        }
        (start < end).then_some((start, end))
    }
}

fn parse_hhmm(value: &str) -> Option<i32> {
    let (h, m) = value.trim().split_once(':')?;
    let hours: i32 = h.parse().ok()?;
    let minutes: i32 = m.parse().ok()?;
    if !(0..60).contains(&minutes) {
        return None;
    }
    let total = hours.checked_mul(60)?.checked_add(minutes)?;
    (0..=MINUTES_PER_DAY).contains(&total).then_some(total)
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct WeekdayConfig {
    pub monday: Option<Vec<TimeWindow>>,
    pub tuesday: Option<Vec<TimeWindow>>,
    pub wednesday: Option<Vec<TimeWindow>>,
    pub thursday: Option<Vec<TimeWindow>>,
    pub friday: Option<Vec<TimeWindow>>,
    pub saturday: Option<Vec<TimeWindow>>,
    pub sunday: Option<Vec<TimeWindow>>,
}

impl WeekdayConfig {
    pub fn windows_for(&self, weekday: Weekday) -> &[TimeWindow] {
        let windows = match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        };
        windows.as_deref().unwrap_or(&[])
    }
}
