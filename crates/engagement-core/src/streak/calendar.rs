//! Month view of the streak history.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::tracker::StreakState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayMark {
    Active,
    Frozen,
    Missed,
    /// Today when still open, or later.
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub mark: DayMark,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
    pub active_days: u32,
    pub frozen_days: u32,
}

/// Mark every day of `year`/`month` relative to `today`.
///
/// Returns `None` for an invalid month.
pub fn month_calendar(state: &StreakState, year: i32, month: u32, today: NaiveDate) -> Option<MonthCalendar> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;

    let mut days = Vec::new();
    let mut day = first;
    while day.month() == month && day.year() == year {
        let mark = if state.is_active(day) {
            DayMark::Active
        } else if state.is_frozen(day) {
            DayMark::Frozen
        } else if day >= today {
            DayMark::Open
        } else {
            DayMark::Missed
        };
        days.push(CalendarDay { date: day, mark });
        day += Duration::days(1);
    }

    let count = |mark: DayMark| days.iter().filter(|d| d.mark == mark).count() as u32;
    Some(MonthCalendar {
        year,
        month,
        active_days: count(DayMark::Active),
        frozen_days: count(DayMark::Frozen),
        days,
    })
}
