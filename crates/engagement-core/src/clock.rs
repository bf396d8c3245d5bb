//! Injectable time sources and the fixed civil calendar.
//!
//! The engines never read the wall clock. Orchestration asks a [`Clock`] for
//! the current instant and maps it onto a civil date with [`CivilCalendar`],
//! which always uses one configured UTC offset for every user. Day
//! boundaries therefore never depend on the host's local timezone.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and offline simulation.
///
/// Clones share the same instant, so a test can keep a handle while the
/// session owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = at;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Calendar used for streak day boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CivilCalendar {
    offset_secs: i32,
}

impl CivilCalendar {
    /// Calendar at a fixed offset east of UTC.
    pub fn from_offset(offset: FixedOffset) -> Self {
        Self {
            offset_secs: offset.local_minus_utc(),
        }
    }

    /// Parse `UTC`, `Z`, `+05:30`, `-0800` or `+09`.
    pub fn parse(tz: &str) -> Result<Self, ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidValue {
            key: "streak.timezone".to_string(),
            message: format!("'{tz}': {message}"),
        };

        let trimmed = tz.trim();
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(Self { offset_secs: 0 });
        }

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(invalid("expected a leading '+' or '-'")),
        };

        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("offset must be numeric"));
        }
        let (hours, minutes) = match digits.len() {
            2 => (&digits[..2], "0"),
            4 => (&digits[..2], &digits[2..]),
            _ => return Err(invalid("expected HH, HHMM or HH:MM")),
        };
        let hours: i32 = hours.parse().map_err(|_| invalid("bad hours"))?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid("bad minutes"))?;
        if hours > 23 || minutes > 59 {
            return Err(invalid("offset out of range"));
        }

        let offset_secs = sign * (hours * 3600 + minutes * 60);
        FixedOffset::east_opt(offset_secs).ok_or_else(|| invalid("offset out of range"))?;
        Ok(Self { offset_secs })
    }

    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.offset_secs).unwrap_or_else(|| Utc.fix())
    }

    /// Civil date containing `now`.
    pub fn civil_today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset()).date_naive()
    }

    /// Instant at which `date` begins in this calendar.
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        let offset = Duration::seconds(i64::from(self.offset_secs));
        (local_midnight - offset).and_utc()
    }

    /// Time left before the civil day containing `now` ends.
    pub fn until_rollover(&self, now: DateTime<Utc>) -> Duration {
        let tomorrow = self.civil_today(now) + Duration::days(1);
        self.start_of_day(tomorrow) - now
    }

    /// Label in `+HH:MM` form.
    pub fn label(&self) -> String {
        let sign = if self.offset_secs < 0 { '-' } else { '+' };
        let abs = self.offset_secs.abs();
        format!("{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
    }
}

impl Default for CivilCalendar {
    fn default() -> Self {
        Self { offset_secs: 0 }
    }
}
