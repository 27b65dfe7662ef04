use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use chrono_tz::Tz;

/// Source of the calendar date used to reject bookings in the past.
pub trait Clock: Send + Sync + fmt::Debug {
    fn today(&self) -> NaiveDate;
}

/// Timezone in which "today" is decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingZone {
    /// IANA zone; follows daylight saving.
    Named(Tz),
    Fixed(FixedOffset),
}

impl BookingZone {
    pub fn named(name: &str) -> Result<Self, String> {
        name.trim()
            .parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| format!("unknown timezone `{}`", name.trim()))
    }

    pub fn fixed_minutes(minutes: i32) -> Option<Self> {
        minutes.checked_mul(60).and_then(FixedOffset::east_opt).map(Self::Fixed)
    }

    pub fn date_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Named(tz) => instant.with_timezone(tz).date_naive(),
            Self::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }
}

impl Default for BookingZone {
    fn default() -> Self {
        Self::Fixed(Utc.fix())
    }
}

/// Wall clock evaluated in the booking timezone configured at startup.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock {
    zone: BookingZone,
}

impl SystemClock {
    pub fn new(zone: BookingZone) -> Self {
        Self { zone }
    }

    /// Out-of-range offsets fall back to UTC; config validation rejects them earlier.
    pub fn with_utc_offset_minutes(minutes: i32) -> Self {
        Self::new(BookingZone::fixed_minutes(minutes).unwrap_or_default())
    }

    pub fn zone(&self) -> BookingZone {
        self.zone
    }

    pub fn today_at(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.zone.date_at(instant)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        self.today_at(Utc::now())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
