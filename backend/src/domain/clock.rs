//! Source of "today" and "now" for the domain layer.
//!
//! Streaks and the daily class-earnings reset depend on the local calendar day,
//! so services take a [`Clock`] instead of calling `chrono::Local` directly.

use chrono::{Local, NaiveDate, Utc};
use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};

pub trait Clock: Send + Sync {
    /// Current local calendar day
    fn today(&self) -> NaiveDate;

    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Wall clock in the machine's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock, used by tests to walk across calendar days
#[derive(Debug)]
pub struct FixedClock {
    days_from_ce: AtomicI32,
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        let millis = today
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self {
            days_from_ce: AtomicI32::new(chrono::Datelike::num_days_from_ce(&today)),
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.days_from_ce
            .store(chrono::Datelike::num_days_from_ce(&today), Ordering::SeqCst);
    }

    /// Move the calendar forward (or back, with a negative count)
    pub fn advance_days(&self, days: i32) {
        self.days_from_ce.fetch_add(days, Ordering::SeqCst);
        self.millis
            .fetch_add(i64::from(days) * 86_400_000, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        NaiveDate::from_num_days_from_ce_opt(self.days_from_ce.load(Ordering::SeqCst))
            .unwrap_or_default()
    }

    fn now_millis(&self) -> i64 {
        // Each read moves forward so consecutive transactions keep distinct timestamps
        self.millis.fetch_add(1, Ordering::SeqCst)
    }
}
