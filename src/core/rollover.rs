//! Pure decisions behind a schedule rebuild.
//!
//! Kept free of I/O so the day-boundary arithmetic can be tested against
//! any instant.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::schedule::{PrayerName, Schedule};
use crate::trigger::floor_minute;

/// Which day a rebuild should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverDecision {
    Today,
    Tomorrow,
}

impl RolloverDecision {
    /// Decide from today's unpruned schedule.
    ///
    /// Once the last event of today is at or before `now` there is nothing
    /// left to announce today, so the next day is targeted. A schedule
    /// without provider times says nothing about the day and stays on today.
    pub fn decide(today: &Schedule, now: NaiveDateTime) -> Self {
        if today.is_degraded() {
            return RolloverDecision::Today;
        }
        match today.last_event() {
            Some(last) if last.time > now => RolloverDecision::Today,
            _ => RolloverDecision::Tomorrow,
        }
    }

    pub fn target_date(self, today: NaiveDate) -> NaiveDate {
        match self {
            RolloverDecision::Today => today,
            RolloverDecision::Tomorrow => today.succ_opt().unwrap_or(today),
        }
    }
}

/// When the next rebuild should run.
///
/// `offset` after the latest provider time in `live`, or in `built` (the
/// unpruned target schedule) when everything in `live` has already passed.
/// Falls back to `now + offset` when that instant is not in the future or
/// the provider returned nothing, so a failed fetch is retried on the next
/// cycle without spinning.
pub fn refresh_time(
    live: &Schedule,
    built: &Schedule,
    now: NaiveDateTime,
    offset: Duration,
) -> NaiveDateTime {
    let last_provided = |schedule: &Schedule| {
        schedule
            .events()
            .iter()
            .filter(|event| event.provided)
            .map(|event| event.time)
            .max()
    };

    match last_provided(live).or_else(|| last_provided(built)) {
        Some(last) if floor_minute(last + offset) > now => last + offset,
        _ => now + offset,
    }
}

/// When the pre-Maghrib recitation should start, if it still can today.
///
/// Requires a provider Maghrib in `live`. Returns `None` if the start
/// minute is not strictly after `now`, so a late start skips the
/// recitation instead of playing it late.
pub fn recitation_time(
    live: &Schedule,
    now: NaiveDateTime,
    offset: Duration,
) -> Option<NaiveDateTime> {
    let maghrib = live.get(PrayerName::Maghrib).filter(|event| event.provided)?;
    let start = floor_minute(maghrib.time - offset);
    (start > now).then_some(start)
}

/// The prayer whose time has most recently arrived, from an unpruned
/// schedule.
pub fn current_prayer(schedule: &Schedule, now: NaiveDateTime) -> Option<PrayerName> {
    schedule
        .events()
        .iter()
        .filter(|event| event.provided && event.time <= now)
        .max_by_key(|event| event.time)
        .map(|event| event.name)
}
