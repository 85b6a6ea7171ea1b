//! Day-anchored prayer schedules.
//!
//! A [`Schedule`] is built from the raw `HH:MM` strings a provider returned for
//! one calendar date. Events are produced in canonical order (Fajr, Dhuhr,
//! Asr, Maghrib, Isha) and carry a full local timestamp, so comparisons
//! against "now" never have to guess which day an `HH:MM` belongs to.
//!
//! Missing or unreadable times become the `00:00` sentinel on the schedule's
//! date. Sentinel events are kept in the schedule (they are pruned like any
//! other past event) but are flagged as not provided, and nothing arms a
//! trigger for them.
//!
//! A provided time that is not later than the previous provided time is
//! taken to be after midnight (Isha at high latitudes in summer) and moves to
//! the following day, which keeps provided events strictly increasing.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::common::constants::SENTINEL_TIME;

/// One of the five daily prayers, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrayerName {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl PrayerName {
    /// Canonical order. Also the tie-break order for display and firing.
    pub const ALL: [PrayerName; 5] = [
        PrayerName::Fajr,
        PrayerName::Dhuhr,
        PrayerName::Asr,
        PrayerName::Maghrib,
        PrayerName::Isha,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrayerName::Fajr => "Fajr",
            PrayerName::Dhuhr => "Dhuhr",
            PrayerName::Asr => "Asr",
            PrayerName::Maghrib => "Maghrib",
            PrayerName::Isha => "Isha",
        }
    }

    /// Map a provider key to a prayer, accepting the "Maghreb" spelling.
    ///
    /// Keys the daemon does not schedule (Sunrise, Imsak, Midnight, ...)
    /// return `None`.
    pub fn from_provider_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "fajr" => Some(PrayerName::Fajr),
            "dhuhr" => Some(PrayerName::Dhuhr),
            "asr" => Some(PrayerName::Asr),
            "maghrib" | "maghreb" => Some(PrayerName::Maghrib),
            "isha" => Some(PrayerName::Isha),
            _ => None,
        }
    }
}

impl fmt::Display for PrayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw `HH:MM` strings keyed by canonical prayer name.
///
/// An empty mapping is how a failed fetch is represented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTimings(BTreeMap<PrayerName, String>);

impl RawTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize a provider `timings` object. Unknown keys are dropped;
    /// if both spellings of Maghrib are present the canonical one wins.
    pub fn from_provider_map(map: &HashMap<String, String>) -> Self {
        let mut timings = Self::new();
        for (key, value) in map {
            if let Some(name) = PrayerName::from_provider_key(key) {
                let canonical = key.trim().eq_ignore_ascii_case(name.as_str());
                if canonical || !timings.0.contains_key(&name) {
                    timings.0.insert(name, value.clone());
                }
            }
        }
        timings
    }

    pub fn insert(&mut self, name: PrayerName, time: impl Into<String>) {
        self.0.insert(name, time.into());
    }

    pub fn get(&self, name: PrayerName) -> Option<&str> {
        self.0.get(&name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<S: Into<String>> FromIterator<(PrayerName, S)> for RawTimings {
    fn from_iter<I: IntoIterator<Item = (PrayerName, S)>>(iter: I) -> Self {
        let mut timings = Self::new();
        for (name, time) in iter {
            timings.insert(name, time);
        }
        timings
    }
}

/// Parse the leading `HH:MM` of a provider time string.
///
/// Providers sometimes append a zone label (`"05:12 (EDT)"`); only the first
/// whitespace-separated token is read.
pub fn parse_hour_minute(raw: &str) -> Option<NaiveTime> {
    let token = raw.split_whitespace().next()?;
    NaiveTime::parse_from_str(token, "%H:%M").ok()
}

/// A single prayer at a concrete local instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrayerEvent {
    pub name: PrayerName,
    pub time: NaiveDateTime,
    /// False when `time` is the sentinel substituted for missing data.
    pub provided: bool,
}

impl PrayerEvent {
    /// `HH:MM` as shown on the display and in logs.
    pub fn hour_minute(&self) -> String {
        self.time.format("%H:%M").to_string()
    }
}

/// Ordered prayer events anchored to one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    date: NaiveDate,
    events: Vec<PrayerEvent>,
}

impl Schedule {
    /// A schedule with nothing left in it.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            events: Vec::new(),
        }
    }

    /// Build all five events for `date` without pruning.
    pub fn from_timings(date: NaiveDate, raw: &RawTimings) -> Self {
        let sentinel = parse_hour_minute(SENTINEL_TIME).unwrap_or(NaiveTime::MIN);
        let mut events = Vec::with_capacity(PrayerName::ALL.len());
        let mut previous_provided: Option<NaiveDateTime> = None;

        for name in PrayerName::ALL {
            let parsed = raw.get(name).and_then(parse_hour_minute);
            if raw.get(name).is_some() && parsed.is_none() {
                log_warning!(
                    "Unreadable time {:?} for {name}, using {SENTINEL_TIME}",
                    raw.get(name).unwrap_or_default()
                );
            }

            let event = match parsed {
                Some(time) => {
                    let mut at = date.and_time(time);
                    if let Some(previous) = previous_provided
                        && at <= previous
                    {
                        at += Duration::days(1);
                    }
                    previous_provided = Some(at);
                    PrayerEvent {
                        name,
                        time: at,
                        provided: true,
                    }
                }
                None => PrayerEvent {
                    name,
                    time: date.and_time(sentinel),
                    provided: false,
                },
            };
            events.push(event);
        }

        // Stable: equal times keep canonical order.
        events.sort_by_key(|event| event.time);

        Self { date, events }
    }

    /// Build the schedule for `date` and drop everything not after `now`.
    pub fn build(date: NaiveDate, raw: &RawTimings, now: NaiveDateTime) -> Self {
        Self::from_timings(date, raw).pruned(now)
    }

    /// Copy of this schedule with everything not after `now` dropped.
    pub fn pruned(&self, now: NaiveDateTime) -> Self {
        let mut schedule = self.clone();
        let pruned = schedule.prune(now);
        if pruned > 0 {
            log_decorated!(
                "Pruned {pruned} past prayer{}",
                if pruned == 1 { "" } else { "s" }
            );
        }
        schedule
    }

    /// Remove every event whose time is not strictly after `now`.
    ///
    /// Returns how many events were removed. Idempotent for a fixed `now`.
    pub fn prune(&mut self, now: NaiveDateTime) -> usize {
        let before = self.events.len();
        self.events.retain(|event| event.time > now);
        before - self.events.len()
    }

    /// Remove the event called `name`, returning it if it was present.
    pub fn remove(&mut self, name: PrayerName) -> Option<PrayerEvent> {
        let index = self.events.iter().position(|event| event.name == name)?;
        Some(self.events.remove(index))
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn events(&self) -> &[PrayerEvent] {
        &self.events
    }

    pub fn get(&self, name: PrayerName) -> Option<&PrayerEvent> {
        self.events.iter().find(|event| event.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Latest event, preferring provided times over sentinels.
    ///
    /// This is the "last known event of the day" used for the rollover
    /// decision and for the refresh time.
    pub fn last_event(&self) -> Option<&PrayerEvent> {
        self.events
            .iter()
            .filter(|event| event.provided)
            .max_by_key(|event| event.time)
            .or_else(|| self.events.last())
    }

    /// Next event that will actually fire (provided times only).
    pub fn next_event(&self) -> Option<&PrayerEvent> {
        self.events.iter().find(|event| event.provided)
    }

    /// True when no event in the schedule came from the provider.
    pub fn is_degraded(&self) -> bool {
        self.events.iter().all(|event| !event.provided)
    }
}
