//! Minute-granularity trigger engine driven by an external tick.
//!
//! Triggers are plain data: a due instant, a [`TriggerTag`], an [`Action`]
//! to hand back to the caller and a [`Recurrence`]. The engine holds no
//! callbacks. [`TriggerEngine::tick`] returns the actions that are due, in
//! firing order, and the owner dispatches them. This keeps firing order
//! deterministic and lets tests inspect exactly what would run.
//!
//! Ordering: ascending due time, then tag (prayer, refresh, recitation,
//! display poll), then arming order.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

use crate::schedule::PrayerName;

/// Category of a trigger, used for ordering and bulk clearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TriggerTag {
    Prayer,
    Refresh,
    Recitation,
    DisplayPoll,
}

impl fmt::Display for TriggerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerTag::Prayer => "prayer",
            TriggerTag::Refresh => "refresh",
            TriggerTag::Recitation => "recitation",
            TriggerTag::DisplayPoll => "display-poll",
        };
        f.write_str(name)
    }
}

/// What the owner should do when a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PlayPrayer(PrayerName),
    Refresh,
    PlayRecitation(NaiveDate),
    PollDisplay,
}

impl Action {
    pub fn tag(&self) -> TriggerTag {
        match self {
            Action::PlayPrayer(_) => TriggerTag::Prayer,
            Action::Refresh => TriggerTag::Refresh,
            Action::PlayRecitation(_) => TriggerTag::Recitation,
            Action::PollDisplay => TriggerTag::DisplayPoll,
        }
    }
}

/// How a trigger re-arms itself after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    /// Removed after firing.
    Once,
    /// Same wall-clock minute on the next day.
    Daily,
    /// Again `interval` after the tick that fired it.
    Every(Duration),
}

/// An armed trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    due: NaiveDateTime,
    action: Action,
    recurrence: Recurrence,
    seq: u64,
}

impl Trigger {
    pub fn due(&self) -> NaiveDateTime {
        self.due
    }

    /// `HH:MM` of the next firing.
    pub fn fires_at(&self) -> String {
        self.due.format("%H:%M").to_string()
    }

    pub fn tag(&self) -> TriggerTag {
        self.action.tag()
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence != Recurrence::Once
    }
}

/// Truncate to the start of the minute.
pub fn floor_minute(at: NaiveDateTime) -> NaiveDateTime {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

/// Holds armed triggers and fires the due ones on each tick.
#[derive(Debug, Default)]
pub struct TriggerEngine {
    triggers: Vec<Trigger>,
    next_seq: u64,
}

impl TriggerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `action` at the minute containing `at`.
    pub fn arm_at(&mut self, at: NaiveDateTime, action: Action, recurrence: Recurrence) {
        self.push(floor_minute(at), action, recurrence);
    }

    /// Arm `action` to fire every `interval`, first at `now + interval`.
    ///
    /// Interval triggers are not minute-aligned.
    pub fn arm_every(&mut self, now: NaiveDateTime, interval: Duration, action: Action) {
        self.push(now + interval, action, Recurrence::Every(interval));
    }

    fn push(&mut self, due: NaiveDateTime, action: Action, recurrence: Recurrence) {
        self.triggers.push(Trigger {
            due,
            action,
            recurrence,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Remove every trigger carrying `tag`. Returns how many were removed.
    pub fn clear(&mut self, tag: TriggerTag) -> usize {
        let before = self.triggers.len();
        self.triggers.retain(|trigger| trigger.tag() != tag);
        before - self.triggers.len()
    }

    /// Fire everything due at `now`.
    ///
    /// Each due trigger yields its action exactly once. `Once` triggers are
    /// removed, `Daily` ones move forward whole days until they are in the
    /// future again (a long suspend fires a missed trigger once, not once per
    /// missed day), and `Every` ones re-arm relative to `now`.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<Action> {
        let mut due: Vec<Trigger> = self
            .triggers
            .iter()
            .filter(|trigger| trigger.due <= now)
            .cloned()
            .collect();
        if due.is_empty() {
            return Vec::new();
        }
        due.sort_by_key(|trigger| (trigger.due, trigger.tag(), trigger.seq));

        self.triggers.retain_mut(|trigger| {
            if trigger.due > now {
                return true;
            }
            match trigger.recurrence {
                Recurrence::Once => false,
                Recurrence::Daily => {
                    while trigger.due <= now {
                        trigger.due += Duration::days(1);
                    }
                    true
                }
                Recurrence::Every(interval) => {
                    trigger.due = now + interval;
                    true
                }
            }
        });

        due.into_iter().map(|trigger| trigger.action).collect()
    }

    /// Armed triggers in firing order.
    pub fn pending(&self) -> Vec<&Trigger> {
        let mut pending: Vec<&Trigger> = self.triggers.iter().collect();
        pending.sort_by_key(|trigger| (trigger.due, trigger.tag(), trigger.seq));
        pending
    }

    /// Armed triggers with `tag`, in firing order.
    pub fn pending_with(&self, tag: TriggerTag) -> Vec<&Trigger> {
        self.pending()
            .into_iter()
            .filter(|trigger| trigger.tag() == tag)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}
