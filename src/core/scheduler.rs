//! The scheduler: sole owner of the live schedule, the armed triggers and
//! the output sinks.
//!
//! Everything runs on the caller's thread. `Core` feeds it one `tick` per
//! second and the scheduler decides what fires; tests drive it directly with
//! arbitrary instants.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::PathBuf;

use crate::common::constants::*;
use crate::common::utils::spread;
use crate::config::Config;
use crate::core::rollover::{RolloverDecision, current_prayer, recitation_time, refresh_time};
use crate::io::audio::{AudioKind, AudioSink};
use crate::io::display::DisplaySink;
use crate::provider::{Location, TimingsProvider};
use crate::recitation::{RecitationSource, select_content};
use crate::schedule::{PrayerName, Schedule};
use crate::trigger::{Action, Recurrence, TriggerEngine, TriggerTag};

/// Settings the scheduler reads on every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerSettings {
    pub location: Location,
    pub refresh_offset: Duration,
    pub adhan_asset: PathBuf,
    pub display_width: usize,
    pub poll_interval: Duration,
    /// `None` when the pre-Maghrib recitation is disabled.
    pub recitation: Option<RecitationSettings>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecitationSettings {
    pub offset: Duration,
    pub rotation: Vec<u32>,
    pub fallback: Option<PathBuf>,
}

impl SchedulerSettings {
    pub fn from_config(config: &Config) -> Self {
        let recitation = config.recitation_enabled().then(|| RecitationSettings {
            offset: config.recitation_offset(),
            rotation: config.recitation_rotation(),
            fallback: config.recitation_fallback.as_ref().map(PathBuf::from),
        });
        Self {
            location: config.location(),
            refresh_offset: config.refresh_offset(),
            adhan_asset: config.adhan_asset(),
            display_width: config.display_width(),
            poll_interval: config.poll_interval(),
            recitation,
        }
    }
}

pub struct Scheduler {
    settings: SchedulerSettings,
    provider: Box<dyn TimingsProvider>,
    audio: Box<dyn AudioSink>,
    display: Box<dyn DisplaySink>,
    recitation_source: Option<Box<dyn RecitationSource>>,
    engine: TriggerEngine,
    schedule: Schedule,
    /// Most recent prayer whose time has come.
    current: Option<PrayerName>,
    /// The last fetch produced no provider times at all.
    degraded: bool,
    /// Date whose recitation has already been started.
    last_recitation: Option<NaiveDate>,
    recitation_playing: bool,
    stopped: bool,
}

impl Scheduler {
    pub fn new(
        settings: SchedulerSettings,
        provider: Box<dyn TimingsProvider>,
        audio: Box<dyn AudioSink>,
        display: Box<dyn DisplaySink>,
    ) -> Self {
        Self {
            settings,
            provider,
            audio,
            display,
            recitation_source: None,
            engine: TriggerEngine::new(),
            schedule: Schedule::empty(NaiveDate::default()),
            current: None,
            degraded: false,
            last_recitation: None,
            recitation_playing: false,
            stopped: false,
        }
    }

    pub fn with_recitation_source(mut self, source: Box<dyn RecitationSource>) -> Self {
        self.recitation_source = Some(source);
        self
    }

    /// Show the waiting screen, arm the display poll and run the first cycle.
    pub fn start(&mut self, now: NaiveDateTime) {
        self.write_display(DISPLAY_TITLE, DISPLAY_WAITING);
        self.engine
            .arm_every(now, self.settings.poll_interval, Action::PollDisplay);
        self.rebuild(now);
    }

    /// Swap in new settings and provider, then rebuild immediately.
    pub fn reconfigure(
        &mut self,
        settings: SchedulerSettings,
        provider: Box<dyn TimingsProvider>,
        recitation_source: Option<Box<dyn RecitationSource>>,
        now: NaiveDateTime,
    ) {
        if settings.poll_interval != self.settings.poll_interval {
            self.engine.clear(TriggerTag::DisplayPoll);
            self.engine
                .arm_every(now, settings.poll_interval, Action::PollDisplay);
        }
        self.settings = settings;
        self.provider = provider;
        self.recitation_source = recitation_source;
        self.rebuild(now);
    }

    /// One fetch cycle: pick the target day, rebuild the live schedule and
    /// re-arm every prayer, recitation and refresh trigger.
    pub fn rebuild(&mut self, now: NaiveDateTime) {
        for tag in [
            TriggerTag::Prayer,
            TriggerTag::Refresh,
            TriggerTag::Recitation,
        ] {
            self.engine.clear(tag);
        }

        let today = now.date();
        log_block_start!(
            "Fetching prayer times from {} for {}",
            self.provider.name(),
            self.settings.location
        );
        let provisional_raw = self.provider.fetch(today, &self.settings.location);
        let provisional = Schedule::from_timings(today, &provisional_raw);
        self.current = current_prayer(&provisional, now);

        let decision = RolloverDecision::decide(&provisional, now);
        let target = decision.target_date(today);
        let built = match decision {
            RolloverDecision::Today => provisional,
            RolloverDecision::Tomorrow => {
                log_decorated!("Nothing left today, building {target}");
                let raw = self.provider.fetch(target, &self.settings.location);
                Schedule::from_timings(target, &raw)
            }
        };
        let live = built.pruned(now);
        self.degraded = built.is_degraded();

        if self.degraded {
            log_warning!("No prayer times available for {target}");
        }
        for event in live.events() {
            if event.provided {
                self.engine
                    .arm_at(event.time, Action::PlayPrayer(event.name), Recurrence::Daily);
                log_indented!("Armed {} at {}", event.name, event.hour_minute());
            } else if !self.degraded {
                log_indented!("{} has no time, not armed", event.name);
            }
        }

        self.arm_recitation(&live, now);

        let refresh_at = refresh_time(&live, &built, now, self.settings.refresh_offset);
        self.engine
            .arm_at(refresh_at, Action::Refresh, Recurrence::Daily);
        log_indented!("Armed refresh at {}", refresh_at.format("%Y-%m-%d %H:%M"));

        self.schedule = live;
        self.refresh_display(now);
    }

    fn arm_recitation(&mut self, live: &Schedule, now: NaiveDateTime) {
        let Some(settings) = &self.settings.recitation else {
            return;
        };
        let Some(start) = recitation_time(live, now, settings.offset) else {
            if live.get(PrayerName::Maghrib).is_some_and(|e| e.provided) {
                log_indented!("Too late for the recitation before Maghrib");
            }
            return;
        };

        let date = start.date();
        if self.last_recitation == Some(date) {
            log_indented!("Recitation for {date} already started");
            return;
        }

        self.engine
            .arm_at(start, Action::PlayRecitation(date), Recurrence::Daily);
        log_indented!("Armed recitation at {}", start.format("%H:%M"));

        // Download now so playback does not wait on the network
        if let (Some(source), Some(content)) = (
            &self.recitation_source,
            select_content(date, &settings.rotation),
        ) && let Err(e) = source.prepare(content)
        {
            log_warning!("Could not prefetch recitation {content}: {e}");
        }
    }

    /// Fire everything due at `now`. Returns the actions that ran.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<Action> {
        if self.stopped {
            return Vec::new();
        }

        if self.needs_resync(now) {
            log_block_start!(
                "Clock moved to {}, resynchronizing",
                now.format("%Y-%m-%d %H:%M")
            );
            self.rebuild(now);
        }

        let mut ran = Vec::new();
        let mut rebuilt = false;
        for action in self.engine.tick(now) {
            // A rebuild re-armed the day; the rest of this batch is stale
            if rebuilt && action.tag() != TriggerTag::DisplayPoll {
                continue;
            }
            self.dispatch(action, now);
            rebuilt |= action == Action::Refresh;
            ran.push(action);
        }

        self.schedule.prune(now);
        ran
    }

    fn dispatch(&mut self, action: Action, now: NaiveDateTime) {
        match action {
            Action::PlayPrayer(name) => self.play_prayer(name, now),
            Action::Refresh => {
                log_block_start!("Refreshing prayer times");
                self.rebuild(now);
            }
            Action::PlayRecitation(date) => self.play_recitation(date),
            Action::PollDisplay => self.refresh_display(now),
        }
    }

    fn play_prayer(&mut self, name: PrayerName, now: NaiveDateTime) {
        log_block_start!("{name} ({})", now.format("%H:%M"));

        if self.recitation_playing {
            self.recitation_playing = false;
            match self.audio.stop() {
                Ok(()) => log_decorated!("Recitation stopped for {name}"),
                Err(e) => log_error!("Failed to stop recitation: {e}"),
            }
        }

        match self.audio.play(AudioKind::Adhan, &self.settings.adhan_asset) {
            Ok(()) => log_decorated!("Playing Adhan"),
            Err(e) => log_error!("Failed to play Adhan for {name}: {e}"),
        }

        self.schedule.remove(name);
        self.current = Some(name);
        self.refresh_display(now);
    }

    fn play_recitation(&mut self, date: NaiveDate) {
        if self.last_recitation == Some(date) {
            log_decorated!("Recitation for {date} already started");
            return;
        }
        let Some(settings) = &self.settings.recitation else {
            return;
        };
        let Some(content) = select_content(date, &settings.rotation) else {
            return;
        };

        log_block_start!("Recitation before Maghrib (chapter {content})");
        let path = match &self.recitation_source {
            Some(source) => match source.prepare(content) {
                Ok(path) => Some(path),
                Err(e) => {
                    log_error!("Recitation {content} unavailable: {e}");
                    settings.fallback.clone()
                }
            },
            None => settings.fallback.clone(),
        };
        let Some(path) = path else {
            log_decorated!("No recitation to play");
            return;
        };

        match self.audio.play(AudioKind::Recitation, &path) {
            Ok(()) => {
                log_decorated!("Playing recitation");
                self.last_recitation = Some(date);
                self.recitation_playing = true;
            }
            Err(e) => log_error!("Failed to play recitation: {e}"),
        }
    }

    /// The two display lines for `now`.
    pub fn status_lines(&self, now: NaiveDateTime) -> (String, String) {
        let width = self.settings.display_width;
        let clock = now.format("%H:%M").to_string();
        let left = match self.current {
            Some(name) => name.to_string(),
            None => now.format("%Y-%m-%d").to_string(),
        };
        let line1 = spread(&left, &clock, width);

        let next = self
            .schedule
            .events()
            .iter()
            .find(|event| event.provided && event.time > now);
        let line2 = match next {
            Some(event) => spread(event.name.as_str(), &event.hour_minute(), width),
            None if self.degraded => DISPLAY_FETCHING_SOON.to_string(),
            None => DISPLAY_NO_PRAYERS_LEFT.to_string(),
        };
        (line1, line2)
    }

    fn refresh_display(&mut self, now: NaiveDateTime) {
        let (line1, line2) = self.status_lines(now);
        self.write_display(&line1, &line2);
    }

    fn write_display(&mut self, line1: &str, line2: &str) {
        if let Err(e) = self.display.write(line1, line2) {
            log_error!("Display update failed: {e}");
        }
    }

    /// True when the armed day no longer matches the clock: the refresh was
    /// due on an earlier date (suspend across midnight), or the clock is more
    /// than a day away from the live schedule (manual clock change).
    ///
    /// `tick` rebuilds before firing anything in that case, so a stale day's
    /// prayers are dropped instead of replayed.
    pub fn needs_resync(&self, now: NaiveDateTime) -> bool {
        let refresh_missed = self
            .engine
            .pending_with(TriggerTag::Refresh)
            .iter()
            .any(|trigger| trigger.due().date() < now.date());
        refresh_missed || (now.date() - self.schedule.date()).num_days().abs() > 1
    }

    /// Stop audio, disarm everything and show the sleep screen.
    ///
    /// Nothing fires after this returns.
    pub fn shutdown(&mut self) {
        self.stopped = true;
        for tag in [
            TriggerTag::Prayer,
            TriggerTag::Refresh,
            TriggerTag::Recitation,
            TriggerTag::DisplayPoll,
        ] {
            self.engine.clear(tag);
        }
        if let Err(e) = self.audio.stop() {
            log_error!("Failed to stop audio: {e}");
        }
        if let Err(e) = self.display.clear() {
            log_error!("Failed to clear display: {e}");
        }
        self.write_display(DISPLAY_TITLE, DISPLAY_ASLEEP);
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn engine(&self) -> &TriggerEngine {
        &self.engine
    }

    pub fn current(&self) -> Option<PrayerName> {
        self.current
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn last_recitation(&self) -> Option<NaiveDate> {
        self.last_recitation
    }
}
