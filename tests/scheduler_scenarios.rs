use adhanr::core::{RecitationSettings, Scheduler, SchedulerSettings};
use adhanr::io::audio::{AudioKind, AudioSink};
use adhanr::io::display::DisplaySink;
use adhanr::provider::{Location, TimingsProvider};
use adhanr::recitation::RecitationSource;
use adhanr::schedule::{PrayerName, RawTimings};
use adhanr::trigger::{Action, TriggerTag};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use PrayerName::*;

/// Everything the fakes observed, shared with the test body
#[derive(Default)]
struct Observed {
    fetches: Vec<NaiveDate>,
    played: Vec<(AudioKind, PathBuf)>,
    stops: usize,
    frames: Vec<(String, String)>,
    prepared: Vec<u32>,
}

type Shared = Rc<RefCell<Observed>>;

/// Serves fixed timings per date; unknown dates fail like a timeout
struct FakeProvider {
    days: HashMap<NaiveDate, RawTimings>,
    observed: Shared,
}

impl TimingsProvider for FakeProvider {
    fn fetch(&self, date: NaiveDate, _location: &Location) -> RawTimings {
        self.observed.borrow_mut().fetches.push(date);
        self.days.get(&date).cloned().unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FakeAudio {
    observed: Shared,
    fail: bool,
}

impl AudioSink for FakeAudio {
    fn play(&mut self, kind: AudioKind, path: &Path) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("player missing");
        }
        self.observed
            .borrow_mut()
            .played
            .push((kind, path.to_path_buf()));
        Ok(())
    }

    fn stop(&mut self) -> anyhow::Result<()> {
        self.observed.borrow_mut().stops += 1;
        Ok(())
    }
}

struct FakeDisplay(Shared);

impl DisplaySink for FakeDisplay {
    fn write(&mut self, line1: &str, line2: &str) -> anyhow::Result<()> {
        self.0
            .borrow_mut()
            .frames
            .push((line1.to_string(), line2.to_string()));
        Ok(())
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

struct FakeRecitations(Shared);

impl RecitationSource for FakeRecitations {
    fn prepare(&self, content_id: u32) -> anyhow::Result<PathBuf> {
        self.0.borrow_mut().prepared.push(content_id);
        Ok(PathBuf::from(format!("/cache/7/{content_id:03}.mp3")))
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn tomorrow() -> NaiveDate {
    day().succ_opt().unwrap()
}

fn at(h: u32, m: u32) -> NaiveDateTime {
    day().and_hms_opt(h, m, 0).unwrap()
}

fn reference_timings() -> RawTimings {
    [
        (Fajr, "05:00"),
        (Dhuhr, "12:30"),
        (Asr, "16:00"),
        (Maghrib, "19:45"),
        (Isha, "21:15"),
    ]
    .into_iter()
    .collect()
}

fn settings(recitation: bool) -> SchedulerSettings {
    SchedulerSettings {
        location: Location::Coordinates {
            latitude: 45.5017,
            longitude: -73.5673,
        },
        refresh_offset: Duration::minutes(3),
        adhan_asset: PathBuf::from("/srv/adhan.mp3"),
        display_width: 16,
        poll_interval: Duration::seconds(5),
        recitation: recitation.then(|| RecitationSettings {
            offset: Duration::minutes(15),
            rotation: vec![36],
            fallback: None,
        }),
    }
}

struct Harness {
    scheduler: Scheduler,
    observed: Shared,
}

impl Harness {
    fn new(days: &[NaiveDate], recitation: bool, failing_audio: bool) -> Self {
        let observed = Shared::default();
        let provider = FakeProvider {
            days: days.iter().map(|d| (*d, reference_timings())).collect(),
            observed: observed.clone(),
        };
        let mut scheduler = Scheduler::new(
            settings(recitation),
            Box::new(provider),
            Box::new(FakeAudio {
                observed: observed.clone(),
                fail: failing_audio,
            }),
            Box::new(FakeDisplay(observed.clone())),
        );
        if recitation {
            scheduler = scheduler.with_recitation_source(Box::new(FakeRecitations(observed.clone())));
        }
        Self {
            scheduler,
            observed,
        }
    }

    fn due_times(&self, tag: TriggerTag) -> Vec<NaiveDateTime> {
        self.scheduler
            .engine()
            .pending_with(tag)
            .iter()
            .map(|trigger| trigger.due())
            .collect()
    }

    /// Tick once a minute from `from` to `to` inclusive, keeping non-poll actions
    fn run(&mut self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<Action> {
        let mut fired = Vec::new();
        let mut now = from;
        while now <= to {
            fired.extend(
                self.scheduler
                    .tick(now)
                    .into_iter()
                    .filter(|action| *action != Action::PollDisplay),
            );
            now += Duration::minutes(1);
        }
        fired
    }
}

#[test]
fn test_morning_start_prunes_fajr_and_arms_refresh() {
    let mut harness = Harness::new(&[day()], false, false);
    harness.scheduler.start(at(6, 0));

    let names: Vec<PrayerName> = harness
        .scheduler
        .schedule()
        .events()
        .iter()
        .map(|event| event.name)
        .collect();
    assert_eq!(names, vec![Dhuhr, Asr, Maghrib, Isha]);
    assert_eq!(harness.due_times(TriggerTag::Refresh), vec![at(21, 18)]);
    assert_eq!(harness.observed.borrow().fetches, vec![day()]);
}

#[test]
fn test_start_after_isha_builds_tomorrow() {
    let mut harness = Harness::new(&[day(), tomorrow()], false, false);
    harness.scheduler.start(at(21, 30));

    let schedule = harness.scheduler.schedule();
    assert_eq!(schedule.date(), tomorrow());
    assert_eq!(schedule.len(), 5);
    assert!(schedule.events().iter().all(|event| event.time.date() == tomorrow()));
    assert_eq!(harness.observed.borrow().fetches, vec![day(), tomorrow()]);
    assert_eq!(
        harness.due_times(TriggerTag::Refresh),
        vec![tomorrow().and_hms_opt(21, 18, 0).unwrap()]
    );
}

#[test]
fn test_failed_fetch_shows_fetching_soon_and_retries() {
    let mut harness = Harness::new(&[], false, false);
    harness.scheduler.start(at(10, 0));

    assert!(harness.scheduler.schedule().is_empty());
    assert!(harness.due_times(TriggerTag::Prayer).is_empty());
    assert_eq!(harness.due_times(TriggerTag::Refresh), vec![at(10, 3)]);
    assert_eq!(
        harness.observed.borrow().frames.last().unwrap().1,
        "Fetching soon"
    );

    // The retry fires on time and fetches again
    let fired = harness.run(at(10, 1), at(10, 3));
    assert_eq!(fired, vec![Action::Refresh]);
    assert_eq!(harness.observed.borrow().fetches, vec![day(), day()]);
    assert_eq!(harness.due_times(TriggerTag::Refresh), vec![at(10, 6)]);
}

#[test]
fn test_consecutive_rebuilds_do_not_duplicate_triggers() {
    let mut harness = Harness::new(&[day()], true, false);
    harness.scheduler.start(at(6, 0));
    harness.scheduler.rebuild(at(6, 0));
    harness.scheduler.rebuild(at(6, 1));

    assert_eq!(
        harness.due_times(TriggerTag::Prayer),
        vec![at(12, 30), at(16, 0), at(19, 45), at(21, 15)]
    );
    assert_eq!(harness.due_times(TriggerTag::Recitation), vec![at(19, 30)]);
    assert_eq!(harness.due_times(TriggerTag::Refresh), vec![at(21, 18)]);

    // A full afternoon plays each prayer exactly once
    let fired = harness.run(at(6, 2), at(21, 17));
    let prayers: Vec<Action> = fired
        .into_iter()
        .filter(|action| action.tag() == TriggerTag::Prayer)
        .collect();
    assert_eq!(
        prayers,
        vec![
            Action::PlayPrayer(Dhuhr),
            Action::PlayPrayer(Asr),
            Action::PlayPrayer(Maghrib),
            Action::PlayPrayer(Isha),
        ]
    );
}

#[test]
fn test_recitation_starts_once_and_yields_to_maghrib() {
    let mut harness = Harness::new(&[day()], true, false);
    harness.scheduler.start(at(18, 0));
    harness.scheduler.rebuild(at(18, 5));

    harness.run(at(18, 6), at(19, 50));

    let observed = harness.observed.borrow();
    let recitations = observed
        .played
        .iter()
        .filter(|(kind, _)| *kind == AudioKind::Recitation)
        .count();
    assert_eq!(recitations, 1);
    assert_eq!(
        observed.played,
        vec![
            (AudioKind::Recitation, PathBuf::from("/cache/7/036.mp3")),
            (AudioKind::Adhan, PathBuf::from("/srv/adhan.mp3")),
        ]
    );
    assert_eq!(observed.stops, 1);
    assert_eq!(harness.scheduler.last_recitation(), Some(day()));
}

#[test]
fn test_recitation_not_armed_after_offset_passed() {
    let mut harness = Harness::new(&[day()], true, false);
    harness.scheduler.start(at(19, 40));

    assert!(harness.due_times(TriggerTag::Recitation).is_empty());
    assert_eq!(harness.due_times(TriggerTag::Prayer), vec![at(19, 45), at(21, 15)]);
    assert!(harness.observed.borrow().prepared.is_empty());
}

#[test]
fn test_failing_audio_does_not_stop_the_day() {
    let mut harness = Harness::new(&[day(), tomorrow()], false, true);
    harness.scheduler.start(at(11, 0));

    let fired = harness.run(at(11, 1), at(21, 20));
    assert_eq!(
        fired,
        vec![
            Action::PlayPrayer(Dhuhr),
            Action::PlayPrayer(Asr),
            Action::PlayPrayer(Maghrib),
            Action::PlayPrayer(Isha),
            Action::Refresh,
        ]
    );
    assert!(harness.observed.borrow().played.is_empty());
    assert_eq!(harness.scheduler.schedule().date(), tomorrow());
}

#[test]
fn test_suspend_across_midnight_skips_yesterday() {
    let mut harness = Harness::new(&[day(), tomorrow()], false, false);
    harness.scheduler.start(at(9, 0));

    // Asleep from 09:00 until 08:00 the next morning
    let morning = tomorrow().and_hms_opt(8, 0, 0).unwrap();
    assert!(harness.run(morning, morning).is_empty());
    assert!(harness.observed.borrow().played.is_empty());
    assert_eq!(harness.observed.borrow().fetches, vec![day(), tomorrow()]);
    assert_eq!(harness.scheduler.schedule().date(), tomorrow());

    // The new day then plays normally
    let fired = harness.run(
        morning + Duration::minutes(1),
        tomorrow().and_hms_opt(12, 30, 0).unwrap(),
    );
    assert_eq!(fired, vec![Action::PlayPrayer(Dhuhr)]);
}

#[test]
fn test_display_tracks_now_and_next() {
    let mut harness = Harness::new(&[day()], false, false);
    harness.scheduler.start(at(13, 0));

    assert_eq!(
        harness.scheduler.status_lines(at(13, 0)),
        ("Dhuhr      13:00".to_string(), "Asr        16:00".to_string())
    );

    harness.run(at(21, 15), at(21, 15));
    assert_eq!(
        harness.scheduler.status_lines(at(21, 16)),
        ("Isha       21:16".to_string(), "No prayers left".to_string())
    );
}

#[test]
fn test_nothing_fires_after_shutdown() {
    let mut harness = Harness::new(&[day()], true, false);
    harness.scheduler.start(at(6, 0));
    harness.scheduler.shutdown();

    assert!(harness.run(at(6, 1), at(23, 59)).is_empty());
    let observed = harness.observed.borrow();
    assert!(observed.played.is_empty());
    assert_eq!(
        observed.frames.last().unwrap(),
        &("Adhan clock".to_string(), "Asleep".to_string())
    );
}
