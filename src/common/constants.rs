//! Defaults, validation limits and fixed values shared across adhanr.

// # Application defaults

pub const DEFAULT_CITY: &str = "Montreal";
pub const DEFAULT_COUNTRY: &str = "Canada";
pub const DEFAULT_METHOD: u8 = 2; // ISNA
pub const DEFAULT_PROVIDER_URL: &str = "https://api.aladhan.com/v1";
pub const DEFAULT_FETCH_TIMEOUT: u64 = 10; // seconds
pub const DEFAULT_REFRESH_OFFSET: u64 = 3; // minutes after the last event
pub const DEFAULT_PLAYER: &str = "mpg123";
pub const DEFAULT_ADHAN_ASSET: &str = "/usr/share/adhanr/adhan.mp3";
pub const DEFAULT_DISPLAY_WIDTH: usize = 16;
pub const DEFAULT_POLL_INTERVAL: u64 = 5; // seconds
pub const DEFAULT_RECITATION: bool = false;
pub const DEFAULT_RECITATION_OFFSET: u64 = 15; // minutes before Maghrib
pub const DEFAULT_RECITER_ID: u32 = 7; // Mishari Rashid al-Afasy
pub const DEFAULT_RECITATION_API: &str = "https://api.quran.com/api/v4";
/// Chapters traditionally recited in the evening.
pub const DEFAULT_RECITATION_ROTATION: &[u32] = &[18, 32, 36, 55, 56, 67, 76, 78];

// # Validation limits

pub const MINIMUM_FETCH_TIMEOUT: u64 = 1;
pub const MAXIMUM_FETCH_TIMEOUT: u64 = 60;
pub const MINIMUM_OFFSET: u64 = 1;
pub const MAXIMUM_OFFSET: u64 = 120;
pub const MINIMUM_POLL_INTERVAL: u64 = 1;
pub const MAXIMUM_POLL_INTERVAL: u64 = 300;
pub const MINIMUM_DISPLAY_WIDTH: usize = 8;
pub const MAXIMUM_DISPLAY_WIDTH: usize = 40;

// # Runtime

/// Cadence of the polling loop.
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Time substituted for a prayer the provider did not return.
pub const SENTINEL_TIME: &str = "00:00";

pub const EXIT_FAILURE: i32 = 1;

// # Display text

pub const DISPLAY_TITLE: &str = "Adhan clock";
pub const DISPLAY_WAITING: &str = "Waiting...";
pub const DISPLAY_ASLEEP: &str = "Asleep";
pub const DISPLAY_FETCHING_SOON: &str = "Fetching soon";
pub const DISPLAY_NO_PRAYERS_LEFT: &str = "No prayers left";
