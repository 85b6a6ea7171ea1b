// External I/O operations module
pub mod audio; // Adhan and recitation playback
pub mod display; // Two-line character display
pub mod lock; // Single-instance lock file
pub mod signals; // Unix signal handling
