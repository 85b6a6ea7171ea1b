//! Time handling: the swappable clock used by the polling loop.

pub mod source;
