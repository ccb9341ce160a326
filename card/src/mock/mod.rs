//! Mocked/emulated IO cards.
//!
//! These are the test vehicles for the scan/flush machinery: they have no
//! hardware behind them, but expose thread-safe accessors so tests and the
//! operator console can play the role of the driver.

mod digital;
mod digital8;

pub use digital::Digital;
pub use digital8::Digital8;
