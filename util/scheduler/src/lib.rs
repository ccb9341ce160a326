//! Polled, cooperative, monotonic periodic scheduling.
//!
//! Monotonic here means that a period scheduled at 200 Hz executes on every
//! 5 ms boundary of the system time, not merely 5 ms after its previous
//! execution. The scheduler makes a best attempt: because scheduling is
//! polled and cooperative, timing cannot be guaranteed, but the scheduler
//! detects and reports when a period's timing slips.

mod period;
mod scheduler;

pub use period::{Period, PeriodTarget};
pub use scheduler::{PeriodicScheduler, SlippageReport};
