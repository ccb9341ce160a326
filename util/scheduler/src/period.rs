use std::sync::Arc;

/// Work dispatched when a period's interval boundary elapses.
pub trait PeriodTarget: Send + Sync {
    /// Called when the period expires for an interval.
    ///
    /// `current_tick` is the system time at dispatch; `current_interval` is
    /// the deterministic interval boundary being logically executed. For a
    /// 10 Hz target dispatched when the system time is 10.212 s:
    /// `current_tick = 10_212_000`, `current_interval = 10_200_000`.
    ///
    /// Returning `false` signals a fatal error and stops the scheduler.
    fn execute(&self, current_tick: u64, current_interval: u64) -> bool;

    /// Diagnostic label used in slippage reports.
    fn label(&self) -> &str;
}

/// A schedulable unit: a duration plus its dispatch target.
pub struct Period {
    /// Period duration in microseconds.
    pub duration: u64,
    /// Time, in microseconds, of the period's last interval boundary.
    pub(crate) time_marker: u64,
    pub(crate) target: Arc<dyn PeriodTarget>,
}

impl Period {
    pub fn new(duration: u64, target: Arc<dyn PeriodTarget>) -> Self {
        Period {
            duration,
            time_marker: 0,
            target,
        }
    }

    /// The period's last interval boundary.
    pub fn time_marker(&self) -> u64 {
        self.time_marker
    }

    pub fn label(&self) -> &str {
        self.target.label()
    }
}
