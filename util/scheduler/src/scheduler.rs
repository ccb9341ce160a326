use crate::period::Period;
use foxtail_logger::warn;

/// Callback invoked after a period misses an interval boundary.
///
/// Arguments: the slipped period, the current tick, and the boundary that
/// was missed. Returning `false` stops the scheduler.
pub type SlippageReport = Box<dyn FnMut(&Period, u64, u64) -> bool + Send>;

/// Polled multi-period dispatcher.
///
/// `execute_scheduler` walks the (already ordered) period array: array order
/// is dispatch order whenever several boundaries coincide in one pass.
///
/// When a period falls behind by a full duration after executing, the
/// slippage callback fires once and the period is re-anchored to the most
/// recent boundary in real time. Re-anchoring instead of catch-up prevents
/// a burst of back-to-back executions after a long stall, and the caller
/// gets exactly one missed-boundary notification per slip event.
pub struct PeriodicScheduler {
    periods: Vec<Period>,
    report_slippage: Option<SlippageReport>,
    first_execution: bool,
    running: bool,
}

impl PeriodicScheduler {
    pub fn new(report_slippage: Option<SlippageReport>) -> Self {
        PeriodicScheduler {
            periods: Vec::new(),
            report_slippage,
            first_execution: true,
            running: false,
        }
    }

    /// Logs slipped periods and keeps running.
    pub fn with_logging_slippage() -> Self {
        Self::new(Some(Box::new(|period, tick, missed| {
            warn!(
                "period '{}' slipped: tick={}us missed_interval={}us duration={}us",
                period.label(),
                tick,
                missed,
                period.duration
            );
            true
        })))
    }

    /// Arm the scheduler with an ordered period array. May be called again
    /// after `stop`; each start re-initializes every period's time marker on
    /// the next `execute_scheduler` pass.
    pub fn start(&mut self, periods: Vec<Period>) {
        self.periods = periods;
        self.first_execution = true;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.periods.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run one scheduling pass at `current_tick` (microseconds).
    ///
    /// Zero or more periods execute, in array order. A `false` return from
    /// a target or from the slippage callback stops the scheduler.
    pub fn execute_scheduler(&mut self, current_tick: u64) {
        if !self.running {
            return;
        }

        for idx in 0..self.periods.len() {
            if self.first_execution {
                self.periods[idx].time_marker = current_tick;
            }

            let duration = self.periods[idx].duration;
            if current_tick.saturating_sub(self.periods[idx].time_marker) < duration {
                continue;
            }

            self.periods[idx].time_marker += duration;
            let marker = self.periods[idx].time_marker;
            let target = self.periods[idx].target.clone();
            if !target.execute(current_tick, marker) {
                self.stop();
                return;
            }

            // Still behind by a full duration: the boundary was missed.
            if current_tick.saturating_sub(marker) >= duration {
                if let Some(report) = self.report_slippage.as_mut() {
                    if !report(&self.periods[idx], current_tick, marker) {
                        self.stop();
                        return;
                    }
                }

                // Re-anchor to the most recent past boundary in real time.
                // Only has an effect when the slip exceeds two durations.
                Self::set_time_marker(&mut self.periods[idx], current_tick);
            }
        }

        self.first_execution = false;
    }

    /// Round down to the nearest period boundary. A side effect is that the
    /// first execution after a re-anchor arrives in less than one duration.
    fn set_time_marker(period: &mut Period, current_tick: u64) {
        if period.duration == 0 {
            period.time_marker = current_tick;
            return;
        }
        period.time_marker = (current_tick / period.duration) * period.duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodTarget;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: &'static str,
        calls: Mutex<Vec<(u64, u64)>>,
        ok: AtomicBool,
    }

    impl Recorder {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Recorder {
                name,
                calls: Mutex::new(Vec::new()),
                ok: AtomicBool::new(true),
            })
        }

        fn intervals(&self) -> Vec<u64> {
            self.calls.lock().unwrap().iter().map(|c| c.1).collect()
        }

        fn count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl PeriodTarget for Recorder {
        fn execute(&self, current_tick: u64, current_interval: u64) -> bool {
            self.calls
                .lock()
                .unwrap()
                .push((current_tick, current_interval));
            self.ok.load(Ordering::SeqCst)
        }

        fn label(&self) -> &str {
            self.name
        }
    }

    #[test]
    fn intervals_are_monotonic_without_slip() {
        let rec = Recorder::new("p10");
        let mut sched = PeriodicScheduler::new(None);
        sched.start(vec![Period::new(10, rec.clone())]);

        // Ticks strictly less than one duration apart.
        for tick in (0u64..=60).step_by(4) {
            sched.execute_scheduler(tick);
        }

        let intervals = rec.intervals();
        assert!(!intervals.is_empty());
        for pair in intervals.windows(2) {
            assert_eq!(pair[1], pair[0] + 10);
        }
    }

    #[test]
    fn slip_reports_once_and_reanchors() {
        let rec = Recorder::new("p10");
        let slips: Arc<Mutex<Vec<(u64, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let slips_cb = slips.clone();
        let mut sched = PeriodicScheduler::new(Some(Box::new(move |_, tick, missed| {
            slips_cb.lock().unwrap().push((tick, missed));
            true
        })));
        sched.start(vec![Period::new(10, rec.clone())]);

        sched.execute_scheduler(0); // markers anchored at t0 = 0
        sched.execute_scheduler(35); // k = 3 durations + 5 behind

        // One execution for the missed boundary, one slippage report.
        assert_eq!(rec.intervals(), vec![10]);
        assert_eq!(slips.lock().unwrap().as_slice(), &[(35, 10)]);

        // Re-anchored to floor(35 / 10) * 10 = 30: next boundary is 40.
        sched.execute_scheduler(39);
        assert_eq!(rec.count(), 1);
        sched.execute_scheduler(42);
        assert_eq!(rec.intervals(), vec![10, 40]);
        assert_eq!(slips.lock().unwrap().len(), 1);
    }

    #[test]
    fn failing_target_stops_the_scheduler() {
        let rec = Recorder::new("bad");
        rec.ok.store(false, Ordering::SeqCst);
        let mut sched = PeriodicScheduler::new(None);
        sched.start(vec![Period::new(10, rec.clone())]);

        sched.execute_scheduler(0);
        sched.execute_scheduler(10);
        assert_eq!(rec.count(), 1);
        assert!(!sched.is_running());

        // Stopped: further ticks do nothing.
        sched.execute_scheduler(20);
        assert_eq!(rec.count(), 1);
    }

    #[test]
    fn failing_slippage_report_stops_the_scheduler() {
        let rec = Recorder::new("p10");
        let mut sched = PeriodicScheduler::new(Some(Box::new(|_, _, _| false)));
        sched.start(vec![Period::new(10, rec.clone())]);

        sched.execute_scheduler(0);
        sched.execute_scheduler(35);
        assert!(!sched.is_running());
    }

    #[test]
    fn execution_counts_across_mixed_periods() {
        let p10 = Recorder::new("10ms");
        let p20 = Recorder::new("20ms");
        let p7 = Recorder::new("7ms");
        let mut sched = PeriodicScheduler::new(None);
        sched.start(vec![
            Period::new(10_000, p10.clone()),
            Period::new(20_000, p20.clone()),
            Period::new(7_000, p7.clone()),
        ]);

        // Schedule armed at t = 0, then ticks at 5, 10, 15, 20, 21 ms.
        for tick_ms in [0, 5, 10, 15, 20, 21] {
            sched.execute_scheduler(tick_ms * 1_000);
        }

        assert_eq!(p10.count(), 2);
        assert_eq!(p20.count(), 1);
        assert_eq!(p7.count(), 3);
    }

    #[test]
    fn coinciding_boundaries_dispatch_in_array_order() {
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        struct Tagger {
            tag: &'static str,
            order: Arc<Mutex<Vec<&'static str>>>,
        }
        impl PeriodTarget for Tagger {
            fn execute(&self, _: u64, _: u64) -> bool {
                self.order.lock().unwrap().push(self.tag);
                true
            }
            fn label(&self) -> &str {
                self.tag
            }
        }

        let mut sched = PeriodicScheduler::new(None);
        sched.start(vec![
            Period::new(
                2,
                Arc::new(Tagger {
                    tag: "fast",
                    order: order.clone(),
                }),
            ),
            Period::new(
                4,
                Arc::new(Tagger {
                    tag: "slow",
                    order: order.clone(),
                }),
            ),
        ]);

        sched.execute_scheduler(0);
        sched.execute_scheduler(4);
        assert_eq!(order.lock().unwrap().as_slice(), &["fast", "slow"]);
    }
}
