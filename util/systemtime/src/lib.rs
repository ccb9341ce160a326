//! Monotonic elapsed-time source.
//!
//! All scheduling in Foxtail is expressed in microseconds since process
//! start. The clock is monotonic (`std::time::Instant`), never wall time:
//! period boundaries must not jump when the host clock is adjusted.
//!
//! The `enable_faketime` feature adds a process-wide override so tests can
//! drive the clock deterministically.

use once_cell::sync::Lazy;
use std::time::Instant;

static START: Lazy<Instant> = Lazy::new(Instant::now);

#[cfg(feature = "enable_faketime")]
mod faketime {
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Mutex, MutexGuard};

    static FAKETIME_ENABLED: AtomicBool = AtomicBool::new(false);
    static FAKETIME_USEC: AtomicU64 = AtomicU64::new(0);
    // Serializes tests that manipulate the fake clock.
    static FAKETIME_LOCK: Mutex<()> = Mutex::new(());

    /// RAII guard over the fake clock; the override is cleared on drop.
    pub struct FaketimeGuard {
        #[allow(dead_code)]
        guard: MutexGuard<'static, ()>,
    }

    impl FaketimeGuard {
        pub fn set_faketime(&self, usec: u64) {
            FAKETIME_USEC.store(usec, Ordering::SeqCst);
            FAKETIME_ENABLED.store(true, Ordering::SeqCst);
        }

        pub fn disable_faketime(&self) {
            FAKETIME_ENABLED.store(false, Ordering::SeqCst);
        }
    }

    impl Drop for FaketimeGuard {
        fn drop(&mut self) {
            FAKETIME_ENABLED.store(false, Ordering::SeqCst);
        }
    }

    /// Acquire the fake clock. Held by at most one test at a time.
    pub fn faketime() -> FaketimeGuard {
        let guard = FAKETIME_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        FaketimeGuard { guard }
    }

    pub(crate) fn override_usec() -> Option<u64> {
        if FAKETIME_ENABLED.load(Ordering::SeqCst) {
            Some(FAKETIME_USEC.load(Ordering::SeqCst))
        } else {
            None
        }
    }
}

#[cfg(feature = "enable_faketime")]
pub use faketime::{faketime, FaketimeGuard};

/// Microseconds elapsed since process start (monotonic).
pub fn elapsed_usec() -> u64 {
    #[cfg(feature = "enable_faketime")]
    if let Some(usec) = faketime::override_usec() {
        return usec;
    }
    START.elapsed().as_micros() as u64
}

/// Real monotonic microseconds, ignoring any faketime override.
pub fn system_elapsed_usec() -> u64 {
    START.elapsed().as_micros() as u64
}
