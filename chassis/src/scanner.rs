use crate::config::ScannerConfig;
use foxtail_card::{CardApi, CardCreateContext, CardFactoryDatabase};
use foxtail_error::{Error, ScannerError};
use foxtail_logger::error;
use foxtail_scheduler::PeriodTarget;
use parking_lot::Mutex;
use std::sync::Arc;

struct ScannerState {
    error: Option<Error>,
    started: bool,
}

/// A group of cards sharing one scan-rate multiplier. Produces two schedule
/// entries per chassis: an input period that scans every card and an output
/// period that flushes every card, both of duration `SRM × FER`.
pub struct Scanner {
    name: String,
    srm: u64,
    cards: Vec<Arc<dyn CardApi>>,
    state: Mutex<ScannerState>,
}

impl Scanner {
    pub fn create_from_config(
        config: &ScannerConfig,
        card_factory: &CardFactoryDatabase,
        ctx: &CardCreateContext,
    ) -> Result<Scanner, Error> {
        let srm = config.scan_rate_multiplier.ok_or(ScannerError::MissingSrm)?;
        if srm < 1 {
            return Err(ScannerError::InvalidSrm.into());
        }
        if config.cards.is_empty() {
            return Err(ScannerError::NoCards.into());
        }

        let mut cards = Vec::with_capacity(config.cards.len());
        for card_config in &config.cards {
            let card = card_factory
                .create_card_from_config(card_config, ctx)
                .map_err(|e| {
                    error!("card create failed: {}", e.tag());
                    ScannerError::CardCreateError
                })?;
            cards.push(card);
        }

        Ok(Scanner {
            name: config.name.clone().unwrap_or_default(),
            srm,
            cards,
            state: Mutex::new(ScannerState {
                error: None,
                started: false,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scan_rate_multiplier(&self) -> u64 {
        self.srm
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn card(&self, index: usize) -> Option<&Arc<dyn CardApi>> {
        self.cards.get(index)
    }

    pub fn error_code(&self) -> Option<Error> {
        self.state.lock().error.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    fn latch(&self, error: ScannerError) -> bool {
        let mut state = self.state.lock();
        if state.error.is_none() {
            state.error = Some(error.into());
        }
        false
    }

    pub fn start(&self, now_usec: u64) -> bool {
        {
            let state = self.state.lock();
            if state.started {
                return true;
            }
            if state.error.is_some() {
                return false;
            }
        }
        for card in &self.cards {
            if !card.start(now_usec) {
                return self.latch(ScannerError::CardFailedStart);
            }
        }
        self.state.lock().started = true;
        true
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        if state.started {
            for card in &self.cards {
                card.stop();
            }
            state.started = false;
        }
    }

    /// Scan every card in insertion order. A card failure aborts the walk,
    /// latches the scanner error, and returns false.
    pub fn scan_inputs(&self, now_usec: u64) -> bool {
        {
            let state = self.state.lock();
            if state.error.is_some() || !state.started {
                return true;
            }
        }
        for card in &self.cards {
            if !card.scan_inputs(now_usec) {
                return self.latch(ScannerError::CardScanFailure);
            }
        }
        true
    }

    /// Flush every card in insertion order; same failure semantics as
    /// `scan_inputs`.
    pub fn flush_outputs(&self, now_usec: u64) -> bool {
        {
            let state = self.state.lock();
            if state.error.is_some() || !state.started {
                return true;
            }
        }
        for card in &self.cards {
            if !card.flush_outputs(now_usec) {
                return self.latch(ScannerError::CardFlushFailure);
            }
        }
        true
    }
}

/// Input-period schedule entry for a scanner.
pub(crate) struct ScannerInputPeriod {
    pub scanner: Arc<Scanner>,
    pub label: String,
}

impl PeriodTarget for ScannerInputPeriod {
    fn execute(&self, current_tick: u64, _current_interval: u64) -> bool {
        self.scanner.scan_inputs(current_tick)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Output-period schedule entry for a scanner.
pub(crate) struct ScannerOutputPeriod {
    pub scanner: Arc<Scanner>,
    pub label: String,
}

impl PeriodTarget for ScannerOutputPeriod {
    fn execute(&self, current_tick: u64, _current_interval: u64) -> bool {
        self.scanner.flush_outputs(current_tick)
    }

    fn label(&self) -> &str {
        &self.label
    }
}
