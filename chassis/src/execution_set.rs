use crate::config::ExecutionSetConfig;
use foxtail_component::ComponentFactoryDatabase;
use foxtail_error::{Error, ExecutionSetError};
use foxtail_logger::{error, warn};
use foxtail_logic_chain::{LogicChain, LogicChainCreateContext};
use foxtail_point::{PointDatabase, PointFactoryDatabase, StatefulArena};
use foxtail_scheduler::PeriodTarget;
use parking_lot::Mutex;
use std::sync::Arc;

struct ExecutionSetState {
    error: Option<Error>,
    started: bool,
}

/// A group of logic chains sharing one execution-rate multiplier; its
/// schedule entry has duration `ERM × FER`.
pub struct ExecutionSet {
    name: String,
    erm: u64,
    chains: Vec<LogicChain>,
    state: Mutex<ExecutionSetState>,
}

/// Everything an execution-set build needs besides its own descriptor.
pub(crate) struct ExecutionSetCreateContext<'a> {
    pub component_factory: &'a ComponentFactoryDatabase,
    pub point_factory: &'a PointFactoryDatabase,
    pub point_db: &'a PointDatabase,
    pub ha_arena: &'a StatefulArena,
}

impl ExecutionSet {
    pub(crate) fn create_from_config(
        config: &ExecutionSetConfig,
        ctx: &ExecutionSetCreateContext,
    ) -> Result<ExecutionSet, Error> {
        let erm = config.exe_rate_multiplier.ok_or(ExecutionSetError::MissingErm)?;
        if erm < 1 {
            return Err(ExecutionSetError::InvalidErm.into());
        }
        if config.logic_chains.is_empty() {
            return Err(ExecutionSetError::NoLogicChains.into());
        }

        let mut chains = Vec::with_capacity(config.logic_chains.len());
        for chain_config in &config.logic_chains {
            let chain = LogicChain::create_from_config(
                chain_config,
                &LogicChainCreateContext {
                    component_factory: ctx.component_factory,
                    point_factory: ctx.point_factory,
                    point_db: ctx.point_db,
                    ha_arena: ctx.ha_arena,
                },
            )
            .map_err(|e| {
                error!("logic chain create failed: {}", e.tag());
                ExecutionSetError::LogicChainCreateError
            })?;
            chains.push(chain);
        }

        Ok(ExecutionSet {
            name: config.name.clone().unwrap_or_default(),
            erm,
            chains,
            state: Mutex::new(ExecutionSetState {
                error: None,
                started: false,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn execution_rate_multiplier(&self) -> u64 {
        self.erm
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn chain(&self, index: usize) -> Option<&LogicChain> {
        self.chains.get(index)
    }

    pub fn error_code(&self) -> Option<Error> {
        self.state.lock().error.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    fn latch(&self, error: Error) -> Error {
        let mut state = self.state.lock();
        if state.error.is_none() {
            state.error = Some(error.clone());
        }
        error
    }

    pub fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<(), Error> {
        let failed = self
            .chains
            .iter_mut()
            .any(|chain| chain.resolve_references(point_db).is_err());
        if failed {
            return Err(self.latch(ExecutionSetError::FailedPointResolve.into()));
        }
        Ok(())
    }

    pub fn start(&self, now_usec: u64) -> Result<(), Error> {
        {
            let state = self.state.lock();
            if state.started {
                return Ok(());
            }
            if let Some(error) = &state.error {
                return Err(error.clone());
            }
        }
        for chain in &self.chains {
            if chain.start(now_usec).is_err() {
                return Err(self.latch(ExecutionSetError::LogicChainFailedStart.into()));
            }
        }
        self.state.lock().started = true;
        Ok(())
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        if state.started {
            for chain in &self.chains {
                chain.stop();
            }
            state.started = false;
        }
    }

    /// HA hook: reset every chain to its designated initial state.
    pub fn reset(&self, now_usec: u64) {
        for chain in &self.chains {
            chain.reset(now_usec);
        }
    }

    /// Run every chain in insertion order. The first chain error aborts the
    /// walk and latches on the set.
    pub fn execute(&self, now_usec: u64) -> Result<(), Error> {
        {
            let state = self.state.lock();
            if let Some(error) = &state.error {
                return Err(error.clone());
            }
            if !state.started {
                return Ok(());
            }
        }
        for chain in &self.chains {
            if chain.execute(now_usec).is_err() {
                return Err(self.latch(ExecutionSetError::LogicChainFailure.into()));
            }
        }
        Ok(())
    }
}

/// Execution-period schedule entry.
///
/// A latched execution-set error does not stop the chassis scheduler: the
/// failed set goes quiet behind its latch while unaffected scanners and
/// sets keep running.
pub(crate) struct ExecutionPeriod {
    pub execution_set: Arc<ExecutionSet>,
    pub label: String,
    pub halt_reported: std::sync::atomic::AtomicBool,
}

impl PeriodTarget for ExecutionPeriod {
    fn execute(&self, current_tick: u64, _current_interval: u64) -> bool {
        if let Err(e) = self.execution_set.execute(current_tick) {
            if !self.halt_reported.swap(true, std::sync::atomic::Ordering::Relaxed) {
                warn!("execution set '{}' halted: {}", self.label, e.tag());
            }
        }
        true
    }

    fn label(&self) -> &str {
        &self.label
    }
}
