use crate::config::ChassisConfig;
use crate::execution_set::{ExecutionPeriod, ExecutionSet, ExecutionSetCreateContext};
use crate::scanner::{Scanner, ScannerInputPeriod, ScannerOutputPeriod};
use crate::server::ChassisServer;
use foxtail_card::{CardApi, CardCreateContext, CardFactoryDatabase};
use foxtail_component::ComponentFactoryDatabase;
use foxtail_error::{ChassisError, Error};
use foxtail_logger::error;
use foxtail_point::{
    IdKey, LockRequest, PointApi, PointDatabase, PointFactoryDatabase, StatefulAlloc,
    StatefulArena,
};
use foxtail_scheduler::Period;
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

/// Everything a chassis build needs besides its own descriptor.
pub struct ChassisCreateContext<'a> {
    pub card_factory: &'a CardFactoryDatabase,
    pub component_factory: &'a ComponentFactoryDatabase,
    pub point_factory: &'a PointFactoryDatabase,
    pub point_db: &'a PointDatabase,
    pub card_arena: &'a StatefulArena,
    pub ha_arena: &'a StatefulArena,
    /// Server timing-tick resolution.
    pub tick_duration: Duration,
}

struct ChassisState {
    error: Option<Error>,
    started: bool,
}

/// Owner of one FER-rate scheduling domain.
pub struct Chassis {
    name: String,
    id: u16,
    fer: u64,
    scanners: Vec<Arc<Scanner>>,
    execution_sets: Vec<Arc<ExecutionSet>>,
    shared_pts: Vec<Arc<dyn PointApi>>,
    server: ChassisServer,
    state: Mutex<ChassisState>,
}

impl std::fmt::Debug for Chassis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chassis")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("fer", &self.fer)
            .finish()
    }
}

impl Chassis {
    pub fn create_from_config(
        config: &ChassisConfig,
        ctx: &ChassisCreateContext,
    ) -> Result<Chassis, Error> {
        let fer = config.fer.ok_or(ChassisError::MissingFer)?;
        if fer < 1 {
            return Err(ChassisError::InvalidFer.into());
        }
        if config.scanners.is_empty() {
            return Err(ChassisError::ParseScannerArray.into());
        }
        if config.execution_sets.is_empty() {
            return Err(ChassisError::ParseExecutionSetArray.into());
        }

        let mut scanners = Vec::with_capacity(config.scanners.len());
        for scanner_config in &config.scanners {
            let scanner = Scanner::create_from_config(
                scanner_config,
                ctx.card_factory,
                &CardCreateContext {
                    point_factory: ctx.point_factory,
                    point_db: ctx.point_db,
                    card_arena: ctx.card_arena,
                    ha_arena: ctx.ha_arena,
                },
            )
            .map_err(|e| {
                error!("scanner create failed: {}", e.tag());
                ChassisError::ScannerCreateError
            })?;
            scanners.push(Arc::new(scanner));
        }

        let mut execution_sets = Vec::with_capacity(config.execution_sets.len());
        for set_config in &config.execution_sets {
            let set = ExecutionSet::create_from_config(
                set_config,
                &ExecutionSetCreateContext {
                    component_factory: ctx.component_factory,
                    point_factory: ctx.point_factory,
                    point_db: ctx.point_db,
                    ha_arena: ctx.ha_arena,
                },
            )
            .map_err(|e| {
                error!("execution set create failed: {}", e.tag());
                ChassisError::ExecutionSetCreateError
            })?;
            execution_sets.push(Arc::new(set));
        }

        // Shared points live on the HA arena.
        let mut shared_pts = Vec::with_capacity(config.shared_pts.len());
        for descriptor in &config.shared_pts {
            let point = ctx
                .point_factory
                .create_point_from_descriptor(
                    descriptor,
                    IdKey::Id,
                    true,
                    StatefulAlloc::Arena(ctx.ha_arena),
                    ctx.ha_arena,
                    ctx.point_db,
                )
                .map_err(|e| {
                    error!("shared point create failed: {}", e.tag());
                    ChassisError::FailedCreateSharedPoints
                })?;
            shared_pts.push(point);
        }

        let name = config.name.clone().unwrap_or_default();
        let server = ChassisServer::spawn(&name, ctx.tick_duration);

        Ok(Chassis {
            name,
            id: config.id.unwrap_or(0),
            fer,
            scanners,
            execution_sets,
            shared_pts,
            server,
            state: Mutex::new(ChassisState {
                error: None,
                started: false,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn fer(&self) -> u64 {
        self.fer
    }

    pub fn scanner_count(&self) -> usize {
        self.scanners.len()
    }

    pub fn scanner(&self, index: usize) -> Option<&Arc<Scanner>> {
        self.scanners.get(index)
    }

    pub fn execution_set_count(&self) -> usize {
        self.execution_sets.len()
    }

    pub fn execution_set(&self, index: usize) -> Option<&Arc<ExecutionSet>> {
        self.execution_sets.get(index)
    }

    pub fn shared_points(&self) -> &[Arc<dyn PointApi>] {
        &self.shared_pts
    }

    /// Find a card anywhere in the chassis by its hardware slot number.
    pub fn find_card_by_slot(&self, slot: u16) -> Option<Arc<dyn CardApi>> {
        for scanner in &self.scanners {
            for index in 0..scanner.card_count() {
                if let Some(card) = scanner.card(index) {
                    if card.slot_number() == slot {
                        return Some(card.clone());
                    }
                }
            }
        }
        None
    }

    pub fn error_code(&self) -> Option<Error> {
        self.state.lock().error.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    fn latch(&self, error: ChassisError) -> bool {
        let mut state = self.state.lock();
        if state.error.is_none() {
            state.error = Some(error.into());
        }
        false
    }

    /// Resolve every execution set's point references. Must run after the
    /// whole node's points exist and before the chassis is shared with its
    /// server.
    pub fn resolve_references(&mut self, point_db: &PointDatabase) -> Result<(), Error> {
        let failed = self.execution_sets.iter_mut().any(|set| {
            // Pre-share, each Arc is still uniquely owned.
            match Arc::get_mut(set) {
                Some(set) => set.resolve_references(point_db).is_err(),
                None => true,
            }
        });
        if failed {
            let rolled: Error = ChassisError::FailedPointResolve.into();
            self.latch(ChassisError::FailedPointResolve);
            return Err(rolled);
        }
        Ok(())
    }

    /// Materialize the three period arrays: input and output periods from
    /// the scanners and execution periods from the sets, each class sorted
    /// ascending by multiplier and stamped with `multiplier × FER`.
    ///
    /// The concatenated array (inputs, then executions, then outputs) is
    /// the scheduler's dispatch order for coinciding boundaries.
    pub fn build_schedule(&self) -> Vec<Period> {
        let mut scanners_by_srm: Vec<&Arc<Scanner>> = self.scanners.iter().collect();
        scanners_by_srm.sort_by_key(|s| s.scan_rate_multiplier());
        let mut sets_by_erm: Vec<&Arc<ExecutionSet>> = self.execution_sets.iter().collect();
        sets_by_erm.sort_by_key(|s| s.execution_rate_multiplier());

        let mut periods =
            Vec::with_capacity(scanners_by_srm.len() * 2 + sets_by_erm.len());
        for scanner in &scanners_by_srm {
            periods.push(Period::new(
                scanner.scan_rate_multiplier() * self.fer,
                Arc::new(ScannerInputPeriod {
                    scanner: Arc::clone(scanner),
                    label: format!("{}.inputs", scanner.name()),
                }),
            ));
        }
        for set in &sets_by_erm {
            periods.push(Period::new(
                set.execution_rate_multiplier() * self.fer,
                Arc::new(ExecutionPeriod {
                    execution_set: Arc::clone(set),
                    label: set.name().to_string(),
                    halt_reported: AtomicBool::new(false),
                }),
            ));
        }
        for scanner in &scanners_by_srm {
            periods.push(Period::new(
                scanner.scan_rate_multiplier() * self.fer,
                Arc::new(ScannerOutputPeriod {
                    scanner: Arc::clone(scanner),
                    label: format!("{}.outputs", scanner.name()),
                }),
            ));
        }
        periods
    }

    /// Start every scanner and execution set, seed the shared points from
    /// their setters, and open the server with the period schedule.
    pub fn start(&self, now_usec: u64) -> bool {
        {
            let state = self.state.lock();
            if state.started || state.error.is_some() {
                return false;
            }
        }

        for scanner in &self.scanners {
            if !scanner.start(now_usec) {
                return self.latch(ChassisError::ScannerFailedStart);
            }
        }
        for set in &self.execution_sets {
            if set.start(now_usec).is_err() {
                return self.latch(ChassisError::ExecutionSetFailedStart);
            }
        }
        for point in &self.shared_pts {
            point.update_from_setter(LockRequest::NoRequest);
        }

        if !self.server.open(self.build_schedule()) {
            return self.latch(ChassisError::FailedScannerScheduleBuild);
        }
        self.state.lock().started = true;
        true
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        if state.started {
            self.server.close();
            for scanner in &self.scanners {
                scanner.stop();
            }
            for set in &self.execution_sets {
                set.stop();
            }
            state.started = false;
        }
    }

    /// HA hook: re-seed the shared points and reset every execution set to
    /// its designated initial state, without a stop/start cycle.
    pub fn reset(&self, now_usec: u64) {
        for point in &self.shared_pts {
            point.update_from_setter(LockRequest::NoRequest);
        }
        for set in &self.execution_sets {
            set.reset(now_usec);
        }
    }
}
