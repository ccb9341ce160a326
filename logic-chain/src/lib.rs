//! Logic chains: ordered component sequences plus their local points.
//!
//! Connector points carry intermediate values between components inside a
//! chain and must not have an initial value. Auto points are the opposite:
//! an initial value is mandatory, and it is re-asserted from the setter at
//! the top of every execution cycle.

use foxtail_component::{
    ComponentApi, ComponentConfig, ComponentCreateContext, ComponentFactoryDatabase,
};
use foxtail_error::{Error, LogicChainError};
use foxtail_logger::error;
use foxtail_point::{
    IdKey, LockRequest, PointApi, PointDatabase, PointDescriptor, PointFactoryDatabase,
    StatefulAlloc, StatefulArena,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;

/// JSON logic-chain descriptor. Component order is execution order.
#[derive(Debug, Clone, Deserialize)]
pub struct LogicChainConfig {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub components: Vec<ComponentConfig>,
    #[serde(rename = "connectionPts", default)]
    pub connection_pts: Vec<PointDescriptor>,
    #[serde(rename = "autoPts", default)]
    pub auto_pts: Vec<PointDescriptor>,
}

/// Everything a chain build needs besides its own descriptor.
pub struct LogicChainCreateContext<'a> {
    pub component_factory: &'a ComponentFactoryDatabase,
    pub point_factory: &'a PointFactoryDatabase,
    pub point_db: &'a PointDatabase,
    pub ha_arena: &'a StatefulArena,
}

struct ChainState {
    error: Option<Error>,
    started: bool,
}

pub struct LogicChain {
    name: String,
    components: Vec<Box<dyn ComponentApi>>,
    connection_pts: Vec<Arc<dyn PointApi>>,
    auto_pts: Vec<Arc<dyn PointApi>>,
    state: Mutex<ChainState>,
}

impl std::fmt::Debug for LogicChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicChain")
            .field("name", &self.name)
            .finish()
    }
}

impl LogicChain {
    pub fn create_from_config(
        config: &LogicChainConfig,
        ctx: &LogicChainCreateContext,
    ) -> Result<LogicChain, Error> {
        if config.components.is_empty() {
            return Err(LogicChainError::NoComponents.into());
        }

        let mut connection_pts = Vec::with_capacity(config.connection_pts.len());
        for descriptor in &config.connection_pts {
            if descriptor.initial.is_some() {
                return Err(LogicChainError::ConnectorPointHasInitialValue.into());
            }
            let point = ctx
                .point_factory
                .create_point_from_descriptor(
                    descriptor,
                    IdKey::Id,
                    false,
                    StatefulAlloc::Arena(ctx.ha_arena),
                    ctx.ha_arena,
                    ctx.point_db,
                )
                .map_err(|e| {
                    error!("connector point create failed: {}", e.tag());
                    LogicChainError::PointCreateError
                })?;
            connection_pts.push(point);
        }

        let mut auto_pts = Vec::with_capacity(config.auto_pts.len());
        for descriptor in &config.auto_pts {
            if descriptor.initial.is_none() {
                return Err(LogicChainError::NoInitialValueAutoPoint.into());
            }
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
                    error!("auto point create failed: {}", e.tag());
                    LogicChainError::AutoPointCreateError
                })?;
            auto_pts.push(point);
        }

        let mut components = Vec::with_capacity(config.components.len());
        for component_config in &config.components {
            let component = ctx
                .component_factory
                .create_component_from_config(
                    component_config,
                    &ComponentCreateContext {
                        point_factory: ctx.point_factory,
                        point_db: ctx.point_db,
                        ha_arena: ctx.ha_arena,
                    },
                )
                .map_err(|e| {
                    error!("component create failed: {}", e.tag());
                    LogicChainError::ComponentCreateError
                })?;
            components.push(component);
        }

        Ok(LogicChain {
            name: config.name.clone().unwrap_or_default(),
            components,
            connection_pts,
            auto_pts,
            state: Mutex::new(ChainState {
                error: None,
                started: false,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[Box<dyn ComponentApi>] {
        &self.components
    }

    pub fn connection_points(&self) -> &[Arc<dyn PointApi>] {
        &self.connection_pts
    }

    pub fn auto_points(&self) -> &[Arc<dyn PointApi>] {
        &self.auto_pts
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
            .components
            .iter_mut()
            .any(|component| component.resolve_references(point_db).is_err());
        if failed {
            // The precise cause is latched on the failing component.
            return Err(self.latch(LogicChainError::FailedPointResolve.into()));
        }
        Ok(())
    }

    pub fn start(&self, now_usec: u64) -> Result<(), Error> {
        let mut state = self.state.lock();
        if state.started {
            return Ok(());
        }
        if let Some(error) = &state.error {
            return Err(error.clone());
        }
        for component in &self.components {
            if component.start(now_usec).is_err() {
                let rolled: Error = LogicChainError::FailedStart.into();
                state.error = Some(rolled.clone());
                return Err(rolled);
            }
        }
        state.started = true;
        Ok(())
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        if state.started {
            for component in &self.components {
                component.stop();
            }
            state.started = false;
        }
    }

    /// HA hook: re-assert every auto point from its setter and force every
    /// component back to its designated initial state, without a stop/start
    /// cycle.
    pub fn reset(&self, now_usec: u64) {
        for auto in &self.auto_pts {
            auto.update_from_setter(LockRequest::NoRequest);
        }
        for component in &self.components {
            component.reset(now_usec);
        }
    }

    /// Re-assert every auto point from its setter, then run the components
    /// in insertion order. The first component error aborts the cycle and
    /// latches on the chain.
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

        for auto in &self.auto_pts {
            auto.update_from_setter(LockRequest::NoRequest);
        }

        for component in &self.components {
            if let Err(e) = component.execute(now_usec) {
                error!("component '{}' failed: {}", component.name(), e.tag());
                return Err(self.latch(LogicChainError::ComponentFailure.into()));
            }
        }
        Ok(())
    }
}
