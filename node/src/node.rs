use crate::config::NodeConfig;
use foxtail_card::CardFactoryDatabase;
use foxtail_chassis::{Chassis, ChassisCreateContext};
use foxtail_component::ComponentFactoryDatabase;
use foxtail_error::{Error, NodeError};
use foxtail_logger::{error, info};
use foxtail_point::{PointDatabase, PointFactoryDatabase, StatefulArena};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Node sizing knobs: the point-id space, the per-category stateful arena
/// budgets, and the chassis server tick resolution.
#[derive(Debug, Clone)]
pub struct NodeOptions {
    pub max_points: usize,
    pub card_stateful_bytes: usize,
    pub ha_stateful_bytes: usize,
    pub tick_duration: Duration,
}

impl Default for NodeOptions {
    fn default() -> Self {
        NodeOptions {
            max_points: 1024,
            card_stateful_bytes: 64 * 1024,
            ha_stateful_bytes: 64 * 1024,
            tick_duration: Duration::from_millis(1),
        }
    }
}

struct NodeState {
    error: Option<Error>,
    started: bool,
}

/// A fully built node. Dropping the node tears everything down: chassis
/// server threads join, and the arenas release their memory wholesale.
pub struct Node {
    name: String,
    type_guid: Option<String>,
    point_db: Arc<PointDatabase>,
    // Arenas are kept for their budgets/accounting; the slabs they handed
    // out are owned by the banks and points.
    card_arena: StatefulArena,
    ha_arena: StatefulArena,
    chassis: Vec<Chassis>,
    state: Mutex<NodeState>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("type_guid", &self.type_guid)
            .finish()
    }
}

impl Node {
    /// Build a node from a JSON descriptor string.
    pub fn create_from_json(descriptor: &str, options: NodeOptions) -> Result<Node, Error> {
        let value: Value = serde_json::from_str(descriptor)
            .map_err(|e| NodeError::MalformedDescriptor(e.to_string()))?;
        Self::create_from_value(&value, options)
    }

    /// Build a node from a parsed JSON descriptor. The top-level `node`
    /// wrapper object is accepted but not required.
    pub fn create_from_value(descriptor: &Value, options: NodeOptions) -> Result<Node, Error> {
        let node_value = descriptor.get("node").unwrap_or(descriptor);
        let config: NodeConfig = serde_json::from_value(node_value.clone())
            .map_err(|e| NodeError::MalformedDescriptor(e.to_string()))?;
        Self::create_from_config(&config, options)
    }

    pub fn create_from_config(config: &NodeConfig, options: NodeOptions) -> Result<Node, Error> {
        if config.chassis.is_empty() {
            return Err(NodeError::NoChassis.into());
        }

        let point_db = Arc::new(PointDatabase::new(options.max_points));
        let card_arena = StatefulArena::new(options.card_stateful_bytes);
        let ha_arena = StatefulArena::new(options.ha_stateful_bytes);

        let point_factory = PointFactoryDatabase::with_core_types();
        let card_factory = CardFactoryDatabase::with_mock_cards();
        let component_factory = ComponentFactoryDatabase::with_core_components();

        point_db.mark_node_create_start();

        let build = || -> Result<Vec<Chassis>, Error> {
            let mut chassis_list = Vec::with_capacity(config.chassis.len());
            for chassis_config in &config.chassis {
                let chassis = Chassis::create_from_config(
                    chassis_config,
                    &ChassisCreateContext {
                        card_factory: &card_factory,
                        component_factory: &component_factory,
                        point_factory: &point_factory,
                        point_db: &point_db,
                        card_arena: &card_arena,
                        ha_arena: &ha_arena,
                        tick_duration: options.tick_duration,
                    },
                )
                .map_err(|e| {
                    error!("chassis create failed: {}", e.tag());
                    NodeError::ChassisCreateError
                })?;
                chassis_list.push(chassis);
            }

            // Resolve only once every chassis (and thus every point) exists.
            for chassis in &mut chassis_list {
                chassis.resolve_references(&point_db).map_err(|e| {
                    error!("chassis resolve failed: {}", e.tag());
                    NodeError::ChassisCreateError
                })?;
            }
            Ok(chassis_list)
        };

        match build() {
            Ok(chassis) => {
                point_db.commit_node_create();
                info!(
                    "node '{}' built: {} chassis, {} points, {}B card / {}B HA stateful",
                    config.name.as_deref().unwrap_or(""),
                    chassis.len(),
                    point_db.point_ids().len(),
                    card_arena.allocated(),
                    ha_arena.allocated(),
                );
                Ok(Node {
                    name: config.name.clone().unwrap_or_default(),
                    type_guid: config.type_guid.clone(),
                    point_db,
                    card_arena,
                    ha_arena,
                    chassis,
                    state: Mutex::new(NodeState {
                        error: None,
                        started: false,
                    }),
                })
            }
            Err(e) => {
                point_db.cleanup_points_after_node_create_failure();
                Err(e)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_guid(&self) -> Option<&str> {
        self.type_guid.as_deref()
    }

    pub fn point_db(&self) -> &Arc<PointDatabase> {
        &self.point_db
    }

    pub fn chassis_count(&self) -> usize {
        self.chassis.len()
    }

    pub fn chassis(&self, index: usize) -> Option<&Chassis> {
        self.chassis.get(index)
    }

    /// Card-stateful arena bytes in use.
    pub fn card_stateful_allocated(&self) -> usize {
        self.card_arena.allocated()
    }

    /// HA-stateful arena bytes in use.
    pub fn ha_stateful_allocated(&self) -> usize {
        self.ha_arena.allocated()
    }

    pub fn error_code(&self) -> Option<Error> {
        self.state.lock().error.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    /// Start every chassis at elapsed time `now_usec`. Refuses when already
    /// started or when an error is latched.
    pub fn start(&self, now_usec: u64) -> bool {
        {
            let state = self.state.lock();
            if state.started || state.error.is_some() {
                return false;
            }
        }
        for chassis in &self.chassis {
            if !chassis.start(now_usec) {
                let mut state = self.state.lock();
                if state.error.is_none() {
                    state.error = Some(NodeError::ChassisFailedStart.into());
                }
                return false;
            }
        }
        self.state.lock().started = true;
        true
    }

    pub fn stop(&self) {
        let mut state = self.state.lock();
        if state.started {
            for chassis in &self.chassis {
                chassis.stop();
            }
            state.started = false;
        }
    }

    /// HA hook: force every chassis (shared points, execution sets, logic
    /// chains, components) back to its designated initial state without a
    /// stop/start cycle. An external HA collaborator calls this after a
    /// handover, typically paired with bank-level snapshot/restore.
    pub fn reset(&self, now_usec: u64) {
        for chassis in &self.chassis {
            chassis.reset(now_usec);
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.stop();
        self.point_db.clear_points();
    }
}
