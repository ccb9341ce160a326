//! Logic-block components.
//!
//! A component references a fixed set of input and output points by id;
//! `resolve_references` swaps the ids for point handles in a single pass
//! once the whole node's points exist. Execution honors one invariant
//! everywhere: every configured output point is either written or
//! explicitly invalidated every cycle — an invalid input is data flow, not
//! an error.

mod api;
mod common;
pub mod controller;
pub mod digital;
mod factory;
pub mod math;

pub use api::{ComponentApi, ComponentConfig, RefConfig};
pub use common::{read_as_f64, ComponentState, PointRef};
pub use factory::{ComponentCreateContext, ComponentFactoryDatabase, ComponentFactoryEntry};
