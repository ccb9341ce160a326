//! The Foxtail point model.
//!
//! A Point is a named, typed value cell addressable by a stable 32-bit id.
//! Each point tracks a validity flag (invalid means "no meaningful value")
//! and a lock flag (an application-level write veto), and may carry a
//! *setter*: a companion point of the same type whose value seeds the owner
//! at start or on demand.
//!
//! Point state (`valid` + `locked` + value bytes) lives in contiguous,
//! mutex-guarded slabs handed out by a [`StatefulArena`]. A [`Bank`] groups
//! the points whose state shares one slab, so a whole bank can be block
//! copied — the mechanism behind input scans, output flushes, and HA
//! snapshot/restore.

mod api;
mod arena;
mod array;
mod bank;
mod basic;
mod database;
mod descriptor;
mod factory;
mod numeric;
mod value;

pub use api::{read_value, validate_point_types, write_value, LockRequest, PointApi, PointId};
pub use arena::{Slab, Slot, StatefulArena, StatefulAlloc};
pub use array::{Array, ArrayElement, Int32Array, Uint32Array, Uint64Array, Uint8Array};
pub use bank::Bank;
pub use basic::{
    Basic, Bool, Double, Float, Int16, Int32, Int64, Int8, Uint16, Uint32, Uint64, Uint8,
};
pub use database::PointDatabase;
pub use descriptor::{IdKey, InitialValue, PointDescriptor, TypeCfg};
pub use factory::{PointCreateContext, PointFactoryDatabase, PointFactoryEntry};
pub use numeric::{integer_attributes, IntegerAttributes};
pub use value::PointValue;
