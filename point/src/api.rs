use crate::basic::Basic;
use crate::value::PointValue;
use foxtail_error::{Error, PointError};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// Stable 32-bit point identifier, unique within a node's point database.
pub type PointId = u32;

/// Three-valued lock control applied atomically with a write.
///
/// While a point is locked, writes (including `set_invalid`) are silently
/// ignored unless the write carries `Unlock`. `Lock` stores the value first,
/// then sets the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockRequest {
    #[default]
    NoRequest,
    Lock,
    Unlock,
}

/// Object-safe point surface.
///
/// Typed value access goes through the concrete [`Basic`]/[`Array`] types or
/// the [`read_value`]/[`write_value`] helpers; everything the runtime's
/// generic plumbing needs (banks, setters, JSON I/O, status display) is
/// object safe.
///
/// [`Array`]: crate::Array
pub trait PointApi: Send + Sync + std::fmt::Debug {
    fn id(&self) -> PointId;

    /// Diagnostic label; never used for lookup.
    fn name(&self) -> &str;

    fn type_guid(&self) -> &'static str;

    fn type_name(&self) -> &'static str;

    /// Bytes of stateful memory (flags + value) the point occupies.
    fn stateful_size(&self) -> usize;

    fn is_not_valid(&self) -> bool;

    fn is_locked(&self) -> bool;

    /// Mark the value meaningless. Honors the lock like any write.
    fn set_invalid(&self, lock_request: LockRequest);

    fn has_setter(&self) -> bool;

    /// Copy the setter's value and validity into this point. A point with
    /// no setter succeeds as a no-op.
    fn update_from_setter(&self, lock_request: LockRequest);

    /// Render `{ "locked": …, "valid": …, "val": … }`; `val` is omitted when
    /// the point is invalid. Verbose adds `name` and `type`.
    fn to_json(&self, verbose: bool) -> Value;

    /// Apply a `{ "val": …?, "valid": …?, "locked": …? }` object.
    ///
    /// A `locked` field overrides `lock_request`. Absent `valid`/`locked`
    /// leave those flags unchanged; `valid: false` with no `val` marks the
    /// point invalid. A type mismatch on `val` leaves the point unchanged
    /// and reports descriptive error text.
    fn from_json(&self, value: &Value, lock_request: LockRequest) -> Result<(), Error>;

    fn as_any(&self) -> &dyn Any;
}

/// Typed read through the object-safe surface. `Ok(None)` means invalid.
pub fn read_value<T: PointValue>(point: &dyn PointApi) -> Result<Option<T>, Error> {
    let concrete = point
        .as_any()
        .downcast_ref::<Basic<T>>()
        .ok_or(PointError::TypeMismatch)?;
    Ok(concrete.read())
}

/// Typed write through the object-safe surface.
pub fn write_value<T: PointValue>(
    point: &dyn PointApi,
    value: T,
    lock_request: LockRequest,
) -> Result<(), Error> {
    let concrete = point
        .as_any()
        .downcast_ref::<Basic<T>>()
        .ok_or(PointError::TypeMismatch)?;
    concrete.write(value, lock_request);
    Ok(())
}

/// True iff every point carries the expected type GUID.
pub fn validate_point_types(points: &[Arc<dyn PointApi>], expected_guid: &str) -> bool {
    points.iter().all(|p| p.type_guid() == expected_guid)
}
