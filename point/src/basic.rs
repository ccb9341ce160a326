use crate::api::{LockRequest, PointApi, PointId};
use crate::arena::Slot;
use crate::factory::{PointCreateContext, PointFactoryEntry};
use crate::value::PointValue;
use foxtail_error::{Error, PointError};
use serde_json::{json, Value};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// Flag bytes ahead of the value in every stateful block: valid, locked.
pub(crate) const FLAG_BYTES: usize = 2;

const VALID: usize = 0;
const LOCKED: usize = 1;

/// Concrete scalar point. The stateful block layout is
/// `[valid][locked][value, little-endian]`.
pub struct Basic<T: PointValue> {
    id: PointId,
    name: String,
    slot: Slot,
    setter: Option<Arc<dyn PointApi>>,
    _value: PhantomData<T>,
}

pub type Bool = Basic<bool>;
pub type Int8 = Basic<i8>;
pub type Int16 = Basic<i16>;
pub type Int32 = Basic<i32>;
pub type Int64 = Basic<i64>;
pub type Uint8 = Basic<u8>;
pub type Uint16 = Basic<u16>;
pub type Uint32 = Basic<u32>;
pub type Uint64 = Basic<u64>;
pub type Float = Basic<f32>;
pub type Double = Basic<f64>;

impl<T: PointValue> Basic<T> {
    /// Stateful bytes occupied by this point type.
    pub const STATEFUL_BYTES: usize = FLAG_BYTES + T::SIZE;

    /// Bind a point to its stateful slot. Freshly allocated slots are
    /// zeroed, so new points start invalid and unlocked.
    pub fn new(id: PointId, name: String, slot: Slot, setter: Option<Arc<dyn PointApi>>) -> Self {
        debug_assert_eq!(slot.len(), Self::STATEFUL_BYTES);
        Basic {
            id,
            name,
            slot,
            setter,
            _value: PhantomData,
        }
    }

    /// Factory hook consumed by the point factory database.
    pub fn create(ctx: &PointCreateContext) -> Result<Arc<dyn PointApi>, Error> {
        if let Some(setter) = &ctx.setter {
            if setter.type_guid() != T::GUID {
                return Err(PointError::SetterCreateError.into());
            }
        }
        let slot = ctx.alloc.slot(Self::STATEFUL_BYTES)?;
        Ok(Arc::new(Basic::<T>::new(
            ctx.id,
            ctx.name.clone(),
            slot,
            ctx.setter.clone(),
        )))
    }

    pub fn factory_entry() -> PointFactoryEntry {
        PointFactoryEntry {
            guid: T::GUID,
            type_name: T::TYPE_NAME,
            stateful_size: |_| Ok(Self::STATEFUL_BYTES),
            create: Self::create,
        }
    }

    /// Current value; `None` when the point is invalid.
    pub fn read(&self) -> Option<T> {
        self.slot.with(|bytes| {
            if bytes[VALID] != 0 {
                Some(T::decode(&bytes[FLAG_BYTES..]))
            } else {
                None
            }
        })
    }

    pub fn write(&self, value: T, lock_request: LockRequest) {
        self.store(Some(value), lock_request);
    }

    fn store(&self, value: Option<T>, lock_request: LockRequest) {
        self.slot.with(|bytes| {
            if bytes[LOCKED] != 0 && lock_request != LockRequest::Unlock {
                return;
            }
            match value {
                Some(v) => {
                    bytes[VALID] = 1;
                    v.encode(&mut bytes[FLAG_BYTES..]);
                }
                None => bytes[VALID] = 0,
            }
            apply_lock(bytes, lock_request);
        })
    }

    fn apply_lock_only(&self, lock_request: LockRequest) {
        self.slot.with(|bytes| {
            if bytes[LOCKED] != 0 && lock_request != LockRequest::Unlock {
                return;
            }
            apply_lock(bytes, lock_request);
        })
    }

    fn snapshot(&self) -> (bool, bool, Option<T>) {
        self.slot.with(|bytes| {
            let valid = bytes[VALID] != 0;
            let value = valid.then(|| T::decode(&bytes[FLAG_BYTES..]));
            (valid, bytes[LOCKED] != 0, value)
        })
    }
}

pub(crate) fn apply_lock(bytes: &mut [u8], lock_request: LockRequest) {
    match lock_request {
        LockRequest::Lock => bytes[LOCKED] = 1,
        LockRequest::Unlock => bytes[LOCKED] = 0,
        LockRequest::NoRequest => {}
    }
}

/// Parse the optional `locked` field into an effective lock request.
pub(crate) fn effective_lock_request(
    obj: &serde_json::Map<String, Value>,
    fallback: LockRequest,
) -> Result<LockRequest, Error> {
    match obj.get("locked") {
        None => Ok(fallback),
        Some(Value::Bool(true)) => Ok(LockRequest::Lock),
        Some(Value::Bool(false)) => Ok(LockRequest::Unlock),
        Some(_) => Err(PointError::InvalidJsonValue("'locked' must be a boolean".into()).into()),
    }
}

pub(crate) fn parse_valid_field(
    obj: &serde_json::Map<String, Value>,
) -> Result<Option<bool>, Error> {
    match obj.get("valid") {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(PointError::InvalidJsonValue("'valid' must be a boolean".into()).into()),
    }
}

impl<T: PointValue> std::fmt::Debug for Basic<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Basic").field("name", &self.name).finish()
    }
}

impl<T: PointValue> PointApi for Basic<T> {
    fn id(&self) -> PointId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn type_guid(&self) -> &'static str {
        T::GUID
    }

    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn stateful_size(&self) -> usize {
        Self::STATEFUL_BYTES
    }

    fn is_not_valid(&self) -> bool {
        self.read().is_none()
    }

    fn is_locked(&self) -> bool {
        self.slot.with(|bytes| bytes[LOCKED] != 0)
    }

    fn set_invalid(&self, lock_request: LockRequest) {
        self.store(None, lock_request);
    }

    fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    fn update_from_setter(&self, lock_request: LockRequest) {
        if let Some(setter) = &self.setter {
            // Same concrete type, enforced at creation.
            if let Some(setter) = setter.as_any().downcast_ref::<Basic<T>>() {
                self.store(setter.read(), lock_request);
            }
        }
    }

    fn to_json(&self, verbose: bool) -> Value {
        let (valid, locked, value) = self.snapshot();
        let mut obj = json!({ "locked": locked, "valid": valid });
        if let Some(v) = value {
            obj["val"] = json!(v);
        }
        if verbose {
            obj["name"] = json!(self.name);
            obj["type"] = json!(T::TYPE_NAME);
        }
        obj
    }

    fn from_json(&self, value: &Value, lock_request: LockRequest) -> Result<(), Error> {
        let obj = value
            .as_object()
            .ok_or_else(|| PointError::InvalidJsonValue("expected an object".into()))?;
        let request = effective_lock_request(obj, lock_request)?;
        let valid = parse_valid_field(obj)?;

        // Parse fully before mutating so a bad 'val' leaves the point as-is.
        let parsed = match obj.get("val") {
            Some(raw) => Some(serde_json::from_value::<T>(raw.clone()).map_err(|e| {
                PointError::InvalidJsonValue(format!(
                    "invalid syntax for the 'val' key/value pair ({}): {e}",
                    T::TYPE_NAME
                ))
            })?),
            None => None,
        };

        if valid == Some(false) {
            self.store(None, request);
        } else {
            match parsed {
                Some(v) => self.store(Some(v), request),
                None => self.apply_lock_only(request),
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{StatefulAlloc, StatefulArena};

    fn make_point<T: PointValue>(arena: &StatefulArena, id: PointId) -> Arc<Basic<T>> {
        let slot = StatefulAlloc::Arena(arena)
            .slot(Basic::<T>::STATEFUL_BYTES)
            .unwrap();
        Arc::new(Basic::<T>::new(id, format!("pt{id}"), slot, None))
    }

    #[test]
    fn new_points_are_invalid_and_unlocked() {
        let arena = StatefulArena::new(64);
        let pt = make_point::<u32>(&arena, 1);
        assert!(pt.is_not_valid());
        assert!(!pt.is_locked());
        assert_eq!(pt.read(), None);
    }

    #[test]
    fn write_read_round_trip() {
        let arena = StatefulArena::new(64);
        let pt = make_point::<i64>(&arena, 1);

        pt.write(-123_456_789, LockRequest::NoRequest);
        assert_eq!(pt.read(), Some(-123_456_789));
        assert!(!pt.is_not_valid());

        pt.set_invalid(LockRequest::NoRequest);
        assert_eq!(pt.read(), None);
        assert!(pt.is_not_valid());
    }

    #[test]
    fn locked_points_reject_writes_until_unlocked() {
        let arena = StatefulArena::new(64);
        let pt = make_point::<u8>(&arena, 1);

        pt.write(42, LockRequest::Lock);
        assert!(pt.is_locked());
        assert_eq!(pt.read(), Some(42));

        // Rejected: no state change, including the invalid flag.
        pt.write(99, LockRequest::NoRequest);
        assert_eq!(pt.read(), Some(42));
        pt.set_invalid(LockRequest::NoRequest);
        assert_eq!(pt.read(), Some(42));
        pt.write(77, LockRequest::Lock);
        assert_eq!(pt.read(), Some(42));

        // Unlock intent stores the value and clears the lock.
        pt.write(7, LockRequest::Unlock);
        assert_eq!(pt.read(), Some(7));
        assert!(!pt.is_locked());
    }

    #[test]
    fn json_round_trip_preserves_value_validity_and_lock() {
        let arena = StatefulArena::new(256);

        let a = make_point::<f32>(&arena, 1);
        a.write(2.5, LockRequest::NoRequest);
        let b = make_point::<f32>(&arena, 2);
        b.from_json(&a.to_json(false), LockRequest::NoRequest).unwrap();
        assert_eq!(b.read(), Some(2.5));
        assert!(!b.is_locked());

        let locked = make_point::<bool>(&arena, 3);
        locked.write(true, LockRequest::Lock);
        let copy = make_point::<bool>(&arena, 4);
        copy.from_json(&locked.to_json(false), LockRequest::NoRequest)
            .unwrap();
        assert_eq!(copy.read(), Some(true));
        assert!(copy.is_locked());

        let invalid = make_point::<u16>(&arena, 5);
        let copy = make_point::<u16>(&arena, 6);
        copy.write(9, LockRequest::NoRequest);
        copy.from_json(&invalid.to_json(false), LockRequest::NoRequest)
            .unwrap();
        assert!(copy.is_not_valid());
    }

    #[test]
    fn bad_val_reports_and_leaves_point_unchanged() {
        let arena = StatefulArena::new(64);
        let pt = make_point::<u8>(&arena, 1);
        pt.write(5, LockRequest::NoRequest);

        let err = pt
            .from_json(&json!({ "val": "not-a-number" }), LockRequest::NoRequest)
            .unwrap_err();
        assert_eq!(err.code_name(), "INVALID_JSON_VALUE");
        assert_eq!(pt.read(), Some(5));
    }

    #[test]
    fn absent_val_with_valid_false_marks_invalid() {
        let arena = StatefulArena::new(64);
        let pt = make_point::<u32>(&arena, 1);
        pt.write(10, LockRequest::NoRequest);

        pt.from_json(&json!({ "valid": false }), LockRequest::NoRequest)
            .unwrap();
        assert!(pt.is_not_valid());
    }

    #[test]
    fn update_from_setter_copies_value_and_validity() {
        let arena = StatefulArena::new(64);
        let setter = make_point::<u8>(&arena, 100);
        setter.write(128, LockRequest::NoRequest);

        let slot = StatefulAlloc::Arena(&arena)
            .slot(Basic::<u8>::STATEFUL_BYTES)
            .unwrap();
        let pt = Basic::<u8>::new(1, "owner".into(), slot, Some(setter.clone()));

        pt.update_from_setter(LockRequest::NoRequest);
        assert_eq!(pt.read(), Some(128));

        setter.set_invalid(LockRequest::NoRequest);
        pt.update_from_setter(LockRequest::NoRequest);
        assert!(pt.is_not_valid());
    }

    #[test]
    fn update_without_setter_is_a_no_op() {
        let arena = StatefulArena::new(64);
        let pt = make_point::<u8>(&arena, 1);
        pt.write(3, LockRequest::NoRequest);
        pt.update_from_setter(LockRequest::NoRequest);
        assert_eq!(pt.read(), Some(3));
        assert!(!pt.has_setter());
    }
}
