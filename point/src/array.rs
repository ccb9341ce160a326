use crate::api::{LockRequest, PointApi, PointId};
use crate::arena::Slot;
use crate::basic::{apply_lock, effective_lock_request, parse_valid_field, FLAG_BYTES};
use crate::factory::{PointCreateContext, PointFactoryEntry};
use crate::value::PointValue;
use foxtail_error::{Error, PointError};
use serde_json::{json, Value};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// Integer scalar types that also exist as fixed-length array points.
pub trait ArrayElement: PointValue {
    const ARRAY_GUID: &'static str;
    const ARRAY_TYPE_NAME: &'static str;
}

macro_rules! array_element {
    ($ty:ty, $guid:literal, $name:literal) => {
        impl ArrayElement for $ty {
            const ARRAY_GUID: &'static str = $guid;
            const ARRAY_TYPE_NAME: &'static str = $name;
        }
    };
}

array_element!(u8, "7c1de0f2-4a9b-4e36-8d25-b60a3f8c914e", "Foxtail::Point::Uint8Array");
array_element!(i32, "3b2a1c0d-9e87-4f65-a4b3-2c1d0e9f8a72", "Foxtail::Point::Int32Array");
array_element!(u32, "0d9e8c7b-6a54-43f2-b1e0-9c8d7a6b5f43", "Foxtail::Point::Uint32Array");
array_element!(u64, "f0e1d2c3-b4a5-4968-8776-a5c4d3e2b1fa", "Foxtail::Point::Uint64Array");

/// Fixed-length integer array point. The element count comes from the
/// descriptor's `typeCfg.numElems` and is immutable after creation.
pub struct Array<T: ArrayElement> {
    id: PointId,
    name: String,
    slot: Slot,
    setter: Option<Arc<dyn PointApi>>,
    num_elems: usize,
    _value: PhantomData<T>,
}

pub type Uint8Array = Array<u8>;
pub type Int32Array = Array<i32>;
pub type Uint32Array = Array<u32>;
pub type Uint64Array = Array<u64>;

impl<T: ArrayElement> Array<T> {
    pub fn stateful_bytes(num_elems: usize) -> usize {
        FLAG_BYTES + num_elems * T::SIZE
    }

    pub fn new(
        id: PointId,
        name: String,
        slot: Slot,
        setter: Option<Arc<dyn PointApi>>,
        num_elems: usize,
    ) -> Self {
        debug_assert_eq!(slot.len(), Self::stateful_bytes(num_elems));
        Array {
            id,
            name,
            slot,
            setter,
            num_elems,
            _value: PhantomData,
        }
    }

    pub fn create(ctx: &PointCreateContext) -> Result<Arc<dyn PointApi>, Error> {
        let num_elems = ctx
            .type_cfg
            .as_ref()
            .map(|cfg| cfg.num_elems)
            .ok_or(PointError::MissingTypeCfg)?;
        if let Some(setter) = &ctx.setter {
            let matches = setter
                .as_any()
                .downcast_ref::<Array<T>>()
                .map(|s| s.num_elems == num_elems)
                .unwrap_or(false);
            if !matches {
                return Err(PointError::SetterCreateError.into());
            }
        }
        let slot = ctx.alloc.slot(Self::stateful_bytes(num_elems))?;
        Ok(Arc::new(Array::<T>::new(
            ctx.id,
            ctx.name.clone(),
            slot,
            ctx.setter.clone(),
            num_elems,
        )))
    }

    pub fn factory_entry() -> PointFactoryEntry {
        PointFactoryEntry {
            guid: T::ARRAY_GUID,
            type_name: T::ARRAY_TYPE_NAME,
            stateful_size: |cfg| {
                let cfg = cfg.ok_or(PointError::MissingTypeCfg)?;
                Ok(Self::stateful_bytes(cfg.num_elems))
            },
            create: Self::create,
        }
    }

    pub fn num_elems(&self) -> usize {
        self.num_elems
    }

    pub fn read(&self) -> Option<Vec<T>> {
        self.slot.with(|bytes| {
            if bytes[0] == 0 {
                return None;
            }
            Some(
                (0..self.num_elems)
                    .map(|i| T::decode(&bytes[FLAG_BYTES + i * T::SIZE..]))
                    .collect(),
            )
        })
    }

    /// Write the whole array. The slice length must match `num_elems`.
    pub fn write(&self, values: &[T], lock_request: LockRequest) -> Result<(), Error> {
        if values.len() != self.num_elems {
            return Err(PointError::TypeMismatch.into());
        }
        self.store(Some(values), lock_request);
        Ok(())
    }

    fn store(&self, values: Option<&[T]>, lock_request: LockRequest) {
        self.slot.with(|bytes| {
            if bytes[1] != 0 && lock_request != LockRequest::Unlock {
                return;
            }
            match values {
                Some(vals) => {
                    bytes[0] = 1;
                    for (i, v) in vals.iter().enumerate() {
                        v.encode(&mut bytes[FLAG_BYTES + i * T::SIZE..]);
                    }
                }
                None => bytes[0] = 0,
            }
            apply_lock(bytes, lock_request);
        })
    }

    fn apply_lock_only(&self, lock_request: LockRequest) {
        self.slot.with(|bytes| {
            if bytes[1] != 0 && lock_request != LockRequest::Unlock {
                return;
            }
            apply_lock(bytes, lock_request);
        })
    }
}

impl<T: ArrayElement> PointApi for Array<T> {
    fn id(&self) -> PointId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn type_guid(&self) -> &'static str {
        T::ARRAY_GUID
    }

    fn type_name(&self) -> &'static str {
        T::ARRAY_TYPE_NAME
    }

    fn stateful_size(&self) -> usize {
        Self::stateful_bytes(self.num_elems)
    }

    fn is_not_valid(&self) -> bool {
        self.slot.with(|bytes| bytes[0] == 0)
    }

    fn is_locked(&self) -> bool {
        self.slot.with(|bytes| bytes[1] != 0)
    }

    fn set_invalid(&self, lock_request: LockRequest) {
        self.store(None, lock_request);
    }

    fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    fn update_from_setter(&self, lock_request: LockRequest) {
        if let Some(setter) = &self.setter {
            if let Some(setter) = setter.as_any().downcast_ref::<Array<T>>() {
                match setter.read() {
                    Some(vals) => self.store(Some(&vals), lock_request),
                    None => self.store(None, lock_request),
                }
            }
        }
    }

    fn to_json(&self, verbose: bool) -> Value {
        let (valid, locked) = self
            .slot
            .with(|bytes| (bytes[0] != 0, bytes[1] != 0));
        let mut obj = json!({ "locked": locked, "valid": valid });
        if let Some(vals) = self.read() {
            obj["val"] = json!(vals);
        }
        if verbose {
            obj["name"] = json!(self.name);
            obj["type"] = json!(T::ARRAY_TYPE_NAME);
        }
        obj
    }

    fn from_json(&self, value: &Value, lock_request: LockRequest) -> Result<(), Error> {
        let obj = value
            .as_object()
            .ok_or_else(|| PointError::InvalidJsonValue("expected an object".into()))?;
        let request = effective_lock_request(obj, lock_request)?;
        let valid = parse_valid_field(obj)?;

        let parsed = match obj.get("val") {
            Some(raw) => {
                let vals: Vec<T> = serde_json::from_value(raw.clone()).map_err(|e| {
                    PointError::InvalidJsonValue(format!(
                        "invalid syntax for the 'val' key/value pair ({}): {e}",
                        T::ARRAY_TYPE_NAME
                    ))
                })?;
                if vals.len() != self.num_elems {
                    return Err(PointError::InvalidJsonValue(format!(
                        "expected {} elements, got {}",
                        self.num_elems,
                        vals.len()
                    ))
                    .into());
                }
                Some(vals)
            }
            None => None,
        };

        if valid == Some(false) {
            self.store(None, request);
        } else {
            match parsed {
                Some(vals) => self.store(Some(&vals), request),
                None => self.apply_lock_only(request),
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
