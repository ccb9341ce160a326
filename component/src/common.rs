use crate::api::RefConfig;
use foxtail_error::{ComponentError, Error};
use foxtail_point::{read_value, PointApi, PointDatabase, PointId};
use parking_lot::Mutex;
use std::sync::Arc;

/// A point reference: the raw id from the descriptor until the resolve
/// pass, a live handle afterwards.
pub enum PointRef {
    Unresolved(PointId),
    Resolved(Arc<dyn PointApi>),
}

impl PointRef {
    pub fn point(&self) -> Option<&Arc<dyn PointApi>> {
        match self {
            PointRef::Resolved(point) => Some(point),
            PointRef::Unresolved(_) => None,
        }
    }
}

/// Parse a reference list into unresolved [`PointRef`]s, enforcing the
/// component's reference-count window.
pub fn parse_point_references(
    refs: &[RefConfig],
    min: usize,
    max: usize,
    count_error: ComponentError,
    bad_error: ComponentError,
) -> Result<Vec<PointRef>, Error> {
    if refs.len() < min || refs.len() > max {
        return Err(count_error.into());
    }
    refs.iter()
        .map(|r| {
            r.id_ref
                .map(PointRef::Unresolved)
                .ok_or_else(|| bad_error.into())
        })
        .collect()
}

/// Flip every reference from id to handle, in place.
pub fn resolve_point_references(
    refs: &mut [PointRef],
    point_db: &PointDatabase,
    unresolved_error: ComponentError,
) -> Result<(), Error> {
    for reference in refs.iter_mut() {
        if let PointRef::Unresolved(id) = reference {
            let point = point_db
                .lookup_by_id(*id)
                .ok_or(unresolved_error)?;
            *reference = PointRef::Resolved(point);
        }
    }
    Ok(())
}

/// Flip a single reference from id to handle.
pub fn resolve_point_reference(
    reference: &mut PointRef,
    point_db: &PointDatabase,
    unresolved_error: ComponentError,
) -> Result<(), Error> {
    if let PointRef::Unresolved(id) = reference {
        let point = point_db.lookup_by_id(*id).ok_or(unresolved_error)?;
        *reference = PointRef::Resolved(point);
    }
    Ok(())
}

/// True for any scalar numeric point type (integer or float).
pub fn is_numeric_guid(guid: &str) -> bool {
    use foxtail_point::PointValue;
    foxtail_point::integer_attributes(guid).is_some()
        || guid == <f32 as PointValue>::GUID
        || guid == <f64 as PointValue>::GUID
}

/// Check every resolved reference against an expected type GUID.
pub fn validate_reference_types(
    refs: &[PointRef],
    expected_guid: &str,
    bad_type_error: ComponentError,
) -> Result<(), Error> {
    for reference in refs {
        let point = reference.point().ok_or(bad_type_error)?;
        if point.type_guid() != expected_guid {
            return Err(bad_type_error.into());
        }
    }
    Ok(())
}

/// Read any numeric point as f64. `Ok(None)` means the point is invalid;
/// `Err` means the point is not numeric.
pub fn read_as_f64(point: &dyn PointApi) -> Result<Option<f64>, Error> {
    if let Ok(v) = read_value::<f64>(point) {
        return Ok(v);
    }
    if let Ok(v) = read_value::<f32>(point) {
        return Ok(v.map(f64::from));
    }
    macro_rules! try_int {
        ($ty:ty) => {
            if let Ok(v) = read_value::<$ty>(point) {
                return Ok(v.map(|x| x as f64));
            }
        };
    }
    try_int!(i8);
    try_int!(i16);
    try_int!(i32);
    try_int!(i64);
    try_int!(u8);
    try_int!(u16);
    try_int!(u32);
    try_int!(u64);
    Err(ComponentError::InvalidInputType.into())
}

/// Latched error + started flag shared by every concrete component.
pub struct ComponentState {
    name: String,
    error: Mutex<Option<Error>>,
    started: Mutex<bool>,
}

impl ComponentState {
    pub fn new(name: String) -> Self {
        ComponentState {
            name,
            error: Mutex::new(None),
            started: Mutex::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn error_code(&self) -> Option<Error> {
        self.error.lock().clone()
    }

    /// Latch the first error; later errors are dropped.
    pub fn latch_error(&self, error: Error) -> Error {
        let mut latched = self.error.lock();
        if latched.is_none() {
            *latched = Some(error.clone());
        }
        error
    }

    pub fn is_started(&self) -> bool {
        *self.started.lock()
    }

    /// Transition to started iff no error is latched.
    pub fn start(&self) -> Result<(), Error> {
        if let Some(error) = self.error_code() {
            return Err(error);
        }
        *self.started.lock() = true;
        Ok(())
    }

    pub fn stop(&self) {
        *self.started.lock() = false;
    }

    /// Gate for execute: started and error-free.
    pub fn check_runnable(&self) -> Result<(), Error> {
        if let Some(error) = self.error_code() {
            return Err(error);
        }
        if !self.is_started() {
            return Err(self.latch_error(ComponentError::NotStarted.into()));
        }
        Ok(())
    }
}
