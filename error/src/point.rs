use strum::IntoStaticStr;
use thiserror::Error;

/// Local error codes for the Point subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PointError {
    /// Point id is at or beyond the database's configured maximum.
    #[error("point id is out of range for the point database")]
    IdOutOfRange,

    /// A point with the same id is already registered.
    #[error("duplicate point id")]
    DuplicateId,

    /// Descriptor has no usable id under the expected key.
    #[error("point descriptor is missing its id")]
    MissingId,

    /// No factory is registered for the descriptor's type GUID.
    #[error("unknown point type GUID")]
    UnknownTypeGuid,

    /// The stateful arena cannot satisfy the allocation.
    #[error("out of stateful arena memory")]
    OutOfStatefulMemory,

    /// `val` did not parse as the point's value type. Carries detail text.
    #[error("invalid JSON value: {0}")]
    InvalidJsonValue(String),

    /// Array descriptor lacks `typeCfg.numElems`.
    #[error("array point descriptor is missing typeCfg.numElems")]
    MissingTypeCfg,

    /// Typed access to a point whose concrete type is something else.
    #[error("point is not of the requested type")]
    TypeMismatch,

    /// The `initial` block could not be applied to the setter point.
    #[error("malformed initial value for setter point")]
    MalformedInitialValue,

    /// Setter creation failed (bad id, duplicate, arena exhaustion).
    #[error("failed to create the setter point")]
    SetterCreateError,
}
