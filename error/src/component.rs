use strum::IntoStaticStr;
use thiserror::Error;

/// Local error codes for logic Components.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentError {
    /// No component factory is registered for the descriptor's type GUID.
    #[error("unknown component type GUID")]
    UnknownTypeGuid,

    #[error("component descriptor is missing a required field")]
    MissingRequiredField,

    #[error("wrong number of input references")]
    IncorrectNumInputRefs,

    #[error("wrong number of output references")]
    IncorrectNumOutputRefs,

    #[error("too many input references")]
    TooManyInputRefs,

    #[error("too many output references")]
    TooManyOutputRefs,

    /// An input reference entry is malformed (missing `idRef`).
    #[error("bad input reference")]
    BadInputReference,

    #[error("bad output reference")]
    BadOutputReference,

    /// Input id did not resolve against the point database.
    #[error("unresolved input reference")]
    UnresolvedInputReference,

    #[error("unresolved output reference")]
    UnresolvedOutputReference,

    /// Resolved input point has the wrong type GUID.
    #[error("input reference has the wrong point type")]
    InputReferenceBadType,

    #[error("output reference has the wrong point type")]
    OutputReferenceBadType,

    /// Inputs and outputs must pair up for this component.
    #[error("input and output reference counts do not match")]
    MismatchedInputsOutputs,

    /// Demux/Mux input type is not a supported integer point type.
    #[error("input type is not a supported integer point type")]
    InvalidInputType,

    /// Bit offset references a bit beyond the integer type's width.
    #[error("bit offset exceeds the input type's width")]
    InvalidBitOffset,

    /// More bit-mapped outputs than the input type has bits.
    #[error("output bit count exceeds the input type's width")]
    OutputBitsExceedInput,

    /// A required `var` role (e.g. PV, SP) is missing or duplicated.
    #[error("missing or duplicate input variable role")]
    BadInputVariable,

    /// Failed to create the component's internal stateful points.
    #[error("failed to create internal stateful points")]
    InternalPointCreateError,

    /// Component was executed before a successful resolve/start.
    #[error("component executed while not started")]
    NotStarted,
}
