use strum::IntoStaticStr;
use thiserror::Error;

/// Local error codes for the Node.
#[derive(Error, Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeError {
    /// The descriptor is not valid JSON or not an object. Carries detail.
    #[error("malformed node descriptor: {0}")]
    MalformedDescriptor(String),

    /// Descriptor has no `chassis` array.
    #[error("descriptor is missing the chassis array")]
    ParseChassisArray,

    #[error("descriptor has an empty chassis array")]
    NoChassis,

    #[error("failed to create a chassis")]
    FailedCreateChassis,

    /// A chassis constructor latched an error.
    #[error("a chassis was not successfully created")]
    ChassisCreateError,

    #[error("a chassis failed to start")]
    ChassisFailedStart,

    /// Start was requested while a previous error is latched.
    #[error("node has a latched error")]
    LatchedError,
}
