use strum::IntoStaticStr;
use thiserror::Error;

/// Local error codes for IO Cards.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CardError {
    /// Descriptor `type` does not match the factory's GUID.
    #[error("card type GUID does not match the expected type")]
    GuidWrongType,

    /// No card factory is registered for the descriptor's type GUID.
    #[error("unknown card type GUID")]
    UnknownTypeGuid,

    #[error("card descriptor is missing its id")]
    MissingId,

    #[error("card descriptor is missing its slot number")]
    MissingSlot,

    #[error("card descriptor is missing its name")]
    MissingName,

    /// A point descriptor is missing `id`, `ioRegId`, or `internalId`.
    #[error("card point descriptor is missing a required id")]
    PointMissingId,

    /// Channel numbers must be unique and within the card's channel count.
    #[error("bad channel assignments")]
    BadChannelAssignments,

    /// More point descriptors than the card supports.
    #[error("too many point descriptors for the card")]
    TooManyChannels,

    /// A channel point's type GUID is not the type the card exposes.
    #[error("channel point has the wrong point type")]
    WrongPointType,

    /// Failed to build the setter point for an IO register.
    #[error("failed to create an IO register setter")]
    SetterError,

    /// One of the card's banks failed to populate.
    #[error("failed to create the card's point banks")]
    BankCreateError,

    /// The card-stateful arena cannot back the card's banks.
    #[error("out of stateful arena memory")]
    OutOfStatefulMemory,
}
