use strum::IntoStaticStr;
use thiserror::Error;

/// Local error codes for point Banks.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BankError {
    /// The stateful arena cannot back the bank's slab.
    #[error("out of stateful arena memory")]
    OutOfStatefulMemory,

    /// Raw copy size differs from the bank's stateful size.
    #[error("buffer size does not match the bank's stateful size")]
    SizeMismatch,

    /// Source bank's point type sequence differs from this bank's.
    #[error("banks are not layout-equivalent")]
    LayoutMismatch,

    /// A contained point failed to create.
    #[error("failed to create a point owned by the bank")]
    PointCreateError,

    /// Slab capacity was exceeded while binding points.
    #[error("bank slab capacity exceeded")]
    SlabExhausted,
}
