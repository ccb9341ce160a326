use strum::IntoStaticStr;
use thiserror::Error;

/// Local error codes for the Chassis.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ChassisError {
    /// Descriptor has no `scanners` array (or it is empty).
    #[error("descriptor is missing the scanners array")]
    ParseScannerArray,

    /// Descriptor has no `executionSets` array (or it is empty).
    #[error("descriptor is missing the executionSets array")]
    ParseExecutionSetArray,

    #[error("descriptor is missing fer")]
    MissingFer,

    /// The fundamental execution rate must be a microsecond count >= 1.
    #[error("fer must be an integer >= 1")]
    InvalidFer,

    /// One or more scanners were never added.
    #[error("one or more scanners are missing")]
    MissingScanners,

    #[error("one or more execution sets are missing")]
    MissingExecutionSets,

    #[error("one or more shared points are missing")]
    MissingSharedPoints,

    #[error("failed to create a scanner")]
    FailedCreateScanner,

    /// A scanner constructor latched an error.
    #[error("a scanner was not successfully created")]
    ScannerCreateError,

    #[error("failed to create an execution set")]
    FailedCreateExecutionSet,

    #[error("an execution set was not successfully created")]
    ExecutionSetCreateError,

    #[error("failed to create a shared point")]
    FailedCreateSharedPoints,

    #[error("a scanner failed to start")]
    ScannerFailedStart,

    #[error("an execution set failed to start")]
    ExecutionSetFailedStart,

    #[error("an execution set failed to resolve its point references")]
    FailedPointResolve,

    #[error("failed to build the scanner schedule")]
    FailedScannerScheduleBuild,

    #[error("failed to build the execution set schedule")]
    FailedExecutionSetScheduleBuild,
}
