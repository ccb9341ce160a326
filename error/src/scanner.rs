use strum::IntoStaticStr;
use thiserror::Error;

/// Local error codes for Scanners.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScannerError {
    /// Descriptor has no `cards` array.
    #[error("descriptor is missing the cards array")]
    ParseCardsArray,

    #[error("descriptor has an empty cards array")]
    NoCards,

    #[error("descriptor is missing scanRateMultiplier")]
    MissingSrm,

    /// Rate multipliers are integers >= 1.
    #[error("scanRateMultiplier must be an integer >= 1")]
    InvalidSrm,

    #[error("failed to create an IO card")]
    FailedCreateCard,

    /// A card constructor latched an error.
    #[error("an IO card was not successfully created")]
    CardCreateError,

    #[error("an IO card failed to start")]
    CardFailedStart,

    #[error("an IO card failed to scan its inputs")]
    CardScanFailure,

    #[error("an IO card failed to flush its outputs")]
    CardFlushFailure,
}
