use strum::IntoStaticStr;
use thiserror::Error;

/// Local error codes for Execution Sets.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionSetError {
    /// Descriptor has no `logicChains` array.
    #[error("descriptor is missing the logicChains array")]
    ParseLogicChainArray,

    #[error("descriptor has an empty logicChains array")]
    NoLogicChains,

    #[error("descriptor is missing exeRateMultiplier")]
    MissingErm,

    /// Rate multipliers are integers >= 1.
    #[error("exeRateMultiplier must be an integer >= 1")]
    InvalidErm,

    #[error("failed to create a logic chain")]
    FailedCreateLogicChain,

    /// A logic chain constructor latched an error.
    #[error("a logic chain was not successfully created")]
    LogicChainCreateError,

    #[error("a logic chain failed to resolve its point references")]
    FailedPointResolve,

    #[error("a logic chain failed to start")]
    LogicChainFailedStart,

    /// A logic chain returned an error during execute.
    #[error("a logic chain failed during execution")]
    LogicChainFailure,
}
