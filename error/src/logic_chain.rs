use strum::IntoStaticStr;
use thiserror::Error;

/// Local error codes for Logic Chains.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicChainError {
    /// Descriptor has no `components` array.
    #[error("descriptor is missing the components array")]
    ParseComponentsArray,

    #[error("descriptor has an empty components array")]
    NoComponents,

    #[error("failed to create a component")]
    FailedCreateComponent,

    /// A component constructor latched an error.
    #[error("a component was not successfully created")]
    ComponentCreateError,

    #[error("failed to create a connector point")]
    PointCreateError,

    #[error("failed to create an auto point")]
    AutoPointCreateError,

    /// Auto points must carry an `initial` block.
    #[error("auto point has no initial value")]
    NoInitialValueAutoPoint,

    /// Connector points must not carry an `initial` block.
    #[error("connector point must not have an initial value")]
    ConnectorPointHasInitialValue,

    #[error("a component failed to resolve its point references")]
    FailedPointResolve,

    #[error("a component failed to start")]
    FailedStart,

    /// A component returned an error during execute.
    #[error("a component failed during execution")]
    ComponentFailure,
}
