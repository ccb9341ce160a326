//! Structured, tagged errors.
//!
//! Every failure in the runtime is a `{category, code}` pair: the category
//! names the subsystem, the code is that subsystem's local enumerant. There
//! is no `SUCCESS` value — success is the absence of an error (`Ok(())` on
//! calls, `None` in latched state).
//!
//! Construction errors are latched on the object that failed to build and
//! rolled up by the owner as its own category-specific code, so an operator
//! can walk the tree from `Node` down to the failing `Component`.

mod bank;
mod card;
mod chassis;
mod component;
mod execution_set;
mod logic_chain;
mod node;
mod point;
mod scanner;

pub use bank::BankError;
pub use card::CardError;
pub use chassis::ChassisError;
pub use component::ComponentError;
pub use execution_set::ExecutionSetError;
pub use logic_chain::LogicChainError;
pub use node::NodeError;
pub use point::PointError;
pub use scanner::ScannerError;

use thiserror::Error;

/// A tagged runtime error: one variant per subsystem category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("point: {0}")]
    Point(#[from] PointError),
    #[error("bank: {0}")]
    Bank(#[from] BankError),
    #[error("card: {0}")]
    Card(#[from] CardError),
    #[error("component: {0}")]
    Component(#[from] ComponentError),
    #[error("logic chain: {0}")]
    LogicChain(#[from] LogicChainError),
    #[error("scanner: {0}")]
    Scanner(#[from] ScannerError),
    #[error("execution set: {0}")]
    ExecutionSet(#[from] ExecutionSetError),
    #[error("chassis: {0}")]
    Chassis(#[from] ChassisError),
    #[error("node: {0}")]
    Node(#[from] NodeError),
}

impl Error {
    /// Category tag, for operator-facing status displays.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Point(_) => "POINT",
            Error::Bank(_) => "BANK",
            Error::Card(_) => "CARD",
            Error::Component(_) => "COMPONENT",
            Error::LogicChain(_) => "LOGIC_CHAIN",
            Error::Scanner(_) => "SCANNER",
            Error::ExecutionSet(_) => "EXECUTION_SET",
            Error::Chassis(_) => "CHASSIS",
            Error::Node(_) => "NODE",
        }
    }

    /// Static name of the local code, e.g. `FAILED_POINT_RESOLVE`.
    pub fn code_name(&self) -> &'static str {
        match self {
            Error::Point(e) => e.into(),
            Error::Bank(e) => e.into(),
            Error::Card(e) => e.into(),
            Error::Component(e) => e.into(),
            Error::LogicChain(e) => e.into(),
            Error::Scanner(e) => e.into(),
            Error::ExecutionSet(e) => e.into(),
            Error::Chassis(e) => e.into(),
            Error::Node(e) => e.into(),
        }
    }

    /// `CATEGORY:CODE` tag for log lines and status output.
    pub fn tag(&self) -> String {
        format!("{}:{}", self.category(), self.code_name())
    }
}
