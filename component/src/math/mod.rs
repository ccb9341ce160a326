//! Numeric components.

mod scaler;

pub use scaler::Scaler;
