//! Foxtail logging facade.
//!
//! All crates in the workspace log through this crate so the backend can be
//! swapped without touching call sites. The launcher installs `env_logger`;
//! embedded builds may install any `log`-compatible backend.

pub use log::{self, debug, error, info, log_enabled, trace, warn, Level};
