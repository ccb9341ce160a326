//! Bit- and boolean-oriented components.

mod and;
mod demux;
mod mux;
mod not;

pub use and::And;
pub use demux::Demux;
pub use mux::Mux;
pub use not::Not;
