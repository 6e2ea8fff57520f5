//! Core domain types for runtrack.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Everything here can be used from any layer of the
//! application; the network-facing models live in `runtrack-client`.

mod format;
mod hydrate;
mod run;

pub use format::format_seconds_as_hhmmss;
pub use hydrate::Hydrate;
pub use run::{GroupBy, RunData};
