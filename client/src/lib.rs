//! Authenticated data-access layer for the runtrack service.
//!
//! # Architecture
//!
//! The crate is organized around a request executor that every typed model
//! delegates to:
//!
//! - [`LoadingTracker`] - process-wide bookkeeping of outstanding network
//!   calls, shared by reference so concurrent models drive one busy signal
//! - [`ApiClient`] - performs one authenticated round-trip per call:
//!   registers with the tracker, resolves and attaches the CSRF token on
//!   state-changing methods, normalizes the response body, and classifies
//!   HTTP failures into [`ApiError`]
//! - [`RunModel`] - one run record with save/delete/format behavior
//! - [`RunsModel`] - a grouped listing of runs, one [`RunModel`] per row
//!
//! Models hold an [`ApiClient`] as a collaborator rather than inheriting
//! from it; cloning the client is cheap and clones share the tracker, the
//! CSRF cache, and the cookie jar.
//!
//! # Error Handling
//!
//! The executor classifies and raises; models never catch. HTTP 5xx becomes
//! [`ApiError::Server`] (message from the body's `detail` field when
//! present), 403 becomes [`ApiError::Authentication`] (the UI layer reacts
//! by logging the user out), and a save/delete status outside its success
//! set becomes [`ApiError::Validation`]. The loading tracker is released on
//! every exit path, so a failed call never leaves the busy indicator stuck.

mod error;
mod executor;
mod loading;
mod payload;
mod run;
mod runs;

pub use error::ApiError;
pub use executor::ApiClient;
pub use loading::{CallGuard, CallToken, LoadingTracker};
pub use payload::{PayloadData, ResponsePayload};
pub use run::RunModel;
pub use runs::RunsModel;

pub use runtrack_types;

/// Header carrying the anti-forgery token on state-changing requests.
pub const CSRF_HEADER: &str = "X-CSRF-Token";
/// Cookie inspected for a previously issued anti-forgery token.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Endpoint that mints a fresh anti-forgery token.
pub const CSRF_ENDPOINT: &str = "api/auth/csrf";
/// Collection endpoint for run records.
pub const RUNS_ENDPOINT: &str = "api/runs/";

pub(crate) const CONNECT_TIMEOUT_SECS: u64 = 30;
pub(crate) const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";
