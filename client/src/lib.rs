//! LogiTrack client library.
//!
//! Session lifecycle, guarded navigation and the transaction collection of a
//! LogiTrack logistics account, backed by the LogiTrack HTTP API.

pub mod app;
pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use app::{AppOptions, Application, Ports};
pub use config::ClientSettings;
