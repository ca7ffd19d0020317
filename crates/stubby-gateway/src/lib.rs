//! HTTP gateway for the Stubby URL shortener.
//!
//! Maps HTTP verbs and paths onto the [`stubby_core::Shortener`] contract,
//! validates request input, translates store outcomes to status codes and
//! ships one access-log line per request to a background writer.

pub mod access_log;
pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;
pub mod telemetry;

pub use app::App;
pub use state::AppState;
