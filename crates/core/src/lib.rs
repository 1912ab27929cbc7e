//! Core library for the Todo Zenith client
//!
//! This crate contains everything below the presentation layer:
//! - The HTTP client for the hosted task service
//! - Session state, with a persisted snapshot that survives restarts
//! - The task collection for the signed-in user
//! - One-shot notifications for the UI

pub mod api;
pub mod app;
pub mod config;
pub mod error;
mod in_flight;
pub mod notify;
mod serde_helpers;
pub mod session;
pub mod task;

#[cfg(test)]
mod testing;

pub use app::TodoClient;
pub use config::{ClientConfig, RefreshMode};
pub use error::{Error, ErrorKind};
pub type Result<T> = std::result::Result<T, Error>;
