//! Core domain + application logic for gatebot, a moderation and onboarding
//! bot for a three-group chat community (main, admin, waiting room).
//!
//! This crate is intentionally framework-agnostic. The chat transport and the
//! calendar feed live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod feed;
pub mod formatting;
pub mod handlers;
pub mod logging;
pub mod router;
pub mod scheduler;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{Error, Result};
