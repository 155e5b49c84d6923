//! Hostsync core library — domain types and daemon configuration.
//!
//! Public API surface:
//! - [`types`] — [`HostName`] newtype and [`HostEntry`]
//! - [`config`] — [`SyncConfig`] with the daemon's path and cadence defaults

pub mod config;
pub mod types;

pub use config::SyncConfig;
pub use types::{HostEntry, HostName};
