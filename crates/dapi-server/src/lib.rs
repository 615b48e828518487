//! dAPI data feed server.
//!
//! Wires the feed store, signed data verification, PSP subscriptions and
//! the OEV auction into one serialized ledger, and exposes the read API.

pub mod config;
pub mod error;
pub mod read;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{Collaborators, DapiServer, DataFeedUpdated};
