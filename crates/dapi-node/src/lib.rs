//! dAPI data feed node.
//!
//! Loads the node configuration, wires configuration-backed collaborators
//! into a `DapiServer` and applies a stream of JSON update requests:
//! - signed Beacon updates and Beacon set aggregation
//! - dAPI name assignment
//! - PSP subscription registration and fulfilment
//! - OEV overlay updates and escrow withdrawal

pub mod app;
pub mod collab;
pub mod config;
pub mod error;
pub mod request;

pub use app::{Application, IngestReport};
pub use config::NodeConfig;
pub use error::{AppError, AppResult};
pub use request::Request;
