//! OEV (oracle extractable value) shadow feeds.
//!
//! Auction winners push signed data to a per-proxy overlay instead of the
//! base store, and pay for the right to do so. This crate provides:
//! - `OverlayStore`: base feeds as seen through one OEV proxy
//! - `OevLedger`: batch verification, aggregation and escrow credit
//! - `EscrowBook`: per-proxy proceeds and their withdrawal

pub mod auction;
pub mod error;
pub mod escrow;
pub mod overlay;
pub mod signed;

pub use auction::{OevLedger, OevUpdate, OevUpdateRequest};
pub use error::{OevError, OevResult};
pub use escrow::{EscrowBook, Withdrawal};
pub use overlay::{resolve, OverlayKey, OverlayStore};
pub use signed::{oev_message_hash, sign_oev_update, OevBid};
