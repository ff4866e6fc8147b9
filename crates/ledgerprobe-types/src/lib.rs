//! ledgerprobe types - record definitions shared by the storage layer and the probe.
//!
//! This crate provides:
//! - Content hashes (32-byte, blake3 digests)
//! - Blocks, their headers and issuance transactions
//! - Rendering helpers for amounts and timestamps as they appear in reports

pub mod amount;
pub mod block;
pub mod error;
pub mod hash;

pub use amount::{format_amount, COIN, DISPLAY_DECIMALS};
pub use block::{format_timestamp, Block, BlockHeader, IssuanceTx, TxOut};
pub use error::TypesError;
pub use hash::Hash;
