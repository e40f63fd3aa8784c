//! Individual command implementations.
//!
//! You probably want [`LedgerApp`](crate::api::LedgerApp) instead.

pub mod get_pubkey;
pub mod verify_address;
