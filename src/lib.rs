//! Rust client for Ledger apps built on the Alamgu framework.
//!
//! Talks to the Ledger hardware wallet over USB HID or TCP (Speculos simulator)
//! and ships the `alamgu` command-line tool.
//!
//! # Quick start
//!
//! ```no_run
//! use ledger_alamgu::{AppOptions, ChunkProtocol, LedgerApp, TransportType};
//!
//! let options = AppOptions {
//!     protocol: ChunkProtocol::Block,
//!     verbose: false,
//! };
//! let app = LedgerApp::new(&TransportType::speculos(), options)?;
//!
//! let result = app.get_pubkey("44'/1'/0'/0/0")?;
//! println!("public key: {}", result.public_key);
//! # Ok::<(), ledger_alamgu::LedgerError>(())
//! ```
//!
//! # Modules
//!
//! - [`api`] -- high-level [`LedgerApp`] session
//! - [`transport`] -- device communication (USB HID, TCP, tracing wrapper)
//! - [`protocol`] -- the two ways of sending request parameters
//! - [`types`] -- [`Bip32Path`], [`PublicKey`], [`Address`], [`AddressResult`]
//! - `cli` -- the `getAddress` command (feature `cli`)
//!
//! # Feature flags
//!
//! - `hid` (default) -- USB HID transport for real Ledger devices
//! - `tcp` (default) -- TCP transport for the Speculos simulator
//! - `cli` (default) -- the `alamgu` binary and its clap argument types

pub mod apdu;
pub mod api;
#[cfg(feature = "cli")]
pub mod cli;
pub(crate) mod commands;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;

pub use api::{AppOptions, LedgerApp};
pub use error::{LedgerError, TransportError};
pub use protocol::ChunkProtocol;
#[cfg(feature = "hid")]
pub use transport::hid::DeviceType;
pub use transport::TransportType;
pub use types::{Address, AddressResult, Bip32Path, PublicKey};
