//! High-level API - [`LedgerApp`] wraps a transport connection and the
//! chunk-sending strategy chosen for it.

use crate::commands;
use crate::error::LedgerError;
use crate::protocol::{ChunkProtocol, SendChunks};
use crate::transport::{self, TracingTransport, Transport, TransportType};
use crate::types::{AddressResult, Bip32Path};

/// Session settings, fixed for the lifetime of a [`LedgerApp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppOptions {
    /// How request parameters are sent to the app.
    pub protocol: ChunkProtocol,
    /// Log every APDU exchanged with the device.
    pub verbose: bool,
}

/// Session with an Alamgu app on a Ledger device or Speculos.
///
/// Owns the connection; dropping the session closes it.
pub struct LedgerApp {
    transport: Box<dyn Transport>,
    sender: Box<dyn SendChunks>,
}

impl LedgerApp {
    /// Open a connection and bind the session to it.
    pub fn new(transport_type: &TransportType, options: AppOptions) -> Result<Self, LedgerError> {
        let transport = transport::open(transport_type)?;
        Ok(Self::with_transport(transport, options))
    }

    /// Useful for testing or injecting a custom transport.
    pub fn with_transport(transport: Box<dyn Transport>, options: AppOptions) -> Self {
        let transport: Box<dyn Transport> = if options.verbose {
            Box::new(TracingTransport::new(transport))
        } else {
            transport
        };
        Self {
            transport,
            sender: options.protocol.sender(),
        }
    }

    /// Strategy this session sends requests with.
    pub fn protocol(&self) -> ChunkProtocol {
        self.sender.protocol()
    }

    /// Public key (and address, if the app derives one) for `path`.
    ///
    /// `path` is parsed here; a malformed one is reported as
    /// [`LedgerError::InvalidPath`] before anything is sent.
    pub fn get_pubkey(&self, path: &str) -> Result<AddressResult, LedgerError> {
        let path = Bip32Path::parse(path)?;
        commands::get_pubkey::exec(self.transport.as_ref(), self.sender.as_ref(), &path)
    }

    /// Shows the address on device and waits for user confirmation.
    pub fn verify_address(&self, path: &str) -> Result<AddressResult, LedgerError> {
        let path = Bip32Path::parse(path)?;
        commands::verify_address::exec(self.transport.as_ref(), self.sender.as_ref(), &path)
    }
}
