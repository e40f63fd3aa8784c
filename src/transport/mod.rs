//! Transport backends for talking to Ledger devices.
//!
//! - [`hid::HidTransport`] -- USB HID for real hardware (feature `hid`)
//! - [`tcp::TcpTransport`] -- TCP for the Speculos simulator (feature `tcp`)
//! - [`TracingTransport`] -- wraps any transport and logs every exchange

#[cfg(feature = "hid")]
pub mod hid;
#[cfg(feature = "tcp")]
pub mod tcp;

use crate::apdu::{ApduAnswer, ApduCommand};
use crate::error::TransportError;

/// Host Speculos listens on when started locally.
pub const SPECULOS_DEFAULT_HOST: &str = "127.0.0.1";

/// APDU port Speculos is conventionally started with (`--apdu-port 5555`).
pub const SPECULOS_APDU_PORT: u16 = 5555;

pub trait Transport: Send + Sync {
    fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, TransportError> {
        (**self).exchange(command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransportType {
    /// First Ledger found on USB.
    #[cfg(feature = "hid")]
    NativeHID,
    /// `(host, port)` of a Speculos APDU socket.
    #[cfg(feature = "tcp")]
    TCP(String, u16),
}

#[cfg(feature = "tcp")]
impl TransportType {
    /// Speculos on localhost with the conventional APDU port.
    pub fn speculos() -> Self {
        Self::TCP(SPECULOS_DEFAULT_HOST.into(), SPECULOS_APDU_PORT)
    }
}

pub fn open(transport_type: &TransportType) -> Result<Box<dyn Transport>, TransportError> {
    match transport_type {
        #[cfg(feature = "hid")]
        TransportType::NativeHID => {
            let t = hid::HidTransport::new()?;
            Ok(Box::new(t))
        }
        #[cfg(feature = "tcp")]
        TransportType::TCP(host, port) => {
            let t = tcp::TcpTransport::new(host, *port)?;
            Ok(Box::new(t))
        }
        #[allow(unreachable_patterns)]
        _ => Err(TransportError::Comm(
            "no transport enabled, enable the 'hid' or 'tcp' feature".into(),
        )),
    }
}

/// Logs each command and answer in hex at `info` level.
///
/// Installed by [`LedgerApp`](crate::LedgerApp) when verbose output is
/// requested; the wrapped transport is otherwise untouched.
pub struct TracingTransport<T> {
    inner: T,
}

impl<T: Transport> TracingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: Transport> Transport for TracingTransport<T> {
    fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, TransportError> {
        log::info!("=> {}", hex::encode(command.serialize()));
        match self.inner.exchange(command) {
            Ok(answer) => {
                log::info!("<= {}", hex::encode(answer.raw()));
                Ok(answer)
            }
            Err(e) => {
                log::info!("<= error: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Transport for Echo {
        fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, TransportError> {
            Ok(ApduAnswer::new(&command.data, 0x9000))
        }
    }

    struct Unplugged;

    impl Transport for Unplugged {
        fn exchange(&self, _: &ApduCommand) -> Result<ApduAnswer, TransportError> {
            Err(TransportError::DeviceNotFound)
        }
    }

    #[test]
    fn tracing_passes_answers_through() {
        let t = TracingTransport::new(Echo);
        let answer = t.exchange(&ApduCommand::with_data(0x02, vec![1, 2])).unwrap();
        assert_eq!(answer.data(), &[1, 2]);
        assert_eq!(answer.retcode(), 0x9000);
    }

    #[test]
    fn tracing_passes_errors_through() {
        let t = TracingTransport::new(Unplugged);
        let err = t.exchange(&ApduCommand::new(0x02)).unwrap_err();
        assert!(matches!(err, TransportError::DeviceNotFound));
    }

    #[test]
    fn boxed_transport_delegates() {
        let t: Box<dyn Transport> = Box::new(Echo);
        let traced = TracingTransport::new(t);
        let answer = traced.exchange(&ApduCommand::with_data(0x01, vec![9])).unwrap();
        assert_eq!(answer.data(), &[9]);
    }

    #[cfg(feature = "tcp")]
    #[test]
    fn speculos_defaults() {
        assert_eq!(
            TransportType::speculos(),
            TransportType::TCP("127.0.0.1".into(), 5555)
        );
    }
}
