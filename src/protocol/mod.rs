//! Strategies for getting request parameters to the app.
//!
//! Alamgu apps accept parameters either as plain APDU chunks
//! ([`chunked::ApduChunks`]) or through the hash-linked block protocol
//! ([`block::BlockProtocol`]). A session picks one when it is created and
//! uses it for every request it makes.

pub mod block;
pub mod chunked;

use crate::apdu::{ApduAnswer, ApduCommand, Instruction};
use crate::error::LedgerError;
use crate::transport::Transport;

/// Sends the parameters of one instruction and returns the app's result
/// payload (status word already checked and stripped).
pub trait SendChunks: Send + Sync {
    fn send(
        &self,
        transport: &dyn Transport,
        ins: Instruction,
        params: &[Vec<u8>],
    ) -> Result<Vec<u8>, LedgerError>;

    fn protocol(&self) -> ChunkProtocol;
}

/// Which [`SendChunks`] implementation a session is bound to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChunkProtocol {
    #[default]
    Apdu,
    Block,
}

impl ChunkProtocol {
    pub fn sender(self) -> Box<dyn SendChunks> {
        match self {
            Self::Apdu => Box::new(chunked::ApduChunks),
            Self::Block => Box::new(block::BlockProtocol),
        }
    }
}

impl std::fmt::Display for ChunkProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apdu => write!(f, "apdu"),
            Self::Block => write!(f, "block"),
        }
    }
}

fn send_apdu(
    transport: &dyn Transport,
    ins: Instruction,
    data: Vec<u8>,
) -> Result<ApduAnswer, LedgerError> {
    let cmd = ApduCommand::with_data(ins as u8, data);
    Ok(transport.exchange(&cmd)?)
}
