use crate::apdu::Instruction;
use crate::error::{LedgerError, StatusWord};
use crate::protocol::{send_apdu, ChunkProtocol, SendChunks};
use crate::transport::Transport;

/// Largest payload sent per APDU.
const CHUNK_SIZE: usize = 230;

/// Default strategy: parameters are concatenated and sent as consecutive
/// APDUs of up to 230 bytes with the same instruction. Every answer must
/// be `0x9000`; the payload of the last one is the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApduChunks;

impl SendChunks for ApduChunks {
    fn send(
        &self,
        transport: &dyn Transport,
        ins: Instruction,
        params: &[Vec<u8>],
    ) -> Result<Vec<u8>, LedgerError> {
        let payload = params.concat();
        let mut chunks: Vec<&[u8]> = payload.chunks(CHUNK_SIZE).collect();
        if chunks.is_empty() {
            chunks.push(&[]);
        }

        let mut result = Vec::new();
        for chunk in chunks {
            let answer = send_apdu(transport, ins, chunk.to_vec())?;
            let code = answer.retcode();
            if !StatusWord::is_success(code) {
                return Err(LedgerError::from_status(code));
            }
            result = answer.data().to_vec();
        }
        Ok(result)
    }

    fn protocol(&self) -> ChunkProtocol {
        ChunkProtocol::Apdu
    }
}
