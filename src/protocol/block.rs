//! Block protocol for handing large parameters to the app.
//!
//! Every parameter is split into 180-byte blocks, each prefixed with the
//! SHA-256 of the next serialized block (all zeros for the last one). The
//! host announces the hashes of the first blocks, then answers the
//! device's requests until it yields a final result.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::apdu::{ApduAnswer, Instruction};
use crate::error::{LedgerError, StatusWord};
use crate::protocol::{send_apdu, ChunkProtocol, SendChunks};
use crate::transport::Transport;

const BLOCK_DATA_SIZE: usize = 180;

type Hash = [u8; 32];

#[repr(u8)]
enum HostMsg {
    Start = 0x00,
    GetChunkResponseSuccess = 0x01,
    GetChunkResponseFailure = 0x02,
    PutChunkResponse = 0x03,
    ResultAccumulatingResponse = 0x04,
}

#[repr(u8)]
enum DeviceMsg {
    ResultAccumulating = 0x00,
    ResultFinal = 0x01,
    GetChunk = 0x02,
    PutChunk = 0x03,
}

/// Hash-linked block strategy, selected with `--useBlock`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockProtocol;

impl SendChunks for BlockProtocol {
    fn send(
        &self,
        transport: &dyn Transport,
        ins: Instruction,
        params: &[Vec<u8>],
    ) -> Result<Vec<u8>, LedgerError> {
        let mut store = BlockStore::default();
        let mut start = vec![HostMsg::Start as u8];
        for param in params {
            start.extend_from_slice(&store.add_param(param));
        }

        let mut result = Vec::new();
        let mut response = send_apdu(transport, ins, start)?;

        loop {
            let reply = match split_message(&response)? {
                (x, payload) if x == DeviceMsg::ResultFinal as u8 => {
                    result.extend_from_slice(payload);
                    return Ok(result);
                }
                (x, payload) if x == DeviceMsg::ResultAccumulating as u8 => {
                    result.extend_from_slice(payload);
                    vec![HostMsg::ResultAccumulatingResponse as u8]
                }
                (x, payload) if x == DeviceMsg::GetChunk as u8 => {
                    let hash: Hash = payload
                        .get(..32)
                        .and_then(|h| h.try_into().ok())
                        .ok_or_else(|| {
                            LedgerError::BlockProtocol("GET_CHUNK request too short".into())
                        })?;
                    match store.get(&hash) {
                        Some(block) => {
                            let mut reply = Vec::with_capacity(1 + block.len());
                            reply.push(HostMsg::GetChunkResponseSuccess as u8);
                            reply.extend_from_slice(block);
                            reply
                        }
                        None => {
                            log::warn!("device asked for unknown block {}", hex::encode(hash));
                            vec![HostMsg::GetChunkResponseFailure as u8]
                        }
                    }
                }
                (x, payload) if x == DeviceMsg::PutChunk as u8 => {
                    store.put(payload.to_vec());
                    vec![HostMsg::PutChunkResponse as u8]
                }
                (other, _) => {
                    return Err(LedgerError::BlockProtocol(format!(
                        "unknown device message type: 0x{other:02X}"
                    )));
                }
            };
            response = send_apdu(transport, ins, reply)?;
        }
    }

    fn protocol(&self) -> ChunkProtocol {
        ChunkProtocol::Block
    }
}

/// The message type byte drives the exchange, so the status word only
/// matters when the device sent nothing else.
fn split_message(answer: &ApduAnswer) -> Result<(u8, &[u8]), LedgerError> {
    match answer.data().split_first() {
        Some((&kind, payload)) => Ok((kind, payload)),
        None => {
            let code = answer.retcode();
            if code != 0 && !StatusWord::is_success(code) {
                return Err(LedgerError::from_status(code));
            }
            Err(LedgerError::BlockProtocol("empty response".into()))
        }
    }
}

/// Serialized blocks keyed by their hash: the ones built from request
/// parameters plus whatever the device parked with PUT_CHUNK.
#[derive(Debug, Default)]
struct BlockStore {
    blocks: HashMap<Hash, Vec<u8>>,
}

impl BlockStore {
    /// Store the chain for `param` and return the hash of its first block.
    fn add_param(&mut self, param: &[u8]) -> Hash {
        let chain = build_block_chain(param);
        let mut first = [0u8; 32];
        for (i, block) in chain.into_iter().enumerate() {
            let hash = sha256(&block);
            if i == 0 {
                first = hash;
            }
            self.blocks.insert(hash, block);
        }
        first
    }

    fn put(&mut self, block: Vec<u8>) {
        self.blocks.insert(sha256(&block), block);
    }

    fn get(&self, hash: &Hash) -> Option<&[u8]> {
        self.blocks.get(hash).map(Vec::as_slice)
    }
}

/// Split `data` into serialized blocks (`next_hash ++ data`). Built
/// backwards so each block can embed the hash of its successor. Empty
/// input still yields one empty block.
fn build_block_chain(data: &[u8]) -> Vec<Vec<u8>> {
    let mut pieces: Vec<&[u8]> = data.chunks(BLOCK_DATA_SIZE).collect();
    if pieces.is_empty() {
        pieces.push(&[]);
    }

    let mut next_hash = [0u8; 32];
    let mut blocks: Vec<Vec<u8>> = pieces
        .iter()
        .rev()
        .map(|piece| {
            let mut block = Vec::with_capacity(32 + piece.len());
            block.extend_from_slice(&next_hash);
            block.extend_from_slice(piece);
            next_hash = sha256(&block);
            block
        })
        .collect();
    blocks.reverse();
    blocks
}

fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}
