use crate::apdu::Instruction;
use crate::error::LedgerError;
use crate::protocol::SendChunks;
use crate::transport::Transport;
use crate::types::{Address, AddressResult, Bip32Path, PublicKey};

/// Returns immediately, nothing is shown on the device.
pub fn exec(
    transport: &dyn Transport,
    sender: &dyn SendChunks,
    path: &Bip32Path,
) -> Result<AddressResult, LedgerError> {
    let result = sender.send(transport, Instruction::GetPubkey, &[path.serialize()])?;
    parse_pubkey_response(&result)
}

/// Response: `[pubkey_len][pubkey][address_len][address]`. Apps that do
/// not derive an address stop after the key.
pub(crate) fn parse_pubkey_response(data: &[u8]) -> Result<AddressResult, LedgerError> {
    let (&pk_len, rest) = data
        .split_first()
        .ok_or_else(|| LedgerError::InvalidResponse("empty pubkey response".into()))?;
    let pk_len = pk_len as usize;
    if pk_len == 0 {
        return Err(LedgerError::InvalidResponse("zero-length public key".into()));
    }
    if rest.len() < pk_len {
        return Err(LedgerError::InvalidResponse(format!(
            "public key truncated: expected {pk_len} bytes, got {}",
            rest.len()
        )));
    }
    let (pubkey, rest) = rest.split_at(pk_len);

    let address = match rest.split_first() {
        None => None,
        Some((&addr_len, rest)) => {
            let addr_len = addr_len as usize;
            let addr = rest.get(..addr_len).ok_or_else(|| {
                LedgerError::InvalidResponse(format!(
                    "address truncated: expected {addr_len} bytes, got {}",
                    rest.len()
                ))
            })?;
            Some(Address(addr.to_vec()))
        }
    };

    Ok(AddressResult {
        public_key: PublicKey(pubkey.to_vec()),
        address,
    })
}
