use crate::apdu::Instruction;
use crate::error::LedgerError;
use crate::protocol::SendChunks;
use crate::transport::Transport;
use crate::types::{AddressResult, Bip32Path};

/// Same wire format as GetPubkey but the app shows the address and waits
/// for the user to approve or reject it. Blocks until they do.
pub fn exec(
    transport: &dyn Transport,
    sender: &dyn SendChunks,
    path: &Bip32Path,
) -> Result<AddressResult, LedgerError> {
    log::info!("confirm the address for {path} on the device");
    let result = sender.send(transport, Instruction::VerifyAddress, &[path.serialize()])?;
    super::get_pubkey::parse_pubkey_response(&result)
}
