use std::sync::Mutex;

use crate::apdu::{ApduAnswer, ApduCommand};
use crate::error::TransportError;
use crate::transport::Transport;

const LEDGER_VID: u16 = 0x2c97;
const LEDGER_USAGE_PAGE: u16 = 0xFFA0;
const LEDGER_CHANNEL: u16 = 0x0101;
const LEDGER_TAG: u8 = 0x05;
const LEDGER_PACKET_WRITE_SIZE: usize = 65;
const LEDGER_PACKET_READ_SIZE: usize = 64;
const CHUNK_SIZE: usize = LEDGER_PACKET_WRITE_SIZE - 6;

/// Detected from the upper byte of the USB product ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    NanoS,
    NanoSPlus,
    NanoX,
    Flex,
    Stax,
    Unknown(u16),
}

impl DeviceType {
    /// Upper byte of the PID encodes the device family:
    /// `0x10` = Nano S, `0x40` = Nano X, `0x50` = Nano S+,
    /// `0x60` = Stax, `0x70` = Flex.
    pub fn from_product_id(pid: u16) -> Self {
        match pid >> 8 {
            0x10 => Self::NanoS,
            0x40 => Self::NanoX,
            0x50 => Self::NanoSPlus,
            0x60 => Self::Stax,
            0x70 => Self::Flex,
            _ => Self::Unknown(pid),
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NanoS => write!(f, "Nano S"),
            Self::NanoSPlus => write!(f, "Nano S+"),
            Self::NanoX => write!(f, "Nano X"),
            Self::Flex => write!(f, "Flex"),
            Self::Stax => write!(f, "Stax"),
            Self::Unknown(pid) => write!(f, "Unknown (0x{pid:04X})"),
        }
    }
}

/// USB HID connection to the first Ledger found.
///
/// Reads block without a timeout: a request that needs on-device
/// confirmation returns only once the user has acted on it.
pub struct HidTransport {
    device: Mutex<hidapi::HidDevice>,
}

impl HidTransport {
    pub fn new() -> Result<Self, TransportError> {
        let api = hidapi::HidApi::new().map_err(|e| TransportError::Comm(e.to_string()))?;

        let info = api
            .device_list()
            .find(|info| {
                info.vendor_id() == LEDGER_VID && info.usage_page() == LEDGER_USAGE_PAGE
            })
            .ok_or(TransportError::DeviceNotFound)?;

        let device_type = DeviceType::from_product_id(info.product_id());
        let device = info
            .open_device(&api)
            .map_err(|e| TransportError::Comm(e.to_string()))?;
        log::debug!("connected to Ledger {device_type}");

        Ok(Self {
            device: Mutex::new(device),
        })
    }
}

impl Transport for HidTransport {
    fn exchange(&self, command: &ApduCommand) -> Result<ApduAnswer, TransportError> {
        let device = self
            .device
            .lock()
            .map_err(|e| TransportError::Comm(format!("mutex poisoned: {e}")))?;

        for packet in frame_apdu(&command.serialize()) {
            device
                .write(&packet)
                .map_err(|e| TransportError::Comm(e.to_string()))?;
        }

        let mut reader = Reassembler::default();
        let mut buffer = [0u8; LEDGER_PACKET_READ_SIZE];
        loop {
            let n = device
                .read(&mut buffer)
                .map_err(|e| TransportError::Comm(e.to_string()))?;
            if let Some(response) = reader.push(&buffer[..n])? {
                return Ok(ApduAnswer::from_raw(response));
            }
        }
    }
}

/// HID framing: 2-byte length prefix, then the APDU, split into 59-byte
/// chunks each behind a `[report id][channel][tag][seq]` header.
fn frame_apdu(apdu: &[u8]) -> Vec<[u8; LEDGER_PACKET_WRITE_SIZE]> {
    let mut payload = Vec::with_capacity(2 + apdu.len());
    payload.extend_from_slice(&(apdu.len() as u16).to_be_bytes());
    payload.extend_from_slice(apdu);

    payload
        .chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(seq_idx, chunk)| {
            let mut packet = [0u8; LEDGER_PACKET_WRITE_SIZE];
            packet[1..3].copy_from_slice(&LEDGER_CHANNEL.to_be_bytes());
            packet[3] = LEDGER_TAG;
            packet[4..6].copy_from_slice(&(seq_idx as u16).to_be_bytes());
            packet[6..6 + chunk.len()].copy_from_slice(chunk);
            packet
        })
        .collect()
}

/// Collects response packets until the announced length is reached.
#[derive(Debug, Default)]
struct Reassembler {
    expected_len: Option<usize>,
    seq_idx: u16,
    data: Vec<u8>,
}

impl Reassembler {
    /// Feed one packet (without report id). Returns the full response
    /// once all of it has arrived.
    fn push(&mut self, packet: &[u8]) -> Result<Option<Vec<u8>>, TransportError> {
        if packet.len() < 5 {
            return Err(TransportError::Comm(format!(
                "HID short read: got {} bytes",
                packet.len()
            )));
        }

        let channel = u16::from_be_bytes([packet[0], packet[1]]);
        if channel != LEDGER_CHANNEL {
            return Err(TransportError::Comm("HID channel mismatch".into()));
        }
        if packet[2] != LEDGER_TAG {
            return Err(TransportError::Comm("HID tag mismatch".into()));
        }

        let pkt_seq = u16::from_be_bytes([packet[3], packet[4]]);
        if pkt_seq != self.seq_idx {
            return Err(TransportError::Comm(format!(
                "sequence mismatch: expected {}, got {pkt_seq}",
                self.seq_idx
            )));
        }

        let expected_len = match self.expected_len {
            Some(len) => len,
            None => {
                // First packet has a 2-byte length prefix before the data
                if packet.len() < 7 {
                    return Err(TransportError::Comm(
                        "HID short read: missing length prefix".into(),
                    ));
                }
                let len = u16::from_be_bytes([packet[5], packet[6]]) as usize;
                self.expected_len = Some(len);
                len
            }
        };
        let data_start = if self.seq_idx == 0 { 7 } else { 5 };

        let take = (expected_len - self.data.len()).min(packet.len() - data_start);
        self.data
            .extend_from_slice(&packet[data_start..data_start + take]);

        if self.data.len() >= expected_len {
            return Ok(Some(std::mem::take(&mut self.data)));
        }
        self.seq_idx = self.seq_idx.wrapping_add(1);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// What the device sends back for `response`, without report ids.
    fn device_packets(response: &[u8]) -> Vec<Vec<u8>> {
        frame_apdu(response)
            .into_iter()
            .map(|p| p[1..].to_vec())
            .collect()
    }

    #[test]
    fn device_type_from_pid() {
        assert_eq!(DeviceType::from_product_id(0x1011), DeviceType::NanoS);
        assert_eq!(DeviceType::from_product_id(0x4011), DeviceType::NanoX);
        assert_eq!(DeviceType::from_product_id(0x5011), DeviceType::NanoSPlus);
        assert_eq!(DeviceType::from_product_id(0x6011), DeviceType::Stax);
        assert_eq!(DeviceType::from_product_id(0x7011), DeviceType::Flex);
        assert_eq!(
            DeviceType::from_product_id(0x0001),
            DeviceType::Unknown(0x0001)
        );
    }

    #[test]
    fn frame_single_packet() {
        let packets = frame_apdu(&[0xE0, 0x02, 0x00, 0x00, 0x00]);
        assert_eq!(packets.len(), 1);
        assert_eq!(&packets[0][..9], &[0x00, 0x01, 0x01, 0x05, 0x00, 0x00, 0x00, 0x05, 0xE0]);
        assert!(packets[0][12..].iter().all(|&b| b == 0));
    }

    #[test]
    fn frame_splits_on_chunk_size() {
        // 2 length bytes + 100 bytes = 102 -> 59 + 43
        let packets = frame_apdu(&[0xAB; 100]);
        assert_eq!(packets.len(), 2);
        assert_eq!(&packets[1][4..6], &[0x00, 0x01]);
    }

    #[test]
    fn reassemble_multi_packet_response() {
        let response: Vec<u8> = (0..150u8).collect();
        let mut reader = Reassembler::default();
        let packets = device_packets(&response);
        assert_eq!(packets.len(), 3);

        assert!(reader.push(&packets[0]).unwrap().is_none());
        assert!(reader.push(&packets[1]).unwrap().is_none());
        assert_eq!(reader.push(&packets[2]).unwrap(), Some(response));
    }

    #[test]
    fn reassemble_rejects_wrong_sequence() {
        let packets = device_packets(&[0x11; 120]);
        let mut reader = Reassembler::default();
        let err = reader.push(&packets[1]).unwrap_err();
        assert!(matches!(err, TransportError::Comm(_)));
    }

    #[test]
    fn reassemble_rejects_wrong_channel() {
        let mut packet = device_packets(&[0x90, 0x00]).remove(0);
        packet[0] = 0x02;
        let err = Reassembler::default().push(&packet).unwrap_err();
        assert!(matches!(err, TransportError::Comm(_)));
    }

    #[test]
    fn reassemble_rejects_short_read() {
        let err = Reassembler::default().push(&[0x01, 0x01]).unwrap_err();
        assert!(matches!(err, TransportError::Comm(_)));
    }
}
