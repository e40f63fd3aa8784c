//! APDU command and response types.
//!
//! Alamgu apps use CLA `0x00` and leave P1/P2 at `0x00`; the instruction
//! byte alone selects the operation.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
}

impl ApduCommand {
    pub fn new(ins: u8) -> Self {
        Self::with_data(ins, Vec::new())
    }

    pub fn with_data(ins: u8, data: Vec<u8>) -> Self {
        Self {
            cla: 0x00,
            ins,
            p1: 0x00,
            p2: 0x00,
            data,
        }
    }

    /// Wire format: `[CLA][INS][P1][P2][LC][DATA]`
    ///
    /// # Panics
    ///
    /// Panics if `data` exceeds 255 bytes (short APDU LC limit).
    pub fn serialize(&self) -> Vec<u8> {
        assert!(
            self.data.len() <= 255,
            "APDU data too long: {} bytes (max 255)",
            self.data.len()
        );
        let mut buf = Vec::with_capacity(5 + self.data.len());
        buf.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2]);
        buf.push(self.data.len() as u8);
        buf.extend_from_slice(&self.data);
        buf
    }
}

/// APDU response - last 2 bytes are the status word, everything before
/// that is the payload. Use [`data()`](ApduAnswer::data) to strip the SW.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduAnswer {
    raw: Vec<u8>,
}

impl ApduAnswer {
    pub fn from_raw(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    /// Payload followed by the status word.
    pub fn new(data: &[u8], retcode: u16) -> Self {
        let mut raw = Vec::with_capacity(data.len() + 2);
        raw.extend_from_slice(data);
        raw.extend_from_slice(&retcode.to_be_bytes());
        Self { raw }
    }

    pub fn retcode(&self) -> u16 {
        match self.raw.len() {
            0 | 1 => 0,
            len => u16::from_be_bytes([self.raw[len - 2], self.raw[len - 1]]),
        }
    }

    /// Payload only - strips the trailing 2-byte status word.
    pub fn data(&self) -> &[u8] {
        if self.raw.len() < 2 {
            return &[];
        }
        &self.raw[..self.raw.len() - 2]
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Instruction {
    VerifyAddress = 0x01,
    GetPubkey = 0x02,
}
