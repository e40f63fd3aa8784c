//! Core types: BIP32 derivation paths, public key, address and the
//! combined [`AddressResult`] returned by key queries.

use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Serialize, Serializer};

use crate::error::LedgerError;

const HARDENED: u32 = 0x8000_0000;

/// Ledger apps refuse deeper paths.
const MAX_DEPTH: usize = 10;

/// BIP32 derivation path.
///
/// Parsed from strings such as `44'/1'/0'/0/0` or `m/44h/535348h/0h`.
/// No coin-type or hardening policy is applied here: whether a path is
/// acceptable is up to the app running on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bip32Path(Vec<u32>);

impl Bip32Path {
    /// Components carry the hardened bit themselves.
    pub fn new(components: Vec<u32>) -> Result<Self, LedgerError> {
        if components.is_empty() {
            return Err(LedgerError::InvalidPath("path is empty".into()));
        }
        if components.len() > MAX_DEPTH {
            return Err(LedgerError::InvalidPath(format!(
                "path has {} components (max {MAX_DEPTH})",
                components.len()
            )));
        }
        Ok(Self(components))
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        let trimmed = s.trim();
        let body = match trimmed {
            "m" | "M" => "",
            _ => trimmed
                .strip_prefix("m/")
                .or_else(|| trimmed.strip_prefix("M/"))
                .unwrap_or(trimmed),
        };
        if body.is_empty() {
            return Err(LedgerError::InvalidPath(format!("{s:?} has no components")));
        }

        let components = body
            .split('/')
            .map(parse_component)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(components)
    }

    /// Wire format: `[n: u8][path[0]: u32 LE]...[path[n-1]: u32 LE]`
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; 1 + self.0.len() * 4];
        buf[0] = self.0.len() as u8;
        for (slot, &component) in buf[1..].chunks_exact_mut(4).zip(&self.0) {
            LittleEndian::write_u32(slot, component);
        }
        buf
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }
}

fn parse_component(raw: &str) -> Result<u32, LedgerError> {
    let (digits, hardened) = match raw.strip_suffix(['\'', 'h', 'H']) {
        Some(d) => (d, true),
        None => (raw, false),
    };
    let index: u32 = digits
        .parse()
        .map_err(|_| LedgerError::InvalidPath(format!("bad component {raw:?}")))?;
    if index & HARDENED != 0 {
        return Err(LedgerError::InvalidPath(format!(
            "component {raw:?} does not fit in 31 bits"
        )));
    }
    Ok(if hardened { index | HARDENED } else { index })
}

impl FromStr for Bip32Path {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Bip32Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m")?;
        for &c in &self.0 {
            let val = c & !HARDENED;
            let h = if c & HARDENED != 0 { "'" } else { "" };
            write!(f, "/{val}{h}")?;
        }
        Ok(())
    }
}

/// Public key bytes as returned by the app. The length depends on the
/// curve the app uses, so no size is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicKey(#[serde(with = "hex::serde")] pub Vec<u8>);

/// Address bytes as returned by the app. Most apps send a printable
/// encoding (bech32, base58, `k:`-prefixed hex ...), which is rendered
/// as text; anything else is rendered as hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address(pub Vec<u8>);

/// Answer to a public key or verify address request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResult {
    pub public_key: PublicKey,
    pub address: Option<Address>,
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) if !text.chars().any(char::is_control) => f.write_str(text),
            _ => write!(f, "{}", hex::encode(&self.0)),
        }
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mixed_hardening() {
        let path: Bip32Path = "44'/1'/0'/0/0".parse().unwrap();
        assert_eq!(
            path.components(),
            &[44 | HARDENED, 1 | HARDENED, HARDENED, 0, 0]
        );
        assert_eq!(path.to_string(), "m/44'/1'/0'/0/0");
    }

    #[test]
    fn parse_accepts_m_prefix_and_h_markers() {
        let a = Bip32Path::parse("m/44h/535348H/0'").unwrap();
        let b = Bip32Path::parse("44'/535348'/0'").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn serialize_little_endian() {
        let path = Bip32Path::parse("44'/1'/0'/0/0").unwrap();
        let bytes = path.serialize();
        assert_eq!(bytes.len(), 1 + 5 * 4);
        assert_eq!(bytes[0], 5);
        // 44' = 0x8000002C
        assert_eq!(&bytes[1..5], &[0x2C, 0x00, 0x00, 0x80]);
        // 1' = 0x80000001
        assert_eq!(&bytes[5..9], &[0x01, 0x00, 0x00, 0x80]);
        assert_eq!(&bytes[17..21], &[0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn empty_rejected() {
        for s in ["", "m", "m/", "  "] {
            assert!(
                matches!(Bip32Path::parse(s), Err(LedgerError::InvalidPath(_))),
                "{s:?} should be rejected"
            );
        }
    }

    #[test]
    fn garbage_rejected() {
        for s in ["44'/x/0", "44''/1", "44'//1", "-1/0", "44'/1'/"] {
            assert!(Bip32Path::parse(s).is_err(), "{s:?} should be rejected");
        }
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(Bip32Path::parse("2147483648").is_err());
        assert!(Bip32Path::parse("2147483647'").is_ok());
    }

    #[test]
    fn too_deep_rejected() {
        assert!(Bip32Path::parse("0/1/2/3/4/5/6/7/8/9").is_ok());
        assert!(Bip32Path::parse("0/1/2/3/4/5/6/7/8/9/10").is_err());
    }

    #[test]
    fn address_display_text_or_hex() {
        assert_eq!(Address(b"k:abc".to_vec()).to_string(), "k:abc");
        assert_eq!(Address(vec![0xDE, 0xAD, 0x00]).to_string(), "dead00");
        assert_eq!(Address(vec![0xFF, 0xFE]).to_string(), "fffe");
    }

    #[test]
    fn result_serializes_camel_case() {
        let res = AddressResult {
            public_key: PublicKey(vec![0xDE, 0xAD, 0xBE, 0xEF]),
            address: Some(Address(b"pokt1xyz".to_vec())),
        };
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["publicKey"], "deadbeef");
        assert_eq!(json["address"], "pokt1xyz");
    }

    #[test]
    fn missing_address_serializes_null() {
        let res = AddressResult {
            public_key: PublicKey(vec![0x01]),
            address: None,
        };
        let json = serde_json::to_value(&res).unwrap();
        assert!(json["address"].is_null());
    }
}
