//! Strings, with a compact path for UUID-shaped text.
//!
//! UUID-shaped text (32 hex digits, optionally in the 8-4-4-4-12 hyphenated
//! layout) is stored as 130 bits: a hyphen flag, an uppercase flag, then the
//! 128-bit value. Anything else is compressed with the codec's [`Compressor`].

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::bits::{self, Bits, BitsSlice};
use crate::compress::Compressor;
use crate::error::{Error, Result};
use crate::ir::{self, IrMap, IrValue, KEY_BITS, KEY_LENGTH};

/// Two flag bits plus the 128-bit value.
pub const UUID_PAYLOAD_BITS: usize = 2 + 128;

static UUID_SIMPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{32}$").expect("static regex"));

static UUID_HYPHENATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("static regex")
});

pub fn is_uuid_shaped(text: &str) -> bool {
    UUID_SIMPLE.is_match(text) || UUID_HYPHENATED.is_match(text)
}

/// Immutable text value. UUID-shaped input is normalized once, here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringNode {
    text: String,
    uuid: Option<Uuid>,
    had_hyphens: bool,
    had_uppercase: bool,
}

impl StringNode {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let had_hyphens = text.contains('-');
        let had_uppercase = text.chars().any(|c| matches!(c, 'A'..='F'));

        let uuid = is_uuid_shaped(&text)
            .then(|| Uuid::parse_str(&text).ok())
            .flatten();
        let text = match uuid {
            Some(uuid) => render_uuid(uuid, had_hyphens, had_uppercase),
            None => text,
        };

        Self { text, uuid, had_hyphens, had_uppercase }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_uuid(&self) -> bool {
        self.uuid.is_some()
    }

    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    pub fn had_hyphens(&self) -> bool {
        self.had_hyphens
    }

    pub fn had_uppercase(&self) -> bool {
        self.had_uppercase
    }

    /// Character count; this is what the IR `length` records.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Payload bits without the tag.
    pub fn payload(&self, compressor: &dyn Compressor) -> Result<Bits> {
        match self.uuid {
            Some(uuid) => {
                let mut out = Bits::with_capacity(UUID_PAYLOAD_BITS);
                out.push(self.had_hyphens);
                out.push(self.had_uppercase);
                bits::push_bytes(&mut out, uuid.as_bytes());
                Ok(out)
            }
            None => {
                let packed = compressor
                    .compress(self.text.as_bytes())
                    .map_err(Error::Compression)?;
                Ok(Bits::from_vec(packed))
            }
        }
    }

    pub fn to_ir(&self, compressor: &dyn Compressor) -> Result<IrMap> {
        let mut ir = IrMap::with_capacity(2);
        ir.insert(KEY_LENGTH.to_string(), IrValue::Uint(self.char_len() as u64));
        ir.insert(KEY_BITS.to_string(), IrValue::Bits(self.payload(compressor)?));
        Ok(ir)
    }

    pub fn from_ir(ir: &IrMap, compressor: &dyn Compressor) -> Result<Self> {
        let expected = ir::get_uint(ir, KEY_LENGTH)?;
        let payload = ir::get_bits(ir, KEY_BITS)?;
        let text = decode_payload(payload, compressor)?;

        let actual = text.chars().count() as u64;
        if actual != expected {
            return Err(Error::DecodeLengthMismatch { expected, actual });
        }
        Ok(Self::new(text))
    }

    pub fn write_binary(&self, out: &mut Bits, compressor: &dyn Compressor) -> Result<()> {
        out.extend_from_bitslice(&self.payload(compressor)?);
        Ok(())
    }
}

impl From<&str> for StringNode {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for StringNode {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

fn render_uuid(uuid: Uuid, hyphens: bool, uppercase: bool) -> String {
    match (hyphens, uppercase) {
        (true, true) => format!("{:X}", uuid.hyphenated()),
        (true, false) => format!("{:x}", uuid.hyphenated()),
        (false, true) => format!("{:X}", uuid.simple()),
        (false, false) => format!("{:x}", uuid.simple()),
    }
}

/// Decompression first, then the UUID layout.
fn decode_payload(payload: &BitsSlice, compressor: &dyn Compressor) -> Result<String> {
    let cannot_decode = || Error::CannotDecodeString { bits: payload.len() };

    if let Some(bytes) = bits::aligned_bytes(payload) {
        return match compressor.decompress(&bytes) {
            Ok(raw) => String::from_utf8(raw).map_err(|_| cannot_decode()),
            Err(err) => {
                debug!("string payload of {} bytes did not decompress: {err}", bytes.len());
                Err(cannot_decode())
            }
        };
    }

    if payload.len() != UUID_PAYLOAD_BITS {
        return Err(cannot_decode());
    }
    debug!("decoding {UUID_PAYLOAD_BITS}-bit string payload as a UUID");
    let hyphens = payload[0];
    let uppercase = payload[1];
    let raw = bits::aligned_bytes(&payload[2..]).ok_or_else(cannot_decode)?;
    let uuid = Uuid::from_slice(&raw).map_err(|_| cannot_decode())?;
    Ok(render_uuid(uuid, hyphens, uppercase))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::Lz4Frame;

    fn round_trip(text: &str) -> StringNode {
        let compressor = Lz4Frame::new();
        let ir = StringNode::new(text).to_ir(&compressor).unwrap();
        StringNode::from_ir(&ir, &compressor).unwrap()
    }

    #[test]
    fn simple_uuid_with_uppercase_normalizes_to_uppercase() {
        let node = StringNode::new("1234567890123456AF9dc2345b789012");
        assert!(node.is_uuid());
        assert!(node.had_uppercase());
        assert!(!node.had_hyphens());
        assert_eq!(node.as_str(), "1234567890123456AF9DC2345B789012");
        assert_eq!(round_trip(node.as_str()).as_str(), "1234567890123456AF9DC2345B789012");
    }

    #[test]
    fn hyphenated_lowercase_uuid_is_kept() {
        let text = "12345678-1234-a2f7-1234-123456789012";
        let node = StringNode::new(text);
        assert!(node.is_uuid());
        assert!(node.had_hyphens());
        assert!(!node.had_uppercase());
        assert_eq!(node.as_str(), text);
        assert_eq!(round_trip(text), node);
    }

    #[test]
    fn uuid_payload_is_130_bits_with_flags_first() {
        let node = StringNode::new("12345678-1234-A2F7-1234-123456789012");
        let ir = node.to_ir(&Lz4Frame::new()).unwrap();
        assert_eq!(ir["length"], IrValue::Uint(36));
        let IrValue::Bits(bits) = &ir["bits"] else { panic!("bits") };
        assert_eq!(bits.len(), UUID_PAYLOAD_BITS);
        assert!(bits[0], "hyphen flag");
        assert!(bits[1], "uppercase flag");
        let value = bits::aligned_bytes(&bits[2..]).unwrap();
        assert_eq!(value, node.uuid().unwrap().as_bytes().to_vec());
    }

    #[test]
    fn near_uuid_text_is_compressed() {
        let text = "1234567890123456af9dc2345b78901"; // 31 digits
        let node = StringNode::new(text);
        assert!(!node.is_uuid());
        assert_eq!(node.as_str(), text);
        let ir = node.to_ir(&Lz4Frame::new()).unwrap();
        assert_eq!(ir["length"], IrValue::Uint(31));
        assert_eq!(round_trip(text).as_str(), text);
    }

    #[test]
    fn long_repeated_text_compresses_below_its_size() {
        let text = "A".repeat(1000);
        let ir = StringNode::new(text.as_str()).to_ir(&Lz4Frame::new()).unwrap();
        let IrValue::Bits(bits) = &ir["bits"] else { panic!("bits") };
        assert!(bits.len() / 8 < text.len());
        assert_eq!(round_trip(&text).as_str(), text);
    }

    #[test]
    fn empty_and_multibyte_text() {
        assert_eq!(round_trip("").as_str(), "");
        let text = "héllo, wörld ✓";
        let ir = StringNode::new(text).to_ir(&Lz4Frame::new()).unwrap();
        assert_eq!(ir["length"], IrValue::Uint(text.chars().count() as u64));
        assert_eq!(round_trip(text).as_str(), text);
    }

    #[test]
    fn odd_sized_payload_cannot_decode() {
        let mut ir = IrMap::new();
        ir.insert("length".into(), IrValue::Uint(1));
        let payload = bits::from_binary_string(&"1".repeat(133)).unwrap();
        ir.insert("bits".into(), IrValue::Bits(payload));
        assert!(matches!(
            StringNode::from_ir(&ir, &Lz4Frame::new()),
            Err(Error::CannotDecodeString { bits: 133 })
        ));
    }

    #[test]
    fn foreign_bytes_cannot_decode() {
        let mut ir = IrMap::new();
        ir.insert("length".into(), IrValue::Uint(2));
        ir.insert("bits".into(), IrValue::Bytes(b"hi".to_vec()));
        assert!(matches!(
            StringNode::from_ir(&ir, &Lz4Frame::new()),
            Err(Error::CannotDecodeString { bits: 16 })
        ));
    }

    #[test]
    fn compressed_bytes_are_accepted_under_bits() {
        let compressor = Lz4Frame::new();
        let mut ir = IrMap::new();
        ir.insert("length".into(), IrValue::Uint(5));
        ir.insert("bits".into(), IrValue::Bytes(compressor.compress(b"hello").unwrap()));
        assert_eq!(StringNode::from_ir(&ir, &compressor).unwrap().as_str(), "hello");
    }

    #[test]
    fn length_must_match() {
        let compressor = Lz4Frame::new();
        let mut ir = StringNode::new("hello").to_ir(&compressor).unwrap();
        ir.insert("length".into(), IrValue::Uint(4));
        match StringNode::from_ir(&ir, &compressor) {
            Err(Error::DecodeLengthMismatch { expected, actual }) => {
                assert_eq!((expected, actual), (4, 5));
            }
            other => panic!("expected DecodeLengthMismatch, got {other:?}"),
        }
    }
}
