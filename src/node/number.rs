//! Numbers as Binary-Coded Decimal.
//!
//! The value is rendered to its canonical decimal text and every character
//! becomes one 4-bit nybble:
//!
//! | char | nybble |
//! |---|---|
//! | `0`–`9` | 0–9 |
//! | `.` | 10 |
//! | `E` / `e` | 11 |
//! | `+` right after the exponent marker | 12 |
//! | `-` right after the exponent marker | 13 |
//! | `-` as the first character | 14 |
//!
//! Nybbles pack two per byte, first one in the high half; an odd count is
//! padded with a trailing 0 that `length` does not count. Round trips are
//! exact up to the text rendering: values that render alike decode alike.

use ordered_float::OrderedFloat;

use crate::bits::{self, Bits};
use crate::error::{Error, Result};
use crate::ir::{self, IrMap, IrValue, KEY_BCD, KEY_LENGTH};

pub const NYBBLE_POINT: u8 = 10;
pub const NYBBLE_EXPONENT: u8 = 11;
pub const NYBBLE_EXPONENT_PLUS: u8 = 12;
pub const NYBBLE_EXPONENT_MINUS: u8 = 13;
pub const NYBBLE_NEGATIVE: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NumberNode {
    value: OrderedFloat<f64>,
}

/// Packed BCD digits plus the number of meaningful nybbles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bcd {
    pub bytes: Vec<u8>,
    pub length: usize,
}

/// What the previous character was, for the exponent-sign rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Exponent,
    Other,
}

impl NumberNode {
    pub fn new(value: f64) -> Self {
        Self { value: OrderedFloat(value) }
    }

    pub fn value(&self) -> f64 {
        self.value.0
    }

    /// Shortest decimal text that reads back as the same `f64`.
    pub fn canonical_text(&self) -> String {
        let value = self.value.0;
        match serde_json::Number::from_f64(value) {
            Some(n) => n.to_string(),
            // NaN and infinities; their letters are rejected by the BCD table
            None => value.to_string(),
        }
    }

    pub fn to_bcd(&self) -> Result<Bcd> {
        let text = self.canonical_text();
        let mut nybbles = Vec::with_capacity(text.len() + 1);
        let mut prev = Prev::Start;
        for (offset, ch) in text.chars().enumerate() {
            let (nybble, next) = match (ch, prev) {
                ('0'..='9', _) => (ch as u8 - b'0', Prev::Other),
                ('.', _) => (NYBBLE_POINT, Prev::Other),
                ('E' | 'e', _) => (NYBBLE_EXPONENT, Prev::Exponent),
                ('+', Prev::Exponent) => (NYBBLE_EXPONENT_PLUS, Prev::Other),
                ('-', Prev::Exponent) => (NYBBLE_EXPONENT_MINUS, Prev::Other),
                ('-', Prev::Start) => (NYBBLE_NEGATIVE, Prev::Other),
                _ => return Err(Error::InvalidNumberCharacter { ch, offset, text: text.clone() }),
            };
            nybbles.push(nybble);
            prev = next;
        }

        let length = nybbles.len();
        if length % 2 != 0 {
            nybbles.push(0);
        }
        let bytes = nybbles
            .chunks_exact(2)
            .map(|pair| (pair[0] << 4) | pair[1])
            .collect();
        Ok(Bcd { bytes, length })
    }

    pub fn from_bcd(bytes: &[u8], length: usize) -> Result<Self> {
        let nybbles = bytes
            .iter()
            .flat_map(|byte| [byte >> 4, byte & 0x0F])
            .take(length);

        let mut text = String::with_capacity(length);
        let mut prev = Prev::Start;
        for (position, nybble) in nybbles.enumerate() {
            let (ch, next) = match (nybble, prev) {
                (0..=9, _) => ((b'0' + nybble) as char, Prev::Other),
                (NYBBLE_POINT, _) => ('.', Prev::Other),
                (NYBBLE_EXPONENT, _) => ('E', Prev::Exponent),
                (NYBBLE_EXPONENT_PLUS, Prev::Exponent) => ('+', Prev::Other),
                (NYBBLE_EXPONENT_MINUS, Prev::Exponent) => ('-', Prev::Other),
                // the sign nybble is accepted anywhere on the way back
                (NYBBLE_NEGATIVE, _) => ('-', Prev::Other),
                _ => return Err(Error::InvalidBcdNybble { nybble, position }),
            };
            text.push(ch);
            prev = next;
        }

        text.parse::<f64>()
            .map(Self::new)
            .map_err(|_| Error::InvalidNumberLiteral { text })
    }

    pub fn to_ir(&self) -> Result<IrMap> {
        let Bcd { bytes, length } = self.to_bcd()?;
        let mut ir = IrMap::with_capacity(2);
        ir.insert(KEY_BCD.to_string(), IrValue::Bytes(bytes));
        ir.insert(KEY_LENGTH.to_string(), IrValue::Uint(length as u64));
        Ok(ir)
    }

    pub fn from_ir(ir: &IrMap) -> Result<Self> {
        let bytes = ir::get_bytes(ir, KEY_BCD)?;
        let length = ir::get_uint(ir, KEY_LENGTH)?;
        // a length past the packed nybbles just keeps what is there
        let length = usize::try_from(length).unwrap_or(usize::MAX);
        Self::from_bcd(bytes, length)
    }

    /// Payload after the tag: the packed BCD bytes.
    pub fn write_binary(&self, out: &mut Bits) -> Result<()> {
        let bcd = self.to_bcd()?;
        bits::push_bytes(out, &bcd.bytes);
        Ok(())
    }
}

impl From<f64> for NumberNode {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

// ------------------------------- Tests ------------------------------------ //
