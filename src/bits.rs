//! Bit buffer used by the wire format.
//!
//! Bits are stored most-significant-first inside each byte, so a byte-aligned
//! buffer reads back as plain bytes in writing order.

use bitvec::prelude::*;

use crate::node::NodeKind;

/// Growable MSB-first bit buffer.
pub type Bits = BitVec<u8, Msb0>;

/// Borrowed view into a [`Bits`] buffer.
pub type BitsSlice = BitSlice<u8, Msb0>;

pub(crate) fn push_tag(bits: &mut Bits, kind: NodeKind) {
    let tag = kind.tag();
    bits.extend_from_bitslice(&tag.view_bits::<Msb0>()[8 - NodeKind::TAG_BITS..]);
}

pub(crate) fn push_bytes(bits: &mut Bits, bytes: &[u8]) {
    bits.extend_from_bitslice(bytes.view_bits::<Msb0>());
}

pub(crate) fn push_u32(bits: &mut Bits, value: u32) {
    push_bytes(bits, &value.to_be_bytes());
}

/// Bytes of `bits` when its length is a whole number of bytes.
pub fn aligned_bytes(bits: &BitsSlice) -> Option<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return None;
    }
    Some(bits.chunks(8).map(|byte| byte.load_be::<u8>()).collect())
}

/// `"0"`/`"1"` rendering, one character per bit.
pub fn to_binary_string(bits: &BitsSlice) -> String {
    bits.iter()
        .by_vals()
        .map(|bit| if bit { '1' } else { '0' })
        .collect()
}

pub fn from_binary_string(text: &str) -> Option<Bits> {
    let mut bits = Bits::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '0' => bits.push(false),
            '1' => bits.push(true),
            _ => return None,
        }
    }
    Some(bits)
}
