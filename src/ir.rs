//! Untyped intermediate representation (IR).
//!
//! Every node converts to a mapping whose key set alone says which variant it
//! is; `classify` turns a mapping back into a [`NodeKind`] by walking
//! [`DISPATCH_ORDER`]. The JSON form used to hand IR to external parsers and
//! printers lives in [`json`].
pub mod json;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::bits::{self, Bits, BitsSlice};
use crate::error::{Error, Result};
use crate::node::NodeKind;

pub const KEY_BCD: &str = "bcd";
pub const KEY_LENGTH: &str = "length";
pub const KEY_BITS: &str = "bits";
pub const KEY_VALUE: &str = "value";
pub const KEY_ITEMS: &str = "items";
pub const KEY_PROPERTIES: &str = "properties";

/// One IR mapping. Insertion order is kept so `properties` stays ordered.
pub type IrMap = IndexMap<String, IrValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum IrValue {
    Bool(bool),
    Uint(u64),
    Bytes(Vec<u8>),
    Bits(Bits),
    List(Vec<IrValue>),
    Map(IrMap),
    /// Content no codec key produces (unknown keys, non-boolean `value`).
    Other(serde_json::Value),
}

impl IrValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            IrValue::Bool(_) => "boolean",
            IrValue::Uint(_) => "unsigned integer",
            IrValue::Bytes(_) => "bytes",
            IrValue::Bits(_) => "bits",
            IrValue::List(_) => "list",
            IrValue::Map(_) => "mapping",
            IrValue::Other(_) => "foreign JSON value",
        }
    }
}

impl From<IrMap> for IrValue {
    fn from(map: IrMap) -> Self {
        IrValue::Map(map)
    }
}

impl Serialize for IrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            IrValue::Bool(b) => serializer.serialize_bool(*b),
            IrValue::Uint(n) => serializer.serialize_u64(*n),
            IrValue::Bytes(bytes) => {
                let mut seq = serializer.serialize_seq(Some(bytes.len()))?;
                for byte in bytes {
                    seq.serialize_element(byte)?;
                }
                seq.end()
            }
            IrValue::Bits(bits) => serializer.serialize_str(&bits::to_binary_string(bits)),
            IrValue::List(items) => items.serialize(serializer),
            IrValue::Map(map) => map.serialize(serializer),
            IrValue::Other(value) => value.serialize(serializer),
        }
    }
}

// ------------------------------- Dispatch --------------------------------- //

pub type ShapePredicate = fn(&IrMap) -> bool;

/// Shape predicates in precedence order; the first match decides the variant.
pub static DISPATCH_ORDER: [(NodeKind, ShapePredicate); 6] = [
    (NodeKind::Number, has_bcd),
    (NodeKind::Boolean, has_boolean_value),
    (NodeKind::String, has_length_and_bits),
    (NodeKind::Null, is_empty),
    (NodeKind::Array, has_items),
    (NodeKind::Object, has_properties),
];

fn has_bcd(ir: &IrMap) -> bool {
    ir.contains_key(KEY_BCD)
}

fn has_boolean_value(ir: &IrMap) -> bool {
    matches!(ir.get(KEY_VALUE), Some(IrValue::Bool(_)))
}

fn has_length_and_bits(ir: &IrMap) -> bool {
    ir.contains_key(KEY_LENGTH) && ir.contains_key(KEY_BITS)
}

fn is_empty(ir: &IrMap) -> bool {
    ir.is_empty()
}

fn has_items(ir: &IrMap) -> bool {
    ir.contains_key(KEY_ITEMS)
}

fn has_properties(ir: &IrMap) -> bool {
    ir.contains_key(KEY_PROPERTIES)
}

/// Which variant `ir` encodes.
pub fn classify(ir: &IrMap) -> Result<NodeKind> {
    DISPATCH_ORDER
        .iter()
        .find(|(_, predicate)| predicate(ir))
        .map(|(kind, _)| *kind)
        .ok_or_else(|| Error::UnknownShape {
            keys: ir.keys().cloned().collect(),
        })
}

// ------------------------------- Accessors -------------------------------- //

pub(crate) fn get_uint(ir: &IrMap, key: &'static str) -> Result<u64> {
    match ir.get(key) {
        Some(IrValue::Uint(n)) => Ok(*n),
        _ => Err(Error::MalformedIr { key, expected: "an unsigned integer" }),
    }
}

pub(crate) fn get_bytes<'a>(ir: &'a IrMap, key: &'static str) -> Result<&'a [u8]> {
    match ir.get(key) {
        Some(IrValue::Bytes(bytes)) => Ok(bytes),
        _ => Err(Error::MalformedIr { key, expected: "bytes" }),
    }
}

/// Bit payload under `key`; a byte string is accepted as its bits.
pub(crate) fn get_bits<'a>(ir: &'a IrMap, key: &'static str) -> Result<&'a BitsSlice> {
    use bitvec::{order::Msb0, view::BitView};
    match ir.get(key) {
        Some(IrValue::Bits(bits)) => Ok(bits.as_bitslice()),
        Some(IrValue::Bytes(bytes)) => Ok(bytes.as_slice().view_bits::<Msb0>()),
        _ => Err(Error::MalformedIr { key, expected: "bits" }),
    }
}

pub(crate) fn get_list<'a>(ir: &'a IrMap, key: &'static str) -> Result<&'a [IrValue]> {
    match ir.get(key) {
        Some(IrValue::List(items)) => Ok(items),
        _ => Err(Error::MalformedIr { key, expected: "a list" }),
    }
}

pub(crate) fn get_map<'a>(ir: &'a IrMap, key: &'static str) -> Result<&'a IrMap> {
    match ir.get(key) {
        Some(IrValue::Map(map)) => Ok(map),
        _ => Err(Error::MalformedIr { key, expected: "a mapping" }),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, IrValue)>) -> IrMap {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn dispatch_table_covers_every_kind_once() {
        let mut kinds: Vec<u8> = DISPATCH_ORDER.iter().map(|(kind, _)| kind.tag()).collect();
        kinds.sort_unstable();
        assert_eq!(kinds, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn each_shape_classifies() {
        let cases = [
            (map(vec![]), NodeKind::Null),
            (
                map(vec![("bcd", IrValue::Bytes(vec![0x10])), ("length", IrValue::Uint(1))]),
                NodeKind::Number,
            ),
            (
                map(vec![("length", IrValue::Uint(0)), ("bits", IrValue::Bits(Bits::new()))]),
                NodeKind::String,
            ),
            (map(vec![("value", IrValue::Bool(true))]), NodeKind::Boolean),
            (map(vec![("items", IrValue::List(vec![]))]), NodeKind::Array),
            (map(vec![("properties", IrValue::Map(IrMap::new()))]), NodeKind::Object),
        ];
        for (ir, expected) in cases {
            assert_eq!(classify(&ir).unwrap(), expected);
        }
    }

    #[test]
    fn bcd_wins_over_every_later_predicate() {
        let ir = map(vec![
            ("items", IrValue::List(vec![])),
            ("value", IrValue::Bool(false)),
            ("length", IrValue::Uint(1)),
            ("bits", IrValue::Bits(Bits::new())),
            ("bcd", IrValue::Bytes(vec![0x10])),
        ]);
        assert_eq!(classify(&ir).unwrap(), NodeKind::Number);
    }

    #[test]
    fn boolean_precedes_string_and_containers() {
        let ir = map(vec![
            ("properties", IrValue::Map(IrMap::new())),
            ("length", IrValue::Uint(0)),
            ("bits", IrValue::Bits(Bits::new())),
            ("value", IrValue::Bool(true)),
        ]);
        assert_eq!(classify(&ir).unwrap(), NodeKind::Boolean);
    }

    #[test]
    fn non_boolean_value_is_not_a_boolean_shape() {
        let ir = map(vec![("value", IrValue::Other(serde_json::json!("true")))]);
        match classify(&ir) {
            Err(Error::UnknownShape { keys }) => assert_eq!(keys, vec!["value".to_string()]),
            other => panic!("expected UnknownShape, got {other:?}"),
        }
    }

    #[test]
    fn length_alone_is_unknown() {
        let ir = map(vec![("length", IrValue::Uint(3))]);
        assert!(matches!(classify(&ir), Err(Error::UnknownShape { .. })));
    }

    #[test]
    fn items_precede_properties() {
        let ir = map(vec![
            ("properties", IrValue::Map(IrMap::new())),
            ("items", IrValue::List(vec![])),
        ]);
        assert_eq!(classify(&ir).unwrap(), NodeKind::Array);
    }

    #[test]
    fn bytes_are_accepted_as_bits() {
        let ir = map(vec![("bits", IrValue::Bytes(vec![0b1010_0000]))]);
        let bits = get_bits(&ir, KEY_BITS).unwrap();
        assert_eq!(bits.len(), 8);
        assert!(bits[0] && !bits[1] && bits[2]);
    }

    #[test]
    fn accessors_report_the_key() {
        let ir = map(vec![("length", IrValue::Bool(true))]);
        match get_uint(&ir, KEY_LENGTH) {
            Err(Error::MalformedIr { key, .. }) => assert_eq!(key, "length"),
            other => panic!("expected MalformedIr, got {other:?}"),
        }
    }

    #[test]
    fn serializes_bits_as_binary_digits() {
        let ir = map(vec![
            ("length", IrValue::Uint(2)),
            ("bits", IrValue::Bits(bits::from_binary_string("101").unwrap())),
        ]);
        let value = serde_json::to_value(&ir).unwrap();
        assert_eq!(value, serde_json::json!({"length": 2, "bits": "101"}));
    }
}
