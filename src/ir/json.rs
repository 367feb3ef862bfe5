//! JSON form of the IR, the contract with external text parsers and printers.
//!
//! - `bcd` is an array of byte values
//! - `bits` is a string of binary digits, one per bit
//! - `length` is an unsigned number, `value` a boolean
//! - `items` is an array and `properties` an object, both of IR mappings
//!
//! Keys the codec does not know are carried through as [`IrValue::Other`] so
//! dispatch still reports the shape as unknown instead of dropping them.

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, Unexpected};
use serde::Serialize;
use serde_json::Value;

use super::{IrMap, IrValue, KEY_BCD, KEY_BITS, KEY_ITEMS, KEY_LENGTH, KEY_PROPERTIES, KEY_VALUE};
use crate::bits::{self, Bits};
use crate::error::{Error, Result};
use crate::path_de;

/// Wire shape of one IR mapping. Every codec key is optional; presence matters,
/// so a key given as JSON `null` is kept as [`Field::Null`].
#[derive(Debug, Default, serde::Deserialize)]
struct IrJson {
    #[serde(default, deserialize_with = "present")]
    bcd: Option<Field<Vec<u8>>>,
    #[serde(default, deserialize_with = "present")]
    length: Option<Field<u64>>,
    #[serde(default, deserialize_with = "present")]
    bits: Option<Field<BinaryDigits>>,
    #[serde(default, deserialize_with = "present")]
    value: Option<Field<Value>>,
    #[serde(default, deserialize_with = "present")]
    items: Option<Field<Vec<IrJson>>>,
    #[serde(default, deserialize_with = "present")]
    properties: Option<Field<IndexMap<String, IrJson>>>,
    #[serde(flatten)]
    extra: IndexMap<String, Value>,
}

#[derive(Debug)]
enum Field<T> {
    Null,
    Given(T),
}

#[derive(Debug)]
struct BinaryDigits(Bits);

impl<'de> Deserialize<'de> for BinaryDigits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        bits::from_binary_string(&text)
            .map(BinaryDigits)
            .ok_or_else(|| {
                de::Error::invalid_value(Unexpected::Str(&text), &"a string of binary digits")
            })
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Field<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let field = Option::<T>::deserialize(deserializer)?;
    Ok(Some(field.map_or(Field::Null, Field::Given)))
}

/// Inserts `field` under `key`; a `null` stays behind as a foreign value so
/// the typed accessors reject it after dispatch.
fn insert_field<T>(
    map: &mut IrMap,
    key: &str,
    field: Option<Field<T>>,
    wrap: impl FnOnce(T) -> IrValue,
) {
    let value = match field {
        None => return,
        Some(Field::Null) => IrValue::Other(Value::Null),
        Some(Field::Given(inner)) => wrap(inner),
    };
    map.insert(key.to_string(), value);
}

impl From<IrJson> for IrMap {
    fn from(wire: IrJson) -> Self {
        let mut map = IrMap::new();
        insert_field(&mut map, KEY_BCD, wire.bcd, IrValue::Bytes);
        insert_field(&mut map, KEY_LENGTH, wire.length, IrValue::Uint);
        insert_field(&mut map, KEY_BITS, wire.bits, |BinaryDigits(bits)| IrValue::Bits(bits));
        insert_field(&mut map, KEY_VALUE, wire.value, |value| match value {
            Value::Bool(b) => IrValue::Bool(b),
            other => IrValue::Other(other),
        });
        insert_field(&mut map, KEY_ITEMS, wire.items, |items| {
            IrValue::List(items.into_iter().map(|item| IrValue::Map(item.into())).collect())
        });
        insert_field(&mut map, KEY_PROPERTIES, wire.properties, |properties| {
            let properties = properties
                .into_iter()
                .map(|(name, prop)| (name, IrValue::Map(prop.into())))
                .collect();
            IrValue::Map(properties)
        });
        for (key, value) in wire.extra {
            map.insert(key, IrValue::Other(value));
        }
        map
    }
}

// ------------------------------- Front API -------------------------------- //

pub fn from_json_str(src: &str) -> Result<IrMap> {
    path_de::from_str_with_path::<IrJson>(src).map(IrMap::from)
}

pub fn from_json_slice(bytes: &[u8]) -> Result<IrMap> {
    path_de::from_slice_with_path::<IrJson>(bytes).map(IrMap::from)
}

/// Nesting accepted by [`from_json_value`], the same bound serde_json puts on
/// text input.
pub const MAX_JSON_DEPTH: usize = 128;

/// Reads an already parsed value. Nesting is checked up front because the
/// `Value` deserializer has no recursion limit of its own.
pub fn from_json_value(value: Value) -> Result<IrMap> {
    check_depth(&value)?;
    path_de::from_value_with_path::<IrJson>(value).map(IrMap::from)
}

fn check_depth(value: &Value) -> Result<()> {
    let mut pending = vec![(value, 1usize)];
    while let Some((value, depth)) = pending.pop() {
        let is_container = matches!(value, Value::Array(_) | Value::Object(_));
        if is_container && depth > MAX_JSON_DEPTH {
            return Err(Error::Json {
                path: ".".to_string(),
                message: format!("nesting exceeds {MAX_JSON_DEPTH} levels"),
            });
        }
        match value {
            Value::Array(items) => pending.extend(items.iter().map(|child| (child, depth + 1))),
            Value::Object(map) => pending.extend(map.values().map(|child| (child, depth + 1))),
            _ => {}
        }
    }
    Ok(())
}

pub fn to_json_value(ir: &IrMap) -> Value {
    // IrValue serialization has no failure path of its own
    ir.serialize(serde_json::value::Serializer).unwrap_or(Value::Null)
}

pub fn to_json_string(ir: &IrMap) -> String {
    to_json_value(ir).to_string()
}

pub fn to_json_string_pretty(ir: &IrMap) -> String {
    serde_json::to_string_pretty(&to_json_value(ir)).unwrap_or_default()
}

// ------------------------------- Tests ------------------------------------ //
