//! Document node tree.
//!
//! A [`Node`] is one of six variants, each with a type name and a 3-bit tag
//! that prefixes its binary encoding:
//!
//! | variant | tag |
//! |---|---|
//! | null    | 000 |
//! | number  | 001 |
//! | string  | 010 |
//! | boolean | 011 |
//! | array   | 100 |
//! | object  | 101 |
//!
//! Nodes are immutable once built. Conversions to and from IR and to binary
//! go through a [`Codec`]; the methods here use the process-wide default one.
pub mod array;
pub mod number;
pub mod object;
pub mod string;

use indexmap::IndexMap;
use serde_json::Value;

use crate::bits::Bits;
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::ir::{IrMap, IrValue, KEY_VALUE};

pub use array::ArrayNode;
pub use number::NumberNode;
pub use object::ObjectNode;
pub use string::StringNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum NodeKind {
    Null = 0b000,
    Number = 0b001,
    String = 0b010,
    Boolean = 0b011,
    Array = 0b100,
    Object = 0b101,
}

impl NodeKind {
    pub const TAG_BITS: usize = 3;

    pub const ALL: [NodeKind; 6] = [
        NodeKind::Null,
        NodeKind::Number,
        NodeKind::String,
        NodeKind::Boolean,
        NodeKind::Array,
        NodeKind::Object,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Null => "null",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Boolean => "boolean",
            NodeKind::Array => "array",
            NodeKind::Object => "object",
        }
    }

    /// The tag as three binary digits, e.g. `"011"`.
    pub fn binary_code(self) -> &'static str {
        match self {
            NodeKind::Null => "000",
            NodeKind::Number => "001",
            NodeKind::String => "010",
            NodeKind::Boolean => "011",
            NodeKind::Array => "100",
            NodeKind::Object => "101",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Null,
    Boolean(bool),
    Number(NumberNode),
    String(StringNode),
    Array(ArrayNode),
    Object(ObjectNode),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Null => NodeKind::Null,
            Node::Boolean(_) => NodeKind::Boolean,
            Node::Number(_) => NodeKind::Number,
            Node::String(_) => NodeKind::String,
            Node::Array(_) => NodeKind::Array,
            Node::Object(_) => NodeKind::Object,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn binary_code(&self) -> &'static str {
        self.kind().binary_code()
    }

    pub fn number(value: f64) -> Self {
        Node::Number(NumberNode::new(value))
    }

    pub fn string(text: impl Into<String>) -> Self {
        Node::String(StringNode::new(text))
    }

    pub fn array<I: IntoIterator<Item = Node>>(items: I) -> Self {
        Node::Array(items.into_iter().collect())
    }

    pub fn object<K: Into<String>, I: IntoIterator<Item = (K, Node)>>(properties: I) -> Self {
        Node::Object(properties.into_iter().collect())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => Some(n.value()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayNode> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            Node::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    // ------------------------------ Conversions ------------------------------ //

    pub fn to_ir(&self) -> Result<IrMap> {
        Codec::shared().encode_ir(self)
    }

    pub fn from_ir(ir: &IrMap) -> Result<Self> {
        Codec::shared().decode_ir(ir)
    }

    /// Tag bits followed by the payload bits. Export only: there is no decoder
    /// for the array and object layouts.
    pub fn to_binary(&self) -> Result<Bits> {
        Codec::shared().encode_binary(self)
    }

    /// Boolean from its IR mapping, without going through dispatch.
    pub fn boolean_from_ir(ir: &IrMap) -> Result<Self> {
        match ir.get(KEY_VALUE) {
            Some(IrValue::Bool(b)) => Ok(Node::Boolean(*b)),
            Some(other) => Err(Error::InvalidBooleanValue {
                found: other.kind_name().to_string(),
            }),
            None => Err(Error::MalformedIr { key: KEY_VALUE, expected: "a boolean" }),
        }
    }

    // ------------------------------ JSON literals ----------------------------- //

    /// Build a tree from a plain JSON value. Numbers become `f64`.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Boolean(*b),
            Value::Number(n) => Node::number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Node::string(s.as_str()),
            Value::Array(xs) => Node::array(xs.iter().map(Node::from_json)),
            Value::Object(map) => {
                Node::object(map.iter().map(|(k, v)| (k.as_str(), Node::from_json(v))))
            }
        }
    }

    /// Plain JSON view; non-finite numbers become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Boolean(b) => Value::Bool(*b),
            Node::Number(n) => {
                serde_json::Number::from_f64(n.value()).map_or(Value::Null, Value::Number)
            }
            Node::String(s) => Value::String(s.as_str().to_string()),
            Node::Array(a) => Value::Array(a.iter().map(Node::to_json).collect()),
            Node::Object(o) => {
                Value::Object(o.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Boolean(value)
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::number(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::string(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::string(value)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Array(ArrayNode::new(items))
    }
}

impl From<IndexMap<String, Node>> for Node {
    fn from(properties: IndexMap<String, Node>) -> Self {
        Node::Object(ObjectNode::new(properties))
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_are_a_bijection() {
        for tag in 0u8..8 {
            match NodeKind::from_tag(tag) {
                Some(kind) => assert_eq!(kind.tag(), tag),
                None => assert!(tag > 5),
            }
        }
        for kind in NodeKind::ALL {
            let code = u8::from_str_radix(kind.binary_code(), 2).unwrap();
            assert_eq!(code, kind.tag());
        }
    }

    #[test]
    fn type_names() {
        let names: Vec<&str> = [
            Node::Null,
            Node::from(true),
            Node::from(1.5),
            Node::from("x"),
            Node::array(Vec::new()),
            Node::object(Vec::<(String, Node)>::new()),
        ]
        .iter()
        .map(Node::type_name)
        .collect();
        assert_eq!(names, ["null", "boolean", "number", "string", "array", "object"]);
    }

    #[test]
    fn boolean_from_ir_rejects_text() {
        let ir: IrMap = [("value".to_string(), IrValue::Other(json!("true")))]
            .into_iter()
            .collect();
        assert!(matches!(Node::boolean_from_ir(&ir), Err(Error::InvalidBooleanValue { .. })));
        let ir: IrMap = [("value".to_string(), IrValue::Bool(false))].into_iter().collect();
        assert_eq!(Node::boolean_from_ir(&ir).unwrap(), Node::Boolean(false));
    }

    #[test]
    fn json_literals_keep_order_and_kinds() {
        let value = json!({"z": [1, "two", null, true], "a": {"b": 2.5}});
        let node = Node::from_json(&value);
        let object = node.as_object().unwrap();
        let names: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(names, ["z", "a"]);
        let items = object.get("z").and_then(Node::as_array).unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].as_f64(), Some(1.0));
        assert_eq!(items[1].as_str(), Some("two"));
        assert!(items[2].is_null());
        assert_eq!(items[3].as_bool(), Some(true));
        assert_eq!(node.to_json(), json!({"z": [1.0, "two", null, true], "a": {"b": 2.5}}));
    }
}
