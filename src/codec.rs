//! Tree conversions: node ⇄ IR, and node → binary.
//!
//! None of the walks recurse. IR conversion drives a stack of container frames
//! through [`walk`]; binary export drains a worklist of pending emissions. Tree
//! depth is therefore bounded by memory rather than by the thread's stack, and
//! IR decoding additionally stops at [`Options::max_depth`].

use std::fmt;
use std::slice;

use indexmap::IndexMap;
use log::{debug, trace, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::bits::{self, Bits};
use crate::compress::{Compressor, Lz4Frame};
use crate::error::{Error, Result};
use crate::ir::{self, IrMap, IrValue, KEY_ITEMS, KEY_PROPERTIES, KEY_VALUE};
use crate::node::object::{self, NameDictionary};
use crate::node::{ArrayNode, Node, NodeKind, NumberNode, ObjectNode, StringNode};
use crate::path_de;

// ------------------------------- Options ---------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Deepest container nesting accepted when decoding IR. The outermost
    /// container is depth 1.
    pub max_depth: usize,
    /// Add an LZ4 content checksum to compressed string payloads.
    pub content_checksum: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: 1024,
            content_checksum: false,
        }
    }
}

impl Options {
    pub fn from_json_str(src: &str) -> Result<Self> {
        path_de::from_str_with_path(src)
    }
}

// -------------------------------- Codec ----------------------------------- //

pub struct Codec {
    options: Options,
    compressor: Box<dyn Compressor>,
}

static SHARED: Lazy<Codec> = Lazy::new(Codec::default);

impl Codec {
    pub fn new(options: Options) -> Self {
        let compressor = Lz4Frame::new().with_content_checksum(options.content_checksum);
        Self::with_compressor(options, compressor)
    }

    pub fn with_compressor(options: Options, compressor: impl Compressor + 'static) -> Self {
        Self {
            options,
            compressor: Box::new(compressor),
        }
    }

    /// Process-wide codec with default options.
    pub fn shared() -> &'static Codec {
        &SHARED
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn compressor(&self) -> &dyn Compressor {
        self.compressor.as_ref()
    }

    pub fn encode_ir(&self, node: &Node) -> Result<IrMap> {
        let root = self.enter_encode(node)?;
        walk(root, |child, _depth| self.enter_encode(child))
    }

    pub fn decode_ir(&self, ir: &IrMap) -> Result<Node> {
        let root = self.enter_decode(ir, 1)?;
        walk(root, |child, depth| self.enter_decode(child, depth))
    }

    /// Tag and payload bits for the whole tree.
    pub fn encode_binary(&self, node: &Node) -> Result<Bits> {
        let mut out = Bits::new();
        let mut work = vec![Emit::Node(node)];

        while let Some(item) = work.pop() {
            let node = match item {
                Emit::NameIndex(index) => {
                    object::write_name_index(&mut out, index)?;
                    continue;
                }
                Emit::Node(node) => node,
            };

            bits::push_tag(&mut out, node.kind());
            match node {
                Node::Null => {}
                Node::Boolean(value) => out.push(*value),
                Node::Number(number) => number.write_binary(&mut out)?,
                Node::String(string) => string.write_binary(&mut out, self.compressor())?,
                Node::Array(array) => work.extend(array.iter().rev().map(Emit::Node)),
                Node::Object(object) => {
                    let mut dictionary = NameDictionary::new();
                    let mut entries = Vec::with_capacity(object.len());
                    for (name, child) in object {
                        entries.push((dictionary.intern(name)?, child));
                    }
                    debug!("object name dictionary holds {} names", dictionary.len());

                    // interning caps the count well below u32::MAX
                    bits::push_u32(&mut out, entries.len() as u32);
                    for (index, child) in entries.into_iter().rev() {
                        work.push(Emit::Node(child));
                        work.push(Emit::NameIndex(index));
                    }
                }
            }
        }

        Ok(out)
    }

    fn enter_encode<'a>(&self, node: &'a Node) -> Result<Step<IrMap, EncodeFrame<'a>>> {
        let leaf = match node {
            Node::Null => IrMap::new(),
            Node::Boolean(value) => {
                let mut ir = IrMap::with_capacity(1);
                ir.insert(KEY_VALUE.to_string(), IrValue::Bool(*value));
                ir
            }
            Node::Number(number) => number.to_ir()?,
            Node::String(string) => string.to_ir(self.compressor())?,
            Node::Array(array) => {
                return Ok(Step::Container(EncodeFrame::Array {
                    items: array.items().iter(),
                    out: Vec::with_capacity(array.len()),
                }));
            }
            Node::Object(object) => {
                return Ok(Step::Container(EncodeFrame::Object {
                    properties: object.iter(),
                    name: None,
                    out: IrMap::with_capacity(object.len()),
                }));
            }
        };
        Ok(Step::Leaf(leaf))
    }

    fn enter_decode<'a>(&self, ir: &'a IrMap, depth: usize) -> Result<Step<Node, DecodeFrame<'a>>> {
        let kind = ir::classify(ir)?;
        trace!("IR mapping at depth {depth} dispatched as {}", kind.name());

        let leaf = match kind {
            NodeKind::Null => Node::Null,
            NodeKind::Boolean => Node::boolean_from_ir(ir)?,
            NodeKind::Number => Node::Number(NumberNode::from_ir(ir)?),
            NodeKind::String => Node::String(StringNode::from_ir(ir, self.compressor())?),
            NodeKind::Array => {
                self.check_depth(depth)?;
                let items = ir::get_list(ir, KEY_ITEMS)?;
                return Ok(Step::Container(DecodeFrame::Array {
                    items: items.iter(),
                    out: Vec::with_capacity(items.len()),
                }));
            }
            NodeKind::Object => {
                self.check_depth(depth)?;
                let properties = ir::get_map(ir, KEY_PROPERTIES)?;
                return Ok(Step::Container(DecodeFrame::Object {
                    properties: properties.iter(),
                    name: None,
                    out: IndexMap::with_capacity(properties.len()),
                }));
            }
        };
        Ok(Step::Leaf(leaf))
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        let limit = self.options.max_depth;
        if depth > limit {
            warn!("rejecting IR nested deeper than {limit} containers");
            return Err(Error::NestingTooDeep { limit });
        }
        Ok(())
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

// ------------------------------- Traversal -------------------------------- //

enum Step<T, F> {
    Leaf(T),
    Container(F),
}

/// An open container: yields children, collects their finished values.
trait Frame: Sized {
    type Child;
    type Output;

    fn next_child(&mut self) -> Result<Option<Self::Child>>;
    fn accept(&mut self, value: Self::Output);
    fn finish(self) -> Self::Output;
}

/// Depth-first build over an explicit frame stack. `enter` gets each child
/// together with the depth it would have as a container.
fn walk<F, E>(root: Step<F::Output, F>, mut enter: E) -> Result<F::Output>
where
    F: Frame,
    E: FnMut(F::Child, usize) -> Result<Step<F::Output, F>>,
{
    let mut root = match root {
        Step::Leaf(value) => return Ok(value),
        Step::Container(frame) => frame,
    };
    let mut stack: Vec<F> = Vec::new();

    loop {
        let depth = stack.len() + 2;
        let top = stack.last_mut().unwrap_or(&mut root);
        match top.next_child()? {
            Some(child) => match enter(child, depth)? {
                Step::Leaf(value) => top.accept(value),
                Step::Container(frame) => stack.push(frame),
            },
            None => match stack.pop() {
                Some(done) => {
                    let value = done.finish();
                    stack.last_mut().unwrap_or(&mut root).accept(value);
                }
                None => return Ok(root.finish()),
            },
        }
    }
}

enum EncodeFrame<'a> {
    Array {
        items: slice::Iter<'a, Node>,
        out: Vec<IrValue>,
    },
    Object {
        properties: indexmap::map::Iter<'a, String, Node>,
        name: Option<&'a str>,
        out: IrMap,
    },
}

impl<'a> Frame for EncodeFrame<'a> {
    type Child = &'a Node;
    type Output = IrMap;

    fn next_child(&mut self) -> Result<Option<&'a Node>> {
        Ok(match self {
            EncodeFrame::Array { items, .. } => items.next(),
            EncodeFrame::Object { properties, name, .. } => properties.next().map(|(key, child)| {
                *name = Some(key.as_str());
                child
            }),
        })
    }

    fn accept(&mut self, value: IrMap) {
        match self {
            EncodeFrame::Array { out, .. } => out.push(IrValue::Map(value)),
            EncodeFrame::Object { name, out, .. } => {
                if let Some(key) = name.take() {
                    out.insert(key.to_string(), IrValue::Map(value));
                }
            }
        }
    }

    fn finish(self) -> IrMap {
        let (key, value) = match self {
            EncodeFrame::Array { out, .. } => (KEY_ITEMS, IrValue::List(out)),
            EncodeFrame::Object { out, .. } => (KEY_PROPERTIES, IrValue::Map(out)),
        };
        let mut ir = IrMap::with_capacity(1);
        ir.insert(key.to_string(), value);
        ir
    }
}

enum DecodeFrame<'a> {
    Array {
        items: slice::Iter<'a, IrValue>,
        out: Vec<Node>,
    },
    Object {
        properties: indexmap::map::Iter<'a, String, IrValue>,
        name: Option<&'a str>,
        out: IndexMap<String, Node>,
    },
}

impl<'a> Frame for DecodeFrame<'a> {
    type Child = &'a IrMap;
    type Output = Node;

    fn next_child(&mut self) -> Result<Option<&'a IrMap>> {
        match self {
            DecodeFrame::Array { items, .. } => match items.next() {
                None => Ok(None),
                Some(IrValue::Map(child)) => Ok(Some(child)),
                Some(_) => Err(Error::MalformedIr {
                    key: KEY_ITEMS,
                    expected: "a list of IR mappings",
                }),
            },
            DecodeFrame::Object { properties, name, .. } => match properties.next() {
                None => Ok(None),
                Some((key, IrValue::Map(child))) => {
                    *name = Some(key.as_str());
                    Ok(Some(child))
                }
                Some(_) => Err(Error::MalformedIr {
                    key: KEY_PROPERTIES,
                    expected: "a mapping of IR mappings",
                }),
            },
        }
    }

    fn accept(&mut self, value: Node) {
        match self {
            DecodeFrame::Array { out, .. } => out.push(value),
            DecodeFrame::Object { name, out, .. } => {
                if let Some(key) = name.take() {
                    out.insert(key.to_string(), value);
                }
            }
        }
    }

    fn finish(self) -> Node {
        match self {
            DecodeFrame::Array { out, .. } => Node::Array(ArrayNode::new(out)),
            DecodeFrame::Object { out, .. } => Node::Object(ObjectNode::new(out)),
        }
    }
}

enum Emit<'a> {
    Node(&'a Node),
    NameIndex(usize),
}

// ------------------------------- Tests ------------------------------------ //
