//! SJSON document codec.
//!
//! A document is a tree of [`Node`]s. Each tree converts to an untyped
//! intermediate mapping ([`IrMap`]) that round-trips losslessly, and exports to
//! a compact bit-level binary form:
//!
//! - numbers as Binary-Coded Decimal nybbles
//! - UUID-shaped strings as 130 bits, other strings LZ4-compressed
//! - object property names as per-object dictionary indices
//!
//! ```
//! use sjson_codec::{Node, ir};
//!
//! let doc = Node::object([("id", Node::from("12345678-1234-a2f7-1234-123456789012"))]);
//! let ir = doc.to_ir()?;
//! println!("{}", ir::json::to_json_string(&ir));
//! assert_eq!(Node::from_ir(&ir)?, doc);
//! # Ok::<(), sjson_codec::Error>(())
//! ```
pub mod bits;
pub mod codec;
pub mod compress;
pub mod error;
pub mod ir;
pub mod node;
pub mod path_de;

pub use bits::Bits;
pub use codec::{Codec, Options};
pub use compress::{Compressor, Lz4Frame};
pub use error::{Error, Result};
pub use ir::{IrMap, IrValue};
pub use node::{ArrayNode, Node, NodeKind, NumberNode, ObjectNode, StringNode};
