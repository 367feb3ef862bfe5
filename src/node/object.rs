//! Objects and the property-name dictionary used by their binary form.
//!
//! Binary layout: tag, property count as a big-endian `u32`, then per property
//! in the object's own order a name index followed by the child encoding.
//! Names are numbered per object from 0 in first-occurrence order. Indices up
//! to 127 take one byte; larger ones take two, `0x80 + (i - 128) / 128` then
//! `(i - 128) % 128`, which tops out at [`MAX_NAME_INDEX`].

use indexmap::{IndexMap, IndexSet};

use super::Node;
use crate::bits::{self, Bits};
use crate::error::{Error, Result};

/// Largest index the two-byte form can carry: `0xFF` then `0x7F`.
pub const MAX_NAME_INDEX: usize = 128 + 128 * 128 - 1;

const ONE_BYTE_LIMIT: usize = 0x80;

/// Named children in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectNode {
    properties: IndexMap<String, Node>,
}

impl ObjectNode {
    pub fn new(properties: IndexMap<String, Node>) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &IndexMap<String, Node> {
        &self.properties
    }

    pub fn into_properties(self) -> IndexMap<String, Node> {
        self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.properties.get(name)
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Node> {
        self.properties.keys()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Node> {
        self.properties.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for ObjectNode {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<'a> IntoIterator for &'a ObjectNode {
    type Item = (&'a String, &'a Node);
    type IntoIter = indexmap::map::Iter<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

// ---------------------------- Name dictionary ----------------------------- //

/// Per-object name numbering, first occurrence wins.
#[derive(Debug, Default)]
pub struct NameDictionary<'a> {
    names: IndexSet<&'a str>,
}

impl<'a> NameDictionary<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, assigning the next one if it is new.
    pub fn intern(&mut self, name: &'a str) -> Result<usize> {
        if let Some(index) = self.names.get_index_of(name) {
            return Ok(index);
        }
        let index = self.names.len();
        if index > MAX_NAME_INDEX {
            return Err(Error::IndexOutOfRange { index });
        }
        self.names.insert(name);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.names.iter().copied()
    }
}

pub fn write_name_index(out: &mut Bits, index: usize) -> Result<()> {
    match index {
        0..ONE_BYTE_LIMIT => bits::push_bytes(out, &[index as u8]),
        ONE_BYTE_LIMIT..=MAX_NAME_INDEX => {
            let rest = index - ONE_BYTE_LIMIT;
            let high = 0x80 + (rest / ONE_BYTE_LIMIT) as u8;
            let low = (rest % ONE_BYTE_LIMIT) as u8;
            bits::push_bytes(out, &[high, low]);
        }
        _ => return Err(Error::IndexOutOfRange { index }),
    }
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //
