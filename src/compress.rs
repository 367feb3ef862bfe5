//! General-purpose byte compression for non-UUID strings.
//!
//! The codec only needs an opaque compress/decompress pair. Decompression must
//! reject input it did not produce; the string decoder relies on that to tell a
//! compressed payload from a UUID payload.

use std::io::{self, Read, Write};

use lz4_flex::frame::{FrameDecoder, FrameEncoder, FrameInfo};

pub trait Compressor: Send + Sync {
    fn compress(&self, input: &[u8]) -> io::Result<Vec<u8>>;

    /// Fails when `input` is not a well-formed compressed stream.
    fn decompress(&self, input: &[u8]) -> io::Result<Vec<u8>>;
}

/// LZ4 frame format (magic number, frame descriptor, blocks, end mark).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lz4Frame {
    content_checksum: bool,
}

impl Lz4Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an xxhash32 checksum of the uncompressed content to every frame.
    pub fn with_content_checksum(mut self, enabled: bool) -> Self {
        self.content_checksum = enabled;
        self
    }
}

impl Compressor for Lz4Frame {
    fn compress(&self, input: &[u8]) -> io::Result<Vec<u8>> {
        let info = FrameInfo::new().content_checksum(self.content_checksum);
        let sink = Vec::with_capacity(input.len() / 2 + 16);
        let mut encoder = FrameEncoder::with_frame_info(info, sink);
        encoder.write_all(input)?;
        encoder.finish().map_err(io::Error::other)
    }

    fn decompress(&self, input: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        FrameDecoder::new(input).read_to_end(&mut out)?;
        Ok(out)
    }
}
