//! PNG chunk framing.

use tracing::trace;

use crate::checksum::Crc32;
use crate::error::{Error, Result};

/// The 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Largest chunk length the format allows (2^31 - 1).
const MAX_CHUNK_LEN: usize = 0x7FFF_FFFF;

/// One chunk, borrowed from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Four-letter chunk type.
    pub kind: [u8; 4],
    /// Chunk payload.
    pub data: &'a [u8],
}

impl Chunk<'_> {
    /// Chunk type as text, for diagnostics.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }

    /// Critical chunks have an uppercase first letter.
    pub fn is_critical(&self) -> bool {
        self.kind[0].is_ascii_uppercase()
    }
}

/// Iterator over the chunks following the PNG signature.
///
/// Yields an error and then stops on truncation or a CRC mismatch.
pub struct ChunkReader<'a> {
    data: &'a [u8],
    pos: usize,
    verify_crc: bool,
    failed: bool,
}

impl<'a> ChunkReader<'a> {
    /// Check the signature and position the reader at the first chunk.
    pub fn new(data: &'a [u8], verify_crc: bool) -> Result<Self> {
        if data.len() < PNG_SIGNATURE.len() || data[..8] != PNG_SIGNATURE {
            return Err(Error::MalformedContainer("invalid PNG signature".into()));
        }
        Ok(Self {
            data,
            pos: PNG_SIGNATURE.len(),
            verify_crc,
            failed: false,
        })
    }

    /// Byte offset of the next chunk.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn read_chunk(&mut self) -> Result<Chunk<'a>> {
        let rest = &self.data[self.pos..];
        if rest.len() < 12 {
            return Err(Error::MalformedContainer(format!(
                "truncated chunk at offset {}",
                self.pos
            )));
        }

        let length = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        if length > MAX_CHUNK_LEN {
            return Err(Error::MalformedContainer(format!(
                "chunk length {length} too large"
            )));
        }
        let kind = [rest[4], rest[5], rest[6], rest[7]];

        if rest.len() - 12 < length {
            return Err(Error::MalformedContainer(format!(
                "truncated {} chunk",
                String::from_utf8_lossy(&kind)
            )));
        }
        let data = &rest[8..8 + length];
        let crc_bytes = &rest[8 + length..12 + length];
        let stored_crc =
            u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);

        let chunk = Chunk { kind, data };
        if self.verify_crc {
            let mut crc = Crc32::new();
            crc.update(&kind);
            crc.update(data);
            if crc.finalize() != stored_crc {
                return Err(Error::MalformedContainer(format!(
                    "CRC mismatch in {} chunk",
                    chunk.name()
                )));
            }
        }

        trace!(kind = %chunk.name(), length, offset = self.pos, "chunk");
        self.pos += 12 + length;
        Ok(chunk)
    }
}

impl<'a> Iterator for ChunkReader<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None;
        }
        let result = self.read_chunk();
        self.failed = result.is_err();
        Some(result)
    }
}
