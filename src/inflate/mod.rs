//! DEFLATE decompression (RFC 1951).
//!
//! An [`Inflater`] is one decode session: it owns the bit cursor over the
//! compressed input and the output buffer, and walks the block sequence until
//! a block with BFINAL set has been decoded.
//!
//! ```rust
//! use pnginflate::inflate::inflate;
//!
//! // A single stored block holding "hi".
//! let stream = [0x01, 0x02, 0x00, 0xFD, 0xFF, b'h', b'i'];
//! assert_eq!(inflate(&stream).unwrap(), b"hi");
//! ```

pub mod bit_reader;
pub mod block;
pub mod huffman;
pub mod output;

use tracing::debug;

use crate::error::Result;
use bit_reader::BitReader;
use block::{BlockHeader, BlockKind, DynamicFormat};
use huffman::fixed_tables;
use output::OutputBuffer;

/// DEFLATE expands its input by at most about 1032:1.
const MAX_EXPANSION: usize = 1032;

/// Ceiling on the output reserved before any block is decoded.
const MAX_INITIAL_CAPACITY: usize = 64 << 20;

/// Options for a decode session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InflateOptions {
    /// Expected decompressed size, used only to pre-size the output buffer.
    /// The reservation is clamped by the input length, so an untrusted hint
    /// cannot force a huge allocation.
    pub size_hint: Option<usize>,
    /// Hard cap on decompressed size; exceeding it aborts the decode.
    pub max_output: Option<usize>,
    /// Verify the zlib Adler-32 trailer (ignored for raw DEFLATE).
    pub verify_checksum: bool,
}

impl Default for InflateOptions {
    fn default() -> Self {
        Self {
            size_hint: None,
            max_output: None,
            verify_checksum: true,
        }
    }
}

impl InflateOptions {
    /// Pre-size the output buffer for `size` bytes.
    pub fn with_size_hint(mut self, size: usize) -> Self {
        self.size_hint = Some(size);
        self
    }

    /// Fail once decoded output would exceed `limit` bytes.
    pub fn with_max_output(mut self, limit: usize) -> Self {
        self.max_output = Some(limit);
        self
    }

    /// Enable or disable the Adler-32 trailer check.
    pub fn with_verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }
}

/// Where the session is in the block sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// The next bits are a block header.
    AwaitingBlockHeader,
    /// A final block has been decoded; no further input is read.
    Done,
}

/// Per-session block counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InflateStats {
    /// Stored blocks decoded.
    pub stored_blocks: usize,
    /// Fixed-Huffman blocks decoded.
    pub fixed_blocks: usize,
    /// Dynamic-Huffman blocks decoded.
    pub dynamic_blocks: usize,
}

impl InflateStats {
    /// Total blocks decoded.
    pub fn blocks(&self) -> usize {
        self.stored_blocks + self.fixed_blocks + self.dynamic_blocks
    }
}

/// Result of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inflated {
    /// Decompressed bytes.
    pub data: Vec<u8>,
    /// Input bytes used by the DEFLATE stream, rounded up to a whole byte.
    pub consumed: usize,
    /// Block counts.
    pub stats: InflateStats,
}

/// A single DEFLATE decode session.
pub struct Inflater<'a> {
    reader: BitReader<'a>,
    output: OutputBuffer,
    state: DecoderState,
    stats: InflateStats,
}

impl<'a> Inflater<'a> {
    /// Start a session over a raw DEFLATE stream.
    pub fn new(input: &'a [u8], options: &InflateOptions) -> Self {
        let capacity = options
            .size_hint
            .unwrap_or_else(|| input.len().saturating_mul(4))
            .min(input.len().saturating_mul(MAX_EXPANSION))
            .min(MAX_INITIAL_CAPACITY);
        Self {
            reader: BitReader::new(input),
            output: OutputBuffer::new(capacity, options.max_output),
            state: DecoderState::AwaitingBlockHeader,
            stats: InflateStats::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Bytes decoded so far.
    pub fn output(&self) -> &[u8] {
        self.output.as_slice()
    }

    /// Decode exactly one block.
    ///
    /// Once the session is [`DecoderState::Done`] this returns `Done` without
    /// reading any input.
    pub fn step(&mut self) -> Result<DecoderState> {
        if self.state == DecoderState::Done {
            return Ok(DecoderState::Done);
        }

        let header = BlockHeader::read(&mut self.reader)?;
        debug!(
            kind = ?header.kind,
            is_final = header.is_final,
            offset = self.reader.byte_position(),
            "block header"
        );

        match header.kind {
            BlockKind::Stored => {
                block::inflate_stored(&mut self.reader, &mut self.output)?;
                self.stats.stored_blocks += 1;
            }
            BlockKind::Fixed => {
                let tables = fixed_tables();
                block::inflate_codes(
                    &mut self.reader,
                    &mut self.output,
                    &tables.literal,
                    &tables.distance,
                )?;
                self.stats.fixed_blocks += 1;
            }
            BlockKind::Dynamic => {
                let format = DynamicFormat::read(&mut self.reader)?;
                let (lit_table, dist_table) =
                    block::read_dynamic_tables(&mut self.reader, &format)?;
                block::inflate_codes(&mut self.reader, &mut self.output, &lit_table, &dist_table)?;
                self.stats.dynamic_blocks += 1;
            }
        }

        if header.is_final {
            self.state = DecoderState::Done;
        }
        Ok(self.state)
    }

    /// Decode the remaining blocks and return the output.
    pub fn finish(mut self) -> Result<Inflated> {
        while self.step()? != DecoderState::Done {}

        self.reader.align_to_byte();
        debug!(
            output_len = self.output.len(),
            consumed = self.reader.byte_position(),
            blocks = self.stats.blocks(),
            "inflate complete"
        );

        Ok(Inflated {
            consumed: self.reader.byte_position(),
            stats: self.stats,
            data: self.output.into_vec(),
        })
    }
}

/// Inflate a raw DEFLATE stream.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    inflate_with_options(data, &InflateOptions::default())
}

/// Inflate a raw DEFLATE stream with explicit options.
pub fn inflate_with_options(data: &[u8], options: &InflateOptions) -> Result<Vec<u8>> {
    Inflater::new(data, options).finish().map(|inflated| inflated.data)
}
