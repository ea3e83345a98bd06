//! DEFLATE block headers and block bodies.

use tracing::trace;

use super::bit_reader::BitReader;
use super::huffman::{Alphabet, HuffmanTable};
use super::output::OutputBuffer;
use crate::error::{Error, Result};

/// Length code base values (codes 257-285).
const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Extra bits for length codes.
const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Distance code base values (codes 0-29).
const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits for distance codes.
const DISTANCE_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Order in which code-length code lengths are transmitted.
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// End-of-block literal/length symbol.
pub const END_OF_BLOCK: u16 = 256;

/// Largest HLIT that can describe only meaningful symbols (0..=285).
const MAX_LITERAL_CODES: usize = 286;

/// Largest HDIST that can describe only meaningful symbols (0..=29).
const MAX_DISTANCE_CODES: usize = 30;

/// Compression method of a block (BTYPE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// BTYPE 0: raw bytes.
    Stored,
    /// BTYPE 1: fixed Huffman codes.
    Fixed,
    /// BTYPE 2: Huffman codes sent in the block header.
    Dynamic,
}

/// The three header bits every block starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// BFINAL: this is the last block of the stream.
    pub is_final: bool,
    /// BTYPE.
    pub kind: BlockKind,
}

impl BlockHeader {
    /// Read BFINAL and BTYPE.
    pub fn read(reader: &mut BitReader) -> Result<Self> {
        let is_final = reader.read_bits(1)? == 1;
        let kind = match reader.read_bits(2)? {
            0 => BlockKind::Stored,
            1 => BlockKind::Fixed,
            2 => BlockKind::Dynamic,
            _ => return Err(Error::ReservedBlockType),
        };
        Ok(Self { is_final, kind })
    }
}

/// Code counts at the start of a dynamic block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicFormat {
    /// Number of literal/length code lengths (257-286).
    pub hlit: usize,
    /// Number of distance code lengths (1-30).
    pub hdist: usize,
    /// Number of code-length code lengths (4-19).
    pub hclen: usize,
}

impl DynamicFormat {
    /// Read HLIT, HDIST and HCLEN.
    pub fn read(reader: &mut BitReader) -> Result<Self> {
        let hlit = reader.read_bits(5)? as usize + 257;
        let hdist = reader.read_bits(5)? as usize + 1;
        let hclen = reader.read_bits(4)? as usize + 4;

        if hlit > MAX_LITERAL_CODES || hdist > MAX_DISTANCE_CODES {
            return Err(Error::InvalidHuffmanTable("too many length or distance codes"));
        }

        Ok(Self { hlit, hdist, hclen })
    }
}

/// Decode the code-length alphabet and then the literal/length and distance
/// tables of a dynamic block.
pub fn read_dynamic_tables(
    reader: &mut BitReader,
    format: &DynamicFormat,
) -> Result<(HuffmanTable, HuffmanTable)> {
    let mut cl_lengths = [0u8; 19];
    for &slot in CODE_LENGTH_ORDER.iter().take(format.hclen) {
        cl_lengths[slot] = reader.read_bits(3)? as u8;
    }
    let cl_table = HuffmanTable::from_lengths(&cl_lengths, Alphabet::CodeLength)?;

    let total = format.hlit + format.hdist;
    let mut lengths = vec![0u8; total];
    let mut i = 0;
    while i < total {
        let symbol = cl_table.decode(reader)?;
        let (value, repeat) = match symbol {
            0..=15 => (symbol as u8, 1),
            16 => {
                let prev = *i
                    .checked_sub(1)
                    .and_then(|p| lengths.get(p))
                    .ok_or(Error::InvalidRepeatCode)?;
                (prev, reader.read_bits(2)? as usize + 3)
            }
            17 => (0, reader.read_bits(3)? as usize + 3),
            18 => (0, reader.read_bits(7)? as usize + 11),
            _ => return Err(Error::InvalidHuffmanCode),
        };

        if i + repeat > total {
            return Err(Error::InvalidHuffmanTable("code length run overflows table"));
        }
        lengths[i..i + repeat].fill(value);
        i += repeat;
    }

    if lengths[END_OF_BLOCK as usize] == 0 {
        return Err(Error::InvalidHuffmanTable("missing end-of-block code"));
    }

    let lit_table = HuffmanTable::from_lengths(&lengths[..format.hlit], Alphabet::LiteralLength)?;
    let dist_table = HuffmanTable::from_lengths(&lengths[format.hlit..], Alphabet::Distance)?;

    trace!(
        literal_codes = lit_table.used_symbols(),
        distance_codes = dist_table.used_symbols(),
        "built dynamic tables"
    );

    Ok((lit_table, dist_table))
}

/// Copy a stored block's payload to the output.
pub fn inflate_stored(reader: &mut BitReader, output: &mut OutputBuffer) -> Result<()> {
    reader.align_to_byte();

    let len = reader.read_u16_le()?;
    let nlen = reader.read_u16_le()?;
    if len != !nlen {
        return Err(Error::ChecksumMismatch { len, nlen });
    }

    let payload = reader.read_aligned_bytes(len as usize)?;
    output.extend_from_slice(payload)
}

/// Expand literal/length/distance tokens until end-of-block.
pub fn inflate_codes(
    reader: &mut BitReader,
    output: &mut OutputBuffer,
    lit_table: &HuffmanTable,
    dist_table: &HuffmanTable,
) -> Result<()> {
    loop {
        let symbol = lit_table.decode(reader)?;

        match symbol {
            0..=255 => output.push(symbol as u8)?,
            END_OF_BLOCK => return Ok(()),
            257..=285 => {
                let len_idx = (symbol - 257) as usize;
                let length = LENGTH_BASE[len_idx] as usize
                    + reader.read_bits(LENGTH_EXTRA[len_idx])? as usize;

                let dist_symbol = dist_table.decode(reader)?;
                let dist_idx = dist_symbol as usize;
                if dist_idx >= DISTANCE_BASE.len() {
                    return Err(Error::InvalidLengthOrDistanceCode(dist_symbol));
                }
                let distance = DISTANCE_BASE[dist_idx] as usize
                    + reader.read_bits(DISTANCE_EXTRA[dist_idx])? as usize;

                output.copy_match(distance, length)?;
            }
            _ => return Err(Error::InvalidLengthOrDistanceCode(symbol)),
        }
    }
}
