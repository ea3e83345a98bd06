//! Canonical Huffman tables (RFC 1951 §3.2.2) and symbol decoding.
//!
//! A table is fully described by one code length per symbol. Codes are
//! assigned canonically: shorter codes first, and within one length in
//! ascending symbol order. Decoding walks the code one bit at a time and
//! compares it against the first canonical code of each length.

use std::sync::LazyLock;

use super::bit_reader::BitReader;
use crate::error::{Error, Result};

/// Maximum code length for DEFLATE Huffman codes.
pub const MAX_CODE_LENGTH: u8 = 15;

/// The three alphabets a DEFLATE stream carries Huffman codes for.
///
/// The alphabet decides how many symbols a table may have and whether an
/// incomplete code is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// The 19-symbol code-length alphabet of dynamic block headers.
    CodeLength,
    /// Literal bytes, end-of-block and length codes (up to 288 symbols).
    LiteralLength,
    /// Distance codes (up to 32 symbols).
    Distance,
}

impl Alphabet {
    /// Largest number of code lengths a table for this alphabet may have.
    pub const fn max_symbols(self) -> usize {
        match self {
            Alphabet::CodeLength => 19,
            Alphabet::LiteralLength => 288,
            Alphabet::Distance => 32,
        }
    }
}

/// Huffman decoding table built from per-symbol code lengths.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    /// Code length per symbol, 0 for unused symbols.
    lengths: Vec<u8>,
    /// Canonical code per symbol (meaningless where the length is 0).
    codes: Vec<u16>,
    /// Number of codes of each length; index 0 is unused.
    counts: [u16; 16],
    /// Used symbols ordered by (code length, symbol).
    symbols: Vec<u16>,
    max_len: u8,
}

impl HuffmanTable {
    /// Build and validate a table for `alphabet` from code lengths.
    ///
    /// Over-subscribed lengths are always rejected. Incomplete codes are only
    /// accepted for the distance alphabet with at most one used symbol, which
    /// is how encoders describe blocks with a single distance (or none).
    pub fn from_lengths(lengths: &[u8], alphabet: Alphabet) -> Result<Self> {
        if lengths.len() > alphabet.max_symbols() {
            return Err(Error::InvalidHuffmanTable("too many code lengths"));
        }
        if lengths.iter().any(|&len| len > MAX_CODE_LENGTH) {
            return Err(Error::InvalidHuffmanTable("code length exceeds 15 bits"));
        }

        let counts = count_lengths(lengths);

        // Kraft budget: codes still available at the current length.
        let mut left: i32 = 1;
        for &count in &counts[1..] {
            left = (left << 1) - count as i32;
            if left < 0 {
                return Err(Error::InvalidHuffmanTable("over-subscribed code lengths"));
            }
        }

        if left > 0 {
            let used: u32 = counts[1..].iter().map(|&c| c as u32).sum();
            if !(alphabet == Alphabet::Distance && used <= 1) {
                return Err(Error::InvalidHuffmanTable("incomplete code lengths"));
            }
        }

        Ok(Self::canonical(lengths))
    }

    /// Assign canonical codes without validation.
    ///
    /// Callers guarantee every length is at most 15.
    fn canonical(lengths: &[u8]) -> Self {
        let counts = count_lengths(lengths);

        let mut next_code = [0u16; 16];
        let mut code = 0u16;
        for len in 1..=MAX_CODE_LENGTH as usize {
            code = (code + counts[len - 1]) << 1;
            next_code[len] = code;
        }

        let mut codes = vec![0u16; lengths.len()];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len > 0 {
                codes[symbol] = next_code[len as usize];
                next_code[len as usize] += 1;
            }
        }

        // Where each length's run starts inside `symbols`.
        let mut offsets = [0usize; 16];
        for len in 1..15 {
            offsets[len + 1] = offsets[len] + counts[len] as usize;
        }
        let used = offsets[15] + counts[15] as usize;
        let mut symbols = vec![0u16; used];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len > 0 {
                symbols[offsets[len as usize]] = symbol as u16;
                offsets[len as usize] += 1;
            }
        }

        let max_len = lengths.iter().copied().max().unwrap_or(0);

        Self {
            lengths: lengths.to_vec(),
            codes,
            counts,
            symbols,
            max_len,
        }
    }

    /// Decode one symbol, reading the code MSB-first one bit at a time.
    pub fn decode(&self, reader: &mut BitReader) -> Result<u16> {
        if self.symbols.is_empty() {
            return Err(Error::InvalidHuffmanCode);
        }

        let mut code: u32 = 0;
        // First canonical code of the current length, and the index of its
        // symbol in `symbols`.
        let mut first: u32 = 0;
        let mut index: u32 = 0;

        for len in 1..=self.max_len as usize {
            code |= reader.read_bit()?;
            let count = self.counts[len] as u32;
            if code < first + count {
                return Ok(self.symbols[(index + code - first) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }

        Err(Error::InvalidHuffmanCode)
    }

    /// The canonical `(code, length)` assigned to `symbol`, if it is used.
    pub fn code(&self, symbol: usize) -> Option<(u16, u8)> {
        match self.lengths.get(symbol) {
            Some(&len) if len > 0 => Some((self.codes[symbol], len)),
            _ => None,
        }
    }

    /// Code length per symbol.
    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    /// Number of symbols with a non-zero code length.
    pub fn used_symbols(&self) -> usize {
        self.symbols.len()
    }

    /// Longest code length in the table.
    pub fn max_len(&self) -> u8 {
        self.max_len
    }
}

fn count_lengths(lengths: &[u8]) -> [u16; 16] {
    let mut counts = [0u16; 16];
    for &len in lengths {
        if len > 0 {
            counts[len as usize] += 1;
        }
    }
    counts
}

/// Fixed literal/length code lengths (RFC 1951 §3.2.6).
pub const FIXED_LITERAL_LENGTHS: [u8; 288] = fixed_literal_lengths();

/// Fixed distance code lengths: all 32 symbols use 5 bits.
pub const FIXED_DISTANCE_LENGTHS: [u8; 32] = [5; 32];

const fn fixed_literal_lengths() -> [u8; 288] {
    let mut lengths = [0u8; 288];
    let mut symbol = 0;
    while symbol < 288 {
        lengths[symbol] = match symbol {
            0..=143 => 8,
            144..=255 => 9,
            256..=279 => 7,
            _ => 8,
        };
        symbol += 1;
    }
    lengths
}

/// The fixed-Huffman table pair shared by every fixed block.
#[derive(Debug)]
pub struct FixedTables {
    /// Literal/length table.
    pub literal: HuffmanTable,
    /// Distance table.
    pub distance: HuffmanTable,
}

static FIXED_TABLES: LazyLock<FixedTables> = LazyLock::new(|| FixedTables {
    literal: HuffmanTable::canonical(&FIXED_LITERAL_LENGTHS),
    distance: HuffmanTable::canonical(&FIXED_DISTANCE_LENGTHS),
});

/// Borrow the fixed tables, building them on first use.
pub fn fixed_tables() -> &'static FixedTables {
    &FIXED_TABLES
}
