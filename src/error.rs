//! Error types for the pnginflate library.

use thiserror::Error;

/// Result type alias for pnginflate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding a PNG or a zlib/DEFLATE stream.
///
/// Every variant is terminal for the decode that produced it: partial output
/// is discarded and nothing is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Bad PNG signature, chunk framing, chunk CRC or chunk ordering.
    #[error("Malformed PNG container: {0}")]
    MalformedContainer(String),

    /// The zlib header asks for something this decoder does not implement.
    #[error("Unsupported zlib feature: {0}")]
    UnsupportedZlibFeature(String),

    /// The zlib header is structurally invalid (bad FCHECK, truncated).
    #[error("Invalid zlib header: {0}")]
    InvalidZlibHeader(String),

    /// A block header carried BTYPE = 3.
    #[error("Reserved DEFLATE block type 3")]
    ReservedBlockType,

    /// Code lengths describe an over-subscribed or disallowed incomplete code.
    #[error("Invalid Huffman table: {0}")]
    InvalidHuffmanTable(&'static str),

    /// No symbol matched within the maximum code length.
    #[error("Invalid Huffman code in stream")]
    InvalidHuffmanCode,

    /// Code-length symbol 16 appeared before any length was decoded.
    #[error("Repeat code 16 with no previous code length")]
    InvalidRepeatCode,

    /// Literal/length symbol above 285 or distance symbol above 29.
    #[error("Invalid length or distance code: {0}")]
    InvalidLengthOrDistanceCode(u16),

    /// A back-reference points before the start of the output.
    #[error("Back-reference distance {distance} exceeds {available} bytes of output")]
    DistanceOutOfRange {
        /// Decoded match distance.
        distance: usize,
        /// Bytes produced so far.
        available: usize,
    },

    /// Stored block NLEN is not the one's complement of LEN.
    #[error("Stored block length check failed: LEN={len:#06x} NLEN={nlen:#06x}")]
    ChecksumMismatch {
        /// LEN field.
        len: u16,
        /// NLEN field.
        nlen: u16,
    },

    /// The zlib Adler-32 trailer does not match the decoded data.
    #[error("Adler-32 mismatch: expected {expected:08X}, got {actual:08X}")]
    Adler32Mismatch {
        /// Checksum stored in the stream.
        expected: u32,
        /// Checksum of the decoded bytes.
        actual: u32,
    },

    /// Bits or bytes were requested past the end of the input.
    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,

    /// Decoded output grew past the configured limit.
    #[error("Decoded output exceeds limit of {limit} bytes")]
    OutputLimitExceeded {
        /// Configured maximum output size.
        limit: usize,
    },

    /// A valid PNG using a feature outside this decoder's scope.
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    /// A scanline starts with a filter type other than 0-4.
    #[error("Invalid filter type {filter} on row {row}")]
    InvalidFilterType {
        /// Scanline index.
        row: usize,
        /// Filter byte found.
        filter: u8,
    },

    /// Zero or oversized image dimensions.
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },
}
