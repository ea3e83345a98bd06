//! zlib envelope (RFC 1950) around a DEFLATE stream.
//!
//! The two-byte header is checked before any block is decoded; the Adler-32
//! trailer follows the last DEFLATE block on the next byte boundary.

use tracing::debug;

use crate::checksum::adler32;
use crate::error::{Error, Result};
use crate::inflate::{InflateOptions, Inflated, Inflater};

/// The only compression method zlib defines.
const METHOD_DEFLATE: u8 = 8;

/// FLEVEL: the compressor's declared effort. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    /// FLEVEL 0.
    Fastest,
    /// FLEVEL 1.
    Fast,
    /// FLEVEL 2.
    Default,
    /// FLEVEL 3.
    Maximum,
}

/// Parsed CMF/FLG header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZlibHeader {
    /// CINFO: base-2 logarithm of the window size minus eight.
    pub window_bits: u8,
    /// FLEVEL.
    pub level: CompressionLevel,
}

impl ZlibHeader {
    /// Parse and validate the first two bytes of a zlib stream.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let [cmf, flg] = match data {
            [cmf, flg, ..] => [*cmf, *flg],
            _ => return Err(Error::InvalidZlibHeader("stream shorter than 2 bytes".into())),
        };

        let method = cmf & 0x0F;
        if method != METHOD_DEFLATE {
            return Err(Error::UnsupportedZlibFeature(format!(
                "compression method {method}"
            )));
        }

        let window_bits = cmf >> 4;
        if window_bits > 7 {
            return Err(Error::UnsupportedZlibFeature(format!(
                "window size 2^{}",
                window_bits + 8
            )));
        }

        if (((cmf as u16) << 8) | flg as u16) % 31 != 0 {
            return Err(Error::InvalidZlibHeader("FCHECK mismatch".into()));
        }

        if flg & 0x20 != 0 {
            return Err(Error::UnsupportedZlibFeature("preset dictionary".into()));
        }

        let level = match flg >> 6 {
            0 => CompressionLevel::Fastest,
            1 => CompressionLevel::Fast,
            2 => CompressionLevel::Default,
            _ => CompressionLevel::Maximum,
        };

        Ok(Self { window_bits, level })
    }

    /// LZ77 window size in bytes.
    pub fn window_size(&self) -> usize {
        1 << (self.window_bits as usize + 8)
    }
}

/// A fully decoded zlib stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZlibStream {
    /// The parsed header.
    pub header: ZlibHeader,
    /// The inflated payload and session details.
    pub inflated: Inflated,
    /// Adler-32 stored in the trailer. `None` only when verification is off
    /// and the stream ends before the trailer.
    pub checksum: Option<u32>,
}

/// Decode a zlib stream with default options.
pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    decode_with_options(input, &InflateOptions::default())
}

/// Decode a zlib stream.
pub fn decode_with_options(input: &[u8], options: &InflateOptions) -> Result<Vec<u8>> {
    decode_stream(input, options).map(|stream| stream.inflated.data)
}

/// Decode a zlib stream and keep the header, trailer and block statistics.
///
/// Bytes after the Adler-32 trailer are ignored. The trailer is required
/// only when `verify_checksum` is set.
pub fn decode_stream(input: &[u8], options: &InflateOptions) -> Result<ZlibStream> {
    let header = ZlibHeader::parse(input)?;
    debug!(
        window_size = header.window_size(),
        level = ?header.level,
        "zlib header"
    );

    let body = &input[2..];
    let inflated = Inflater::new(body, options).finish()?;

    let checksum = body
        .get(inflated.consumed..inflated.consumed + 4)
        .map(|t| u32::from_be_bytes([t[0], t[1], t[2], t[3]]));

    if options.verify_checksum {
        let expected = checksum.ok_or(Error::UnexpectedEndOfInput)?;
        let actual = adler32(&inflated.data);
        if actual != expected {
            return Err(Error::Adler32Mismatch { expected, actual });
        }
    } else if checksum.is_none() {
        debug!("zlib trailer missing, checksum not verified");
    }

    Ok(ZlibStream {
        header,
        inflated,
        checksum,
    })
}
