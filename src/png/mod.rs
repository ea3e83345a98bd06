//! PNG decoding.
//!
//! The container layer walks the chunk list, validates IHDR, concatenates the
//! IDAT payloads and hands them to the zlib layer as one stream. Defiltering
//! is a separate stage over the decompressed scanlines.
//!
//! Only non-interlaced greyscale and truecolour images (with or without
//! alpha) are decoded. Pixels are returned at their native bit depth, one
//! packed row after another.

pub mod chunk;
pub mod filter;
pub mod header;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::inflate::InflateOptions;
use crate::zlib;
use chunk::ChunkReader;
pub use chunk::PNG_SIGNATURE;
pub use header::{ColorType, ImageHeader};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default cap on width and height.
pub const DEFAULT_MAX_DIMENSION: u32 = 1 << 24;

/// Options for decoding PNG files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngDecodeOptions {
    /// Largest width or height accepted.
    pub max_dimension: u32,
    /// Check each chunk's CRC-32.
    pub verify_crc: bool,
    /// Check the zlib Adler-32 trailer of the image data.
    pub verify_checksum: bool,
}

impl Default for PngDecodeOptions {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            verify_crc: true,
            verify_checksum: true,
        }
    }
}

impl PngDecodeOptions {
    /// Skip every integrity check. Useful for salvaging damaged files.
    pub fn lenient() -> Self {
        Self {
            verify_crc: false,
            verify_checksum: false,
            ..Self::default()
        }
    }

    /// Set the largest width or height accepted.
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// Enable or disable chunk CRC checks.
    pub fn with_verify_crc(mut self, verify: bool) -> Self {
        self.verify_crc = verify;
        self
    }

    /// Enable or disable the Adler-32 check.
    pub fn with_verify_checksum(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }
}

/// A decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngImage {
    /// Image header.
    pub header: ImageHeader,
    /// Defiltered scanlines, `row_bytes` each, without filter bytes.
    pub pixels: Vec<u8>,
}

impl PngImage {
    /// Image width.
    pub fn width(&self) -> u32 {
        self.header.width
    }

    /// Image height.
    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Bytes per row of `pixels`.
    pub fn row_bytes(&self) -> usize {
        self.pixels.len() / self.header.height.max(1) as usize
    }

    /// One row of pixel data.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        let stride = self.row_bytes();
        self.pixels.get(y * stride..(y + 1) * stride)
    }
}

/// Decode a PNG file with default options.
pub fn decode_png(data: &[u8]) -> Result<PngImage> {
    decode_png_with_options(data, &PngDecodeOptions::default())
}

/// Decode a PNG file.
pub fn decode_png_with_options(data: &[u8], options: &PngDecodeOptions) -> Result<PngImage> {
    let (header, stream) = decode_png_raw_with_options(data, options)?;

    let pixels = filter::unfilter_scanlines(
        &stream,
        header.row_bytes()?,
        header.filter_bpp(),
        header.height as usize,
    )?;

    debug!(
        width = header.width,
        height = header.height,
        bit_depth = header.bit_depth,
        color_type = ?header.color_type,
        "decoded image"
    );
    Ok(PngImage { header, pixels })
}

/// Decode a PNG file up to, but not including, defiltering.
///
/// Returns the header and the decompressed IDAT stream, each scanline still
/// prefixed by its filter byte.
pub fn decode_png_raw(data: &[u8]) -> Result<(ImageHeader, Vec<u8>)> {
    decode_png_raw_with_options(data, &PngDecodeOptions::default())
}

/// [`decode_png_raw`] with explicit options.
pub fn decode_png_raw_with_options(
    data: &[u8],
    options: &PngDecodeOptions,
) -> Result<(ImageHeader, Vec<u8>)> {
    let (header, idat) = read_container(data, options)?;

    let expected = header.expected_stream_len()?;
    let inflate_options = InflateOptions::default()
        .with_size_hint(expected)
        .with_max_output(expected)
        .with_verify_checksum(options.verify_checksum);
    let stream = zlib::decode_with_options(&idat, &inflate_options)?;

    if stream.len() != expected {
        return Err(Error::MalformedContainer(format!(
            "image data is {} bytes, expected {expected}",
            stream.len()
        )));
    }

    Ok((header, stream))
}

/// Decode several PNG files. Runs on the rayon pool when the `parallel`
/// feature is enabled.
pub fn decode_png_batch(inputs: &[&[u8]], options: &PngDecodeOptions) -> Vec<Result<PngImage>> {
    #[cfg(feature = "parallel")]
    {
        inputs
            .par_iter()
            .map(|data| decode_png_with_options(data, options))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        inputs
            .iter()
            .map(|data| decode_png_with_options(data, options))
            .collect()
    }
}

/// Walk the chunk list. Returns the validated header and the concatenated
/// IDAT payloads.
fn read_container(data: &[u8], options: &PngDecodeOptions) -> Result<(ImageHeader, Vec<u8>)> {
    let mut chunks = ChunkReader::new(data, options.verify_crc)?;

    let first = chunks
        .next()
        .ok_or_else(|| Error::MalformedContainer("missing IHDR chunk".into()))??;
    if &first.kind != b"IHDR" {
        return Err(Error::MalformedContainer(format!(
            "first chunk is {}, expected IHDR",
            first.name()
        )));
    }
    let header = ImageHeader::parse(first.data)?;
    check_header(&header, options)?;

    let mut idat = Vec::new();
    let mut idat_seen = false;
    let mut idat_done = false;
    let mut iend_seen = false;

    for chunk in chunks.by_ref() {
        let chunk = chunk?;
        match &chunk.kind {
            b"IDAT" => {
                if idat_done {
                    return Err(Error::MalformedContainer(
                        "IDAT chunks are not consecutive".into(),
                    ));
                }
                idat_seen = true;
                idat.extend_from_slice(chunk.data);
            }
            b"IEND" => {
                iend_seen = true;
                break;
            }
            b"IHDR" => {
                return Err(Error::MalformedContainer("duplicate IHDR chunk".into()));
            }
            b"PLTE" => {
                if idat_seen {
                    idat_done = true;
                }
                trace!("skipping palette");
            }
            _ if chunk.is_critical() => {
                return Err(Error::UnsupportedImage(format!(
                    "unknown critical chunk {}",
                    chunk.name()
                )));
            }
            _ => {
                if idat_seen {
                    idat_done = true;
                }
                trace!(kind = %chunk.name(), "skipping chunk");
            }
        }
    }

    if !idat_seen {
        return Err(Error::MalformedContainer("missing IDAT chunk".into()));
    }
    if !iend_seen {
        return Err(Error::MalformedContainer("missing IEND chunk".into()));
    }

    debug!(
        idat_len = idat.len(),
        trailing = data.len() - chunks.position(),
        "read PNG container"
    );
    Ok((header, idat))
}

fn check_header(header: &ImageHeader, options: &PngDecodeOptions) -> Result<()> {
    if header.width == 0
        || header.height == 0
        || header.width > options.max_dimension
        || header.height > options.max_dimension
    {
        return Err(Error::InvalidDimensions {
            width: header.width,
            height: header.height,
        });
    }
    if header.interlaced {
        return Err(Error::UnsupportedImage("Adam7 interlacing".into()));
    }
    if header.color_type == ColorType::Indexed {
        return Err(Error::UnsupportedImage("indexed color".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::{adler32, crc32};

    fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        let mut crc_input = kind.to_vec();
        crc_input.extend_from_slice(data);
        out.extend_from_slice(&crc32(&crc_input).to_be_bytes());
    }

    fn ihdr(width: u32, height: u32, depth: u8, color: u8) -> Vec<u8> {
        let mut data = width.to_be_bytes().to_vec();
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[depth, color, 0, 0, 0]);
        data
    }

    /// zlib stream made of one stored block.
    fn stored_zlib(payload: &[u8]) -> Vec<u8> {
        let len = payload.len() as u16;
        let mut out = vec![0x78, 0x01, 0x01];
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(&(!len).to_le_bytes());
        out.extend_from_slice(payload);
        out.extend_from_slice(&adler32(payload).to_be_bytes());
        out
    }

    fn png(header: &[u8], idat: &[&[u8]]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        chunk(&mut out, b"IHDR", header);
        for part in idat {
            chunk(&mut out, b"IDAT", part);
        }
        chunk(&mut out, b"IEND", &[]);
        out
    }

    #[test]
    fn test_decode_grayscale() {
        // 2x2, filter None on both rows
        let scanlines = [0, 1, 2, 0, 3, 4];
        let data = png(&ihdr(2, 2, 8, 0), &[&stored_zlib(&scanlines)]);

        let image = decode_png(&data).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 2);
        assert_eq!(image.pixels, [1, 2, 3, 4]);
        assert_eq!(image.row(1), Some(&[3u8, 4][..]));
        assert_eq!(image.row(2), None);
    }

    #[test]
    fn test_decode_raw_keeps_filter_bytes() {
        let scanlines = [1, 5, 5, 2, 1, 1];
        let data = png(&ihdr(2, 2, 8, 0), &[&stored_zlib(&scanlines)]);

        let (header, stream) = decode_png_raw(&data).unwrap();
        assert_eq!(header.color_type, ColorType::Grayscale);
        assert_eq!(stream, scanlines);

        let image = decode_png(&data).unwrap();
        assert_eq!(image.pixels, [5, 10, 6, 11]);
    }

    #[test]
    fn test_split_idat() {
        let zlib = stored_zlib(&[0, 7, 0, 8]);
        let (a, b) = zlib.split_at(5);
        let data = png(&ihdr(1, 2, 8, 0), &[a, &[][..], b]);
        assert_eq!(decode_png(&data).unwrap().pixels, [7, 8]);
    }

    #[test]
    fn test_ancillary_chunks_skipped() {
        let mut data = PNG_SIGNATURE.to_vec();
        chunk(&mut data, b"IHDR", &ihdr(1, 1, 8, 0));
        chunk(&mut data, b"tEXt", b"Comment\0hi");
        chunk(&mut data, b"IDAT", &stored_zlib(&[0, 42]));
        chunk(&mut data, b"tIME", &[0; 7]);
        chunk(&mut data, b"IEND", &[]);
        assert_eq!(decode_png(&data).unwrap().pixels, [42]);
    }

    #[test]
    fn test_non_consecutive_idat() {
        let zlib = stored_zlib(&[0, 7]);
        let (a, b) = zlib.split_at(4);
        let mut data = PNG_SIGNATURE.to_vec();
        chunk(&mut data, b"IHDR", &ihdr(1, 1, 8, 0));
        chunk(&mut data, b"IDAT", a);
        chunk(&mut data, b"tEXt", b"x\0y");
        chunk(&mut data, b"IDAT", b);
        chunk(&mut data, b"IEND", &[]);
        assert!(matches!(
            decode_png(&data),
            Err(Error::MalformedContainer(msg)) if msg.contains("consecutive")
        ));
    }

    #[test]
    fn test_missing_iend() {
        let mut data = png(&ihdr(1, 1, 8, 0), &[&stored_zlib(&[0, 1])]);
        data.truncate(data.len() - 12);
        assert!(matches!(
            decode_png(&data),
            Err(Error::MalformedContainer(msg)) if msg.contains("IEND")
        ));
    }

    #[test]
    fn test_missing_idat() {
        let data = png(&ihdr(1, 1, 8, 0), &[]);
        assert!(matches!(
            decode_png(&data),
            Err(Error::MalformedContainer(msg)) if msg.contains("IDAT")
        ));
    }

    #[test]
    fn test_ihdr_not_first() {
        let mut data = PNG_SIGNATURE.to_vec();
        chunk(&mut data, b"tEXt", b"a\0b");
        chunk(&mut data, b"IHDR", &ihdr(1, 1, 8, 0));
        assert!(matches!(
            decode_png(&data),
            Err(Error::MalformedContainer(msg)) if msg.contains("IHDR")
        ));
    }

    #[test]
    fn test_signature_only() {
        assert!(matches!(
            decode_png(&PNG_SIGNATURE),
            Err(Error::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_zero_dimensions() {
        let data = png(&ihdr(0, 1, 8, 0), &[&stored_zlib(&[0])]);
        assert_eq!(
            decode_png(&data),
            Err(Error::InvalidDimensions {
                width: 0,
                height: 1
            })
        );
    }

    #[test]
    fn test_max_dimension() {
        let data = png(&ihdr(4, 1, 8, 0), &[&stored_zlib(&[0, 1, 2, 3, 4])]);
        let options = PngDecodeOptions::default().with_max_dimension(3);
        assert!(matches!(
            decode_png_with_options(&data, &options),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(decode_png(&data).is_ok());
    }

    #[test]
    fn test_unsupported_images() {
        let mut header = ihdr(1, 1, 8, 0);
        header[12] = 1;
        let data = png(&header, &[&stored_zlib(&[0, 1])]);
        assert!(matches!(decode_png(&data), Err(Error::UnsupportedImage(_))));

        let data = png(&ihdr(1, 1, 8, 3), &[&stored_zlib(&[0, 1])]);
        assert!(matches!(decode_png(&data), Err(Error::UnsupportedImage(_))));
    }

    #[test]
    fn test_unknown_critical_chunk() {
        let mut data = PNG_SIGNATURE.to_vec();
        chunk(&mut data, b"IHDR", &ihdr(1, 1, 8, 0));
        chunk(&mut data, b"PLTE", &[0, 0, 0]);
        chunk(&mut data, b"IDAT", &stored_zlib(&[0, 3]));
        chunk(&mut data, b"IEND", &[]);
        assert_eq!(decode_png(&data).unwrap().pixels, [3]);

        let mut data = PNG_SIGNATURE.to_vec();
        chunk(&mut data, b"IHDR", &ihdr(1, 1, 8, 0));
        chunk(&mut data, b"XYZW", &[1, 2]);
        chunk(&mut data, b"IDAT", &stored_zlib(&[0, 3]));
        chunk(&mut data, b"IEND", &[]);
        assert!(matches!(
            decode_png(&data),
            Err(Error::UnsupportedImage(msg)) if msg.contains("XYZW")
        ));
    }

    #[test]
    fn test_huge_header_small_file() {
        // 2^24 x 2^24 greyscale backed by an empty fixed block.
        let idat = [0x78, 0x01, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01];
        let data = png(&ihdr(1 << 24, 1 << 24, 8, 0), &[&idat]);
        assert!(data.len() < 80);
        assert!(decode_png(&data).is_err());
        assert!(decode_png_raw(&data).is_err());
    }

    #[test]
    fn test_stream_size_mismatch() {
        // Too short for a 2x2 image.
        let data = png(&ihdr(2, 2, 8, 0), &[&stored_zlib(&[0, 1, 2])]);
        assert!(matches!(
            decode_png(&data),
            Err(Error::MalformedContainer(msg)) if msg.contains("expected 6")
        ));

        // Too long: the inflater stops at the expected size.
        let data = png(&ihdr(1, 1, 8, 0), &[&stored_zlib(&[0, 1, 2])]);
        assert_eq!(
            decode_png(&data),
            Err(Error::OutputLimitExceeded { limit: 2 })
        );
    }

    #[test]
    fn test_crc_options() {
        let mut data = png(&ihdr(1, 1, 8, 0), &[&stored_zlib(&[0, 9])]);
        // Corrupt the IEND CRC.
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        assert!(decode_png(&data).is_err());

        let options = PngDecodeOptions::default().with_verify_crc(false);
        assert_eq!(
            decode_png_with_options(&data, &options).unwrap().pixels,
            [9]
        );
        assert!(decode_png_with_options(&data, &PngDecodeOptions::lenient()).is_ok());
    }

    #[test]
    fn test_batch() {
        let good = png(&ihdr(1, 1, 8, 0), &[&stored_zlib(&[0, 1])]);
        let bad = b"not a png".to_vec();
        let results = decode_png_batch(
            &[good.as_slice(), bad.as_slice(), good.as_slice()],
            &PngDecodeOptions::default(),
        );

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[2].as_ref().unwrap().pixels, [1]);
    }
}
