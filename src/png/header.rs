//! IHDR parsing and scanline geometry.

use crate::error::{Error, Result};

/// Length of the IHDR payload.
pub const IHDR_LEN: usize = 13;

/// PNG colour type values from the IHDR chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorType {
    /// Greyscale samples.
    Grayscale = 0,
    /// Red, green, blue samples.
    Rgb = 2,
    /// Palette indices.
    Indexed = 3,
    /// Greyscale followed by alpha.
    GrayscaleAlpha = 4,
    /// Red, green, blue, alpha samples.
    Rgba = 6,
}

impl TryFrom<u8> for ColorType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ColorType::Grayscale),
            2 => Ok(ColorType::Rgb),
            3 => Ok(ColorType::Indexed),
            4 => Ok(ColorType::GrayscaleAlpha),
            6 => Ok(ColorType::Rgba),
            _ => Err(Error::MalformedContainer(format!(
                "invalid PNG color type: {value}"
            ))),
        }
    }
}

impl ColorType {
    /// Samples per pixel.
    #[inline]
    pub const fn channels(self) -> usize {
        match self {
            ColorType::Grayscale | ColorType::Indexed => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::Rgb => 3,
            ColorType::Rgba => 4,
        }
    }

    /// Whether `bit_depth` is allowed for this colour type.
    pub const fn allows_bit_depth(self, bit_depth: u8) -> bool {
        match self {
            ColorType::Grayscale => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
            ColorType::Indexed => matches!(bit_depth, 1 | 2 | 4 | 8),
            ColorType::Rgb | ColorType::GrayscaleAlpha | ColorType::Rgba => {
                matches!(bit_depth, 8 | 16)
            }
        }
    }
}

/// Contents of the IHDR chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Bits per sample.
    pub bit_depth: u8,
    /// Colour type.
    pub color_type: ColorType,
    /// Adam7 interlacing flag.
    pub interlaced: bool,
}

impl ImageHeader {
    /// Parse an IHDR payload.
    ///
    /// Dimension limits are checked by the caller, which knows the configured
    /// maximum.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != IHDR_LEN {
            return Err(Error::MalformedContainer(format!(
                "invalid IHDR length {}",
                data.len()
            )));
        }

        let width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let bit_depth = data[8];
        let color_type = ColorType::try_from(data[9])?;

        if !color_type.allows_bit_depth(bit_depth) {
            return Err(Error::MalformedContainer(format!(
                "invalid bit depth {bit_depth} for color type {color_type:?}"
            )));
        }
        if data[10] != 0 {
            return Err(Error::MalformedContainer(format!(
                "unsupported compression method {}",
                data[10]
            )));
        }
        if data[11] != 0 {
            return Err(Error::MalformedContainer(format!(
                "unsupported filter method {}",
                data[11]
            )));
        }
        let interlaced = match data[12] {
            0 => false,
            1 => true,
            other => {
                return Err(Error::MalformedContainer(format!(
                    "invalid interlace method {other}"
                )))
            }
        };

        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
            interlaced,
        })
    }

    /// Bits per pixel.
    #[inline]
    pub fn bits_per_pixel(&self) -> usize {
        self.color_type.channels() * self.bit_depth as usize
    }

    /// Byte distance to the corresponding byte of the previous pixel, as used
    /// by the Sub, Average and Paeth filters (at least 1).
    #[inline]
    pub fn filter_bpp(&self) -> usize {
        self.bits_per_pixel().div_ceil(8)
    }

    /// Bytes in one scanline, excluding the filter byte.
    pub fn row_bytes(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.bits_per_pixel())
            .map(|bits| bits.div_ceil(8))
            .ok_or(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
    }

    /// Size of the decompressed IDAT stream: one filter byte plus
    /// `row_bytes` per scanline.
    pub fn expected_stream_len(&self) -> Result<usize> {
        let row = self.row_bytes()? + 1;
        row.checked_mul(self.height as usize)
            .ok_or(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            })
    }
}
