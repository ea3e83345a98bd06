//! Scanline defiltering.
//!
//! Every scanline of the decompressed IDAT stream starts with a filter type
//! byte. Reconstruction runs top to bottom, each row reading the already
//! reconstructed row above it.

use crate::error::{Error, Result};

/// PNG filter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FilterType {
    /// Raw bytes.
    None = 0,
    /// Difference from the byte one pixel to the left.
    Sub = 1,
    /// Difference from the byte above.
    Up = 2,
    /// Difference from the mean of left and above.
    Average = 3,
    /// Difference from the Paeth predictor.
    Paeth = 4,
}

impl FilterType {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(FilterType::None),
            1 => Some(FilterType::Sub),
            2 => Some(FilterType::Up),
            3 => Some(FilterType::Average),
            4 => Some(FilterType::Paeth),
            _ => None,
        }
    }
}

/// Reverse the per-row filters of a decompressed IDAT stream.
///
/// `stream` holds `height` rows of `1 + row_bytes` bytes. Returns the
/// reconstructed rows without their filter bytes.
pub fn unfilter_scanlines(
    stream: &[u8],
    row_bytes: usize,
    bpp: usize,
    height: usize,
) -> Result<Vec<u8>> {
    let stride = row_bytes + 1;
    if stream.len() < stride * height {
        return Err(Error::UnexpectedEndOfInput);
    }

    let mut pixels = vec![0u8; row_bytes * height];
    let zero_row = vec![0u8; row_bytes];

    for (y, line) in stream.chunks_exact(stride).take(height).enumerate() {
        let filter = FilterType::from_byte(line[0])
            .ok_or(Error::InvalidFilterType { row: y, filter: line[0] })?;

        let (done, rest) = pixels.split_at_mut(y * row_bytes);
        let row = &mut rest[..row_bytes];
        row.copy_from_slice(&line[1..]);

        let prev = if y == 0 {
            &zero_row[..]
        } else {
            &done[(y - 1) * row_bytes..]
        };
        unfilter_row(filter, row, prev, bpp);
    }

    Ok(pixels)
}

/// Reconstruct one row in place. `prev` is the reconstructed row above, all
/// zeros for the first row.
pub fn unfilter_row(filter: FilterType, row: &mut [u8], prev: &[u8], bpp: usize) {
    match filter {
        FilterType::None => {}
        FilterType::Sub => {
            for i in bpp..row.len() {
                row[i] = row[i].wrapping_add(row[i - bpp]);
            }
        }
        FilterType::Up => {
            for (byte, &above) in row.iter_mut().zip(prev) {
                *byte = byte.wrapping_add(above);
            }
        }
        FilterType::Average => {
            for i in 0..row.len() {
                let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                let above = prev[i] as u16;
                row[i] = row[i].wrapping_add(((left + above) / 2) as u8);
            }
        }
        FilterType::Paeth => {
            for i in 0..row.len() {
                let a = if i >= bpp { row[i - bpp] } else { 0 };
                let b = prev[i];
                let c = if i >= bpp { prev[i - bpp] } else { 0 };
                row[i] = row[i].wrapping_add(paeth_predictor(a, b, c));
            }
        }
    }
}

/// Paeth predictor: whichever of left, above, upper-left is closest to
/// `a + b - c`, ties broken in that order.
#[inline]
pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
