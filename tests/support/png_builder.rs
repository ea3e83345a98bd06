//! Minimal PNG encoder used to produce decoder inputs.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pnginflate::checksum::crc32;
use pnginflate::png::PNG_SIGNATURE;

/// Append one chunk with its CRC.
pub fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc_input = kind.to_vec();
    crc_input.extend_from_slice(data);
    out.extend_from_slice(&crc32(&crc_input).to_be_bytes());
}

/// IHDR payload for a non-interlaced image.
pub fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
    data
}

pub fn paeth(a: u8, b: u8, c: u8) -> u8 {
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

/// Filter one row of pixel bytes with the given filter type.
pub fn filter_row(filter: u8, row: &[u8], prev: &[u8], bpp: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(row.len() + 1);
    out.push(filter);
    for i in 0..row.len() {
        let a = if i >= bpp { row[i - bpp] } else { 0 };
        let b = prev[i];
        let c = if i >= bpp { prev[i - bpp] } else { 0 };
        let predicted = match filter {
            0 => 0,
            1 => a,
            2 => b,
            3 => ((a as u16 + b as u16) / 2) as u8,
            4 => paeth(a, b, c),
            _ => panic!("invalid filter {filter}"),
        };
        out.push(row[i].wrapping_sub(predicted));
    }
    out
}

/// Encode `pixels` (packed rows of `row_bytes`) as a PNG, cycling through
/// `filters` row by row and splitting the zlib stream into `idat_chunks`.
pub fn encode_png(
    header: &[u8],
    pixels: &[u8],
    row_bytes: usize,
    bpp: usize,
    filters: &[u8],
    idat_chunks: usize,
) -> Vec<u8> {
    let zero = vec![0u8; row_bytes];
    let mut raw = Vec::new();
    for (y, row) in pixels.chunks(row_bytes).enumerate() {
        let prev = if y == 0 {
            &zero[..]
        } else {
            &pixels[(y - 1) * row_bytes..y * row_bytes]
        };
        raw.extend(filter_row(filters[y % filters.len()], row, prev, bpp));
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).expect("compress scanlines");
    let compressed = encoder.finish().expect("finish zlib stream");

    let mut out = PNG_SIGNATURE.to_vec();
    write_chunk(&mut out, b"IHDR", header);
    let part = compressed.len().div_ceil(idat_chunks.max(1)).max(1);
    for piece in compressed.chunks(part) {
        write_chunk(&mut out, b"IDAT", piece);
    }
    write_chunk(&mut out, b"IEND", &[]);
    out
}
