//! # pnginflate
//!
//! A PNG decoder built around a hand-written DEFLATE inflater.
//!
//! The crate is layered the way the formats are:
//!
//! - [`png`] walks the chunk container, validates IHDR and joins the IDAT
//!   payloads into one zlib stream.
//! - [`zlib`] checks the two-byte header and the Adler-32 trailer.
//! - [`inflate`] decodes the DEFLATE blocks (stored, fixed Huffman, dynamic
//!   Huffman) into a single output buffer.
//! - [`png::filter`] reverses the per-scanline filters.
//!
//! ## Features
//!
//! - Optional parallel batch decoding via `parallel`
//! - Optional `pnginflate` command-line inspector via `cli`
//!
//! ## Example
//!
//! ```rust
//! use pnginflate::zlib;
//!
//! // "hi" in a single stored block, zlib-wrapped.
//! let stream = [
//!     0x78, 0x01, 0x01, 0x02, 0x00, 0xFD, 0xFF, b'h', b'i', 0x01, 0x3B, 0x00, 0xD2,
//! ];
//! assert_eq!(zlib::decode(&stream).unwrap(), b"hi");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod checksum;
pub mod error;
pub mod inflate;
pub mod png;
pub mod zlib;

pub use error::{Error, Result};
pub use inflate::{inflate, InflateOptions};
pub use png::{decode_png, ColorType, ImageHeader, PngDecodeOptions, PngImage};
