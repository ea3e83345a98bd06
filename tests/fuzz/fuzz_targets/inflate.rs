//! Fuzz target for DEFLATE/zlib decoding.
//!
//! Arbitrary input must produce a value or an error, never a panic, and the
//! output limit must hold.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pnginflate::inflate::{inflate_with_options, InflateOptions};
use pnginflate::zlib;

/// Structured input for inflate fuzzing.
#[derive(Arbitrary, Debug)]
struct InflateInput {
    /// Decode as zlib instead of raw DEFLATE
    zlib: bool,
    /// Output cap in KiB (0 = 1 MiB)
    limit_kib: u16,
    /// Compressed stream
    data: Vec<u8>,
}

fuzz_target!(|input: InflateInput| {
    let limit = match input.limit_kib {
        0 => 1 << 20,
        kib => kib as usize * 1024,
    };
    let options = InflateOptions::default().with_max_output(limit);

    let result = if input.zlib {
        zlib::decode_with_options(&input.data, &options)
    } else {
        inflate_with_options(&input.data, &options)
    };

    if let Ok(output) = result {
        assert!(output.len() <= limit, "output limit exceeded");
    }
});
