//! Fuzz target for PNG decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pnginflate::png::{decode_png_with_options, PngDecodeOptions};

fuzz_target!(|data: &[u8]| {
    // Keep allocations bounded; skip CRCs so mutations reach the inflater.
    let options = PngDecodeOptions::lenient().with_max_dimension(1024);

    if let Ok(image) = decode_png_with_options(data, &options) {
        let row_bytes = image.header.row_bytes().unwrap_or(0);
        assert_eq!(image.pixels.len(), row_bytes * image.height() as usize);
    }
});
