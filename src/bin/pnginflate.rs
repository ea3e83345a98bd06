//! pnginflate CLI - PNG and zlib stream inspector
//!
//! Decodes PNG files (or bare zlib streams with `--raw`), prints what was
//! found and optionally writes the decoded bytes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pnginflate::inflate::InflateOptions;
use pnginflate::png::{self, PngDecodeOptions, PngImage};
use pnginflate::zlib::{self, ZlibStream};

/// Decode PNG images and zlib streams.
#[derive(Parser, Debug)]
#[command(name = "pnginflate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input files
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Treat inputs as bare zlib streams instead of PNG files
    #[arg(long)]
    raw: bool,

    /// Write the decoded bytes here (single input only)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Skip CRC-32 and Adler-32 verification
    #[arg(long)]
    no_verify: bool,

    /// Abort a raw decode once output exceeds this many bytes
    #[arg(long, value_name = "BYTES")]
    max_output: Option<usize>,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if args.output.is_some() && args.inputs.len() > 1 {
        bail!("--output needs exactly one input");
    }

    let inputs = args
        .inputs
        .iter()
        .map(|path| {
            fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))
                .map(|data| (path.as_path(), data))
        })
        .collect::<Result<Vec<_>>>()?;

    if args.raw {
        decode_raw(&args, &inputs)
    } else {
        decode_images(&args, &inputs)
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn decode_raw(args: &Args, inputs: &[(&Path, Vec<u8>)]) -> Result<()> {
    let mut options = InflateOptions::default().with_verify_checksum(!args.no_verify);
    if let Some(limit) = args.max_output {
        options = options.with_max_output(limit);
    }

    for (path, data) in inputs {
        let start = Instant::now();
        let stream = zlib::decode_stream(data, &options)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        let elapsed = start.elapsed();

        print_stream(path, data.len(), &stream);
        println!("  Decode time: {elapsed:.2?}");

        if let Some(output) = &args.output {
            write_output(output, &stream.inflated.data)?;
        }
    }
    Ok(())
}

fn decode_images(args: &Args, inputs: &[(&Path, Vec<u8>)]) -> Result<()> {
    let options = if args.no_verify {
        PngDecodeOptions::lenient()
    } else {
        PngDecodeOptions::default()
    };

    let start = Instant::now();
    let slices: Vec<&[u8]> = inputs.iter().map(|(_, data)| data.as_slice()).collect();
    let results = png::decode_png_batch(&slices, &options);
    let elapsed = start.elapsed();

    for ((path, data), result) in inputs.iter().zip(results) {
        let image = result.with_context(|| format!("failed to decode {}", path.display()))?;
        print_image(path, data.len(), &image);

        if let Some(output) = &args.output {
            write_output(output, &image.pixels)?;
        }
    }

    println!("Decoded {} image(s) in {elapsed:.2?}", inputs.len());
    Ok(())
}

fn print_stream(path: &Path, input_len: usize, stream: &ZlibStream) {
    let stats = &stream.inflated.stats;
    println!("{}", path.display());
    println!(
        "  zlib header: window {} bytes, level {:?}",
        stream.header.window_size(),
        stream.header.level
    );
    println!(
        "  Blocks: {} ({} stored, {} fixed, {} dynamic)",
        stats.blocks(),
        stats.stored_blocks,
        stats.fixed_blocks,
        stats.dynamic_blocks
    );
    println!(
        "  Size: {} -> {} bytes (deflate stream {} bytes)",
        input_len,
        stream.inflated.data.len(),
        stream.inflated.consumed
    );
    match stream.checksum {
        Some(checksum) => println!("  Adler-32: {checksum:08X}"),
        None => println!("  Adler-32: missing"),
    }
}

fn print_image(path: &Path, input_len: usize, image: &PngImage) {
    let header = &image.header;
    println!("{}", path.display());
    println!("  Dimensions: {}x{}", header.width, header.height);
    println!(
        "  Color type: {:?}, {} bits per sample",
        header.color_type, header.bit_depth
    );
    println!(
        "  Size: {} -> {} bytes ({} per row)",
        input_len,
        image.pixels.len(),
        image.row_bytes()
    );
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = data.len(), "wrote output");
    Ok(())
}
