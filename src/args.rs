// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use shveu::PixelFormat;
use std::path::Path;

/// Named frame sizes understood by `--input-size` and `--output-size`.
const NAMED_SIZES: [(&str, u32, u32); 6] = [
    ("qcif", 176, 144),
    ("cif", 352, 288),
    ("qvga", 320, 240),
    ("vga", 640, 480),
    ("d1", 720, 480),
    ("720p", 1280, 720),
];

/// Command-line arguments for the VEU converter.
///
/// Raw frames are read from the input, transformed by the VEU and written to
/// the output until the input runs out. Use `-` for stdin or stdout.
///
/// # Example
///
/// ```bash
/// # Upscale a QVGA NV12 stream to VGA RGB565
/// shveu-convert -S vga input.yuv output.rgb
///
/// # Rotate, reading from stdin
/// cat input.yuv | shveu-convert -s cif -r - rotated.yuv
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input file, or - for stdin
    pub input: String,

    /// Output file, or - for stdout (overrides --output)
    pub output_file: Option<String>,

    /// Output file, or - for stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Input colorspace (RGB565, NV12, YCbCr420, YCbCr422)
    #[arg(short = 'c', long, value_parser = parse_colorspace)]
    pub input_colorspace: Option<PixelFormat>,

    /// Input size (qcif, cif, qvga, vga, d1, 720p or WIDTHxHEIGHT)
    #[arg(short = 's', long, value_parser = parse_size)]
    pub input_size: Option<(u32, u32)>,

    /// Input width in pixels, the height is derived from the file size
    #[arg(long, conflicts_with = "input_size")]
    pub input_width: Option<u32>,

    /// Input height in pixels, the width is derived from the file size
    #[arg(long, conflicts_with = "input_size")]
    pub input_height: Option<u32>,

    /// Output colorspace, defaults to the input colorspace
    #[arg(short = 'C', long, value_parser = parse_colorspace)]
    pub output_colorspace: Option<PixelFormat>,

    /// Output size, defaults to the input size; the VEU cannot scale and
    /// rotate at once
    #[arg(short = 'S', long, value_parser = parse_size)]
    pub output_size: Option<(u32, u32)>,

    /// Rotate the image 90 degrees clockwise
    #[arg(short, long)]
    pub rotate: bool,

    /// UIO device name prefix of the VEU
    #[arg(long, env = "VEU_DEVICE", default_value = "VEU")]
    pub device: String,

    /// Poll the status register instead of waiting for the interrupt
    #[arg(long, env = "VEU_POLL")]
    pub poll: bool,

    /// Also send logs to the systemd journal
    #[arg(long, env = "JOURNALD")]
    pub journald: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn output_path(&self) -> Option<&str> {
        self.output_file.as_deref().or(self.output.as_deref())
    }
}

/// Parses a colorspace name, case-insensitively by prefix.
pub fn parse_colorspace(arg: &str) -> Result<PixelFormat, String> {
    let arg = arg.to_ascii_lowercase();
    let starts = |prefixes: &[&str]| prefixes.iter().any(|p| arg.starts_with(p));
    if starts(&["rgb565", "rgb"]) {
        Ok(PixelFormat::Rgb565)
    } else if starts(&["ycbcr420", "420", "nv12"]) {
        Ok(PixelFormat::YCbCr420)
    } else if starts(&["ycbcr422", "422", "nv16"]) {
        Ok(PixelFormat::YCbCr422)
    } else {
        Err(format!("unknown colorspace {arg:?}"))
    }
}

/// Parses a named size or `WIDTHxHEIGHT`.
pub fn parse_size(arg: &str) -> Result<(u32, u32), String> {
    let lower = arg.to_ascii_lowercase();
    if let Some((_, w, h)) = NAMED_SIZES.iter().find(|(name, _, _)| *name == lower) {
        return Ok((*w, *h));
    }
    let (w, h) = lower
        .split_once('x')
        .ok_or_else(|| format!("unknown size {arg:?}"))?;
    let w = w.parse().map_err(|_| format!("bad width in {arg:?}"))?;
    let h = h.parse().map_err(|_| format!("bad height in {arg:?}"))?;
    Ok((w, h))
}

/// Name of a well-known frame size, for display.
pub fn show_size(width: u32, height: u32) -> &'static str {
    NAMED_SIZES
        .iter()
        .find(|(_, w, h)| *w == width && *h == height)
        .map_or("", |(name, _, _)| name)
}

/// Guesses the colorspace from a file extension: `.yuv` is YCbCr420 and
/// `.rgb` is RGB565.
pub fn guess_colorspace(path: &str) -> Option<PixelFormat> {
    if path == "-" {
        return None;
    }
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "yuv" => Some(PixelFormat::YCbCr420),
        "rgb" => Some(PixelFormat::Rgb565),
        _ => None,
    }
}

/// Guesses the frame size from the length of a file holding one frame.
///
/// With neither dimension given the length must match a named size exactly;
/// with one given the other is derived.
pub fn guess_size(
    file_len: u64,
    format: PixelFormat,
    width: Option<u32>,
    height: Option<u32>,
) -> Option<(u32, u32)> {
    // bytes per pixel as a fraction n/d
    let (n, d) = match format {
        PixelFormat::Rgb565 | PixelFormat::YCbCr422 => (2, 1),
        PixelFormat::YCbCr420 => (3, 2),
    };
    match (width, height) {
        (Some(w), Some(h)) => Some((w, h)),
        (None, None) => NAMED_SIZES
            .iter()
            .find(|(_, w, h)| format.frame_size(*w, *h) as u64 == file_len)
            .map(|(_, w, h)| (*w, *h)),
        (None, Some(h)) if h > 0 => Some(((file_len * d / (u64::from(h) * n)) as u32, h)),
        (Some(w), None) if w > 0 => Some((w, (file_len * d / (u64::from(w) * n)) as u32)),
        _ => None,
    }
}
