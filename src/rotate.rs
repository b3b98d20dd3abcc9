// SPDX-License-Identifier: Apache-2.0

use crate::image::PixelFormat;

/// Height of the bands the rotator transposes.
const BAND: u32 = 16;

/// Destination address adjustment for a 90 degree rotation.
///
/// The rotator writes its output as transposed 16-row bands of the source.
/// Both destination plane addresses are advanced by this many bytes to
/// compensate. YCbCr420 counts one byte per sample, the other formats two.
pub fn rotation_offset(source_height: u32, destination: PixelFormat) -> u32 {
    let vblk = source_height.div_ceil(BAND) as i64;
    let sidev = ((source_height + BAND - 1) % BAND + 1) as i64;
    let density = match destination {
        PixelFormat::YCbCr420 => 1,
        PixelFormat::YCbCr422 | PixelFormat::Rgb565 => 2,
    };
    let offset = ((vblk - 2) * BAND as i64 + sidev) * density;
    // non-negative for every height of at least one band
    offset.max(0) as u32
}
