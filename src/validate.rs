// SPDX-License-Identifier: Apache-2.0

use crate::{
    error::{Axis, Result, Side, Violation},
    generation::Generation,
    image::{ImageDescriptor, Rotation, TransformRequest},
};

/// Smallest width or height the size register accepts.
pub const MIN_DIMENSION: u32 = 16;

/// Largest width or height the size register accepts.
pub const MAX_DIMENSION: u32 = 4092;

/// Largest byte line length VESWR and VEDWR hold.
pub const MAX_LINE_LENGTH: u32 = 0x1fff;

/// Largest downscale factor per axis, on every generation.
pub const MAX_DOWNSCALE: u32 = 16;

/// Checks `request` against the engine's constraints without touching the
/// hardware.
///
/// Rules are checked in a fixed order and the first broken one is reported:
/// pitch parity, dimension range, pitch range, rotation geometry, then the
/// scaling ratio
/// limits of `generation` per axis. Pixel formats are already restricted to
/// the supported set by [`crate::image::PixelFormat`].
pub fn validate<A>(request: &TransformRequest<A>, generation: Generation) -> Result<()> {
    let src = &request.source;
    let dst = &request.destination;

    check_pitch(src, Side::Source)?;
    check_pitch(dst, Side::Destination)?;

    check_dimensions(src, Side::Source)?;
    check_dimensions(dst, Side::Destination)?;

    check_pitch_range(src, Side::Source)?;
    check_pitch_range(dst, Side::Destination)?;

    if request.rotation == Rotation::Rotation90
        && (src.width != dst.height || src.height != dst.width)
    {
        return Err(Violation::RotationGeometry {
            from: (src.width, src.height),
            to: (dst.width, dst.height),
        }
        .into());
    }

    let limit = generation.max_upscale();
    check_ratio(Axis::Horizontal, src.width, dst.width, limit)?;
    check_ratio(Axis::Vertical, src.height, dst.height, limit)?;

    Ok(())
}

fn check_pitch<A>(img: &ImageDescriptor<A>, side: Side) -> Result<()> {
    if img.pitch % 2 != 0 {
        return Err(Violation::OddPitch {
            side,
            pitch: img.pitch,
        }
        .into());
    }
    Ok(())
}

fn check_pitch_range<A>(img: &ImageDescriptor<A>, side: Side) -> Result<()> {
    let fits = img
        .line_length()
        .is_some_and(|bytes| bytes <= MAX_LINE_LENGTH);
    if img.pitch < img.width || !fits {
        return Err(Violation::PitchOutOfRange {
            side,
            pitch: img.pitch,
            width: img.width,
        }
        .into());
    }
    Ok(())
}

fn check_dimensions<A>(img: &ImageDescriptor<A>, side: Side) -> Result<()> {
    let range = MIN_DIMENSION..=MAX_DIMENSION;
    if !range.contains(&img.width) || !range.contains(&img.height) {
        return Err(Violation::DimensionOutOfRange {
            side,
            width: img.width,
            height: img.height,
        }
        .into());
    }
    Ok(())
}

fn check_ratio(axis: Axis, from: u32, to: u32, limit: u32) -> Result<()> {
    if to > limit * from {
        return Err(Violation::UpscaleTooLarge {
            axis,
            from,
            to,
            limit,
        }
        .into());
    }
    if to < from / MAX_DOWNSCALE {
        return Err(Violation::DownscaleTooLarge { axis, from, to }.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        image::{PixelFormat, TransformRequest},
    };

    fn img(width: u32, height: u32, format: PixelFormat) -> ImageDescriptor {
        ImageDescriptor::new(0x1000_0000, 0x1100_0000, width, height, format)
    }

    fn violation(result: Result<()>) -> Violation {
        match result {
            Err(Error::InvalidRequest(v)) => v,
            other => panic!("expected InvalidRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_accepts_plain_conversion() {
        let req = TransformRequest::new(
            img(320, 240, PixelFormat::YCbCr420),
            img(640, 480, PixelFormat::Rgb565),
        );
        validate(&req, Generation::Veu2h).unwrap();
        validate(&req, Generation::Veu3f).unwrap();
    }

    #[test]
    fn test_odd_pitch() {
        let req = TransformRequest::new(
            img(320, 240, PixelFormat::YCbCr420),
            img(320, 240, PixelFormat::Rgb565).with_pitch(321),
        );
        assert_eq!(
            violation(validate(&req, Generation::Veu3f)),
            Violation::OddPitch {
                side: Side::Destination,
                pitch: 321
            }
        );
    }

    #[test]
    fn test_dimension_range() {
        for (w, h) in [(15, 240), (320, 15), (4093, 240), (320, 4094)] {
            let req = TransformRequest::new(
                img(w, h, PixelFormat::YCbCr420).with_pitch(320),
                img(320, 240, PixelFormat::YCbCr420),
            );
            assert!(matches!(
                violation(validate(&req, Generation::Veu3f)),
                Violation::DimensionOutOfRange {
                    side: Side::Source,
                    ..
                }
            ));
        }

        let req = TransformRequest::new(
            img(4092, 16, PixelFormat::YCbCr420),
            img(4092, 16, PixelFormat::YCbCr420),
        );
        validate(&req, Generation::Veu3f).unwrap();
    }

    #[test]
    fn test_destination_dimension_range() {
        let req = TransformRequest::new(
            img(320, 240, PixelFormat::YCbCr420),
            img(20, 14, PixelFormat::YCbCr420),
        );
        assert!(matches!(
            violation(validate(&req, Generation::Veu3f)),
            Violation::DimensionOutOfRange {
                side: Side::Destination,
                ..
            }
        ));
    }

    #[test]
    fn test_rotation_needs_exact_swap() {
        let ok = TransformRequest::rotated(
            img(320, 240, PixelFormat::YCbCr420),
            img(240, 320, PixelFormat::Rgb565),
        );
        validate(&ok, Generation::Veu2h).unwrap();

        for (w, h) in [(240, 322), (242, 320), (320, 240), (480, 640)] {
            let req = TransformRequest::rotated(
                img(320, 240, PixelFormat::YCbCr420),
                img(w, h, PixelFormat::Rgb565),
            );
            assert!(matches!(
                violation(validate(&req, Generation::Veu3f)),
                Violation::RotationGeometry { .. }
            ));
        }
    }

    #[test]
    fn test_upscale_limit_per_generation() {
        let x9 = TransformRequest::new(
            img(16, 100, PixelFormat::YCbCr420),
            img(144, 100, PixelFormat::YCbCr420),
        );
        assert_eq!(
            violation(validate(&x9, Generation::Veu2h)),
            Violation::UpscaleTooLarge {
                axis: Axis::Horizontal,
                from: 16,
                to: 144,
                limit: 8
            }
        );
        validate(&x9, Generation::Veu3f).unwrap();

        let x16 = TransformRequest::new(
            img(16, 16, PixelFormat::YCbCr420),
            img(256, 256, PixelFormat::YCbCr420),
        );
        validate(&x16, Generation::Veu3f).unwrap();

        let x17 = TransformRequest::new(
            img(16, 100, PixelFormat::YCbCr420),
            img(272, 100, PixelFormat::YCbCr420),
        );
        assert!(matches!(
            violation(validate(&x17, Generation::Veu2h)),
            Violation::UpscaleTooLarge { limit: 8, .. }
        ));
        assert!(matches!(
            violation(validate(&x17, Generation::Veu3f)),
            Violation::UpscaleTooLarge { limit: 16, .. }
        ));
    }

    #[test]
    fn test_vertical_upscale_limit() {
        let req = TransformRequest::new(
            img(100, 16, PixelFormat::YCbCr420),
            img(100, 129, PixelFormat::YCbCr420),
        );
        assert!(matches!(
            violation(validate(&req, Generation::Veu2h)),
            Violation::UpscaleTooLarge {
                axis: Axis::Vertical,
                ..
            }
        ));
    }

    #[test]
    fn test_downscale_limit() {
        let ok = TransformRequest::new(
            img(4092, 320, PixelFormat::YCbCr420),
            img(255, 20, PixelFormat::YCbCr420).with_pitch(256),
        );
        validate(&ok, Generation::Veu2h).unwrap();

        let req = TransformRequest::new(
            img(4092, 320, PixelFormat::YCbCr420),
            img(254, 320, PixelFormat::YCbCr420),
        );
        assert_eq!(
            violation(validate(&req, Generation::Veu2h)),
            Violation::DownscaleTooLarge {
                axis: Axis::Horizontal,
                from: 4092,
                to: 254
            }
        );
    }

    #[test]
    fn test_pitch_below_width() {
        for pitch in [0, 318] {
            let req = TransformRequest::new(
                img(320, 240, PixelFormat::YCbCr420).with_pitch(pitch),
                img(320, 240, PixelFormat::Rgb565),
            );
            assert_eq!(
                violation(validate(&req, Generation::Veu3f)),
                Violation::PitchOutOfRange {
                    side: Side::Source,
                    pitch,
                    width: 320
                }
            );
        }
    }

    #[test]
    fn test_pitch_overflows_line_length() {
        // doubling this pitch does not fit in 32 bits
        let req = TransformRequest::new(
            img(320, 240, PixelFormat::Rgb565).with_pitch(0x8000_0000),
            img(320, 240, PixelFormat::YCbCr420),
        );
        assert!(matches!(
            violation(validate(&req, Generation::Veu3f)),
            Violation::PitchOutOfRange {
                side: Side::Source,
                pitch: 0x8000_0000,
                ..
            }
        ));

        let wide = TransformRequest::new(
            img(320, 240, PixelFormat::YCbCr420),
            img(320, 240, PixelFormat::Rgb565).with_pitch(4096),
        );
        assert!(matches!(
            violation(validate(&wide, Generation::Veu3f)),
            Violation::PitchOutOfRange {
                side: Side::Destination,
                ..
            }
        ));

        // widest RGB565 line still fits
        let widest = TransformRequest::new(
            img(4092, 240, PixelFormat::YCbCr420),
            img(4092, 240, PixelFormat::Rgb565),
        );
        validate(&widest, Generation::Veu3f).unwrap();
        let luma = TransformRequest::new(
            img(320, 240, PixelFormat::YCbCr420).with_pitch(8190),
            img(320, 240, PixelFormat::YCbCr420),
        );
        validate(&luma, Generation::Veu3f).unwrap();
    }

    #[test]
    fn test_pitch_checked_before_dimensions() {
        let req = TransformRequest::new(
            img(8, 8, PixelFormat::YCbCr420).with_pitch(9),
            img(8, 8, PixelFormat::YCbCr420),
        );
        assert!(matches!(
            violation(validate(&req, Generation::Veu3f)),
            Violation::OddPitch { .. }
        ));
    }
}
