// SPDX-License-Identifier: Apache-2.0

use crate::error::{Error, Violation};
use core::fmt;
use uiomux::PhysAddr;

/// Four character code identifying a pixel layout, as used by V4L2.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &c in &self.0 {
            let c = if c.is_ascii_graphic() { c as char } else { '.' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FourCC({self})")
    }
}

/// RGB 16-bit packed format (5-6-5)
pub const RGB565: FourCC = FourCC(*b"RGBP");

/// NV12 4:2:0 YCbCr semi-planar format
pub const NV12: FourCC = FourCC(*b"NV12");

/// NV16 4:2:2 YCbCr semi-planar format
pub const NV16: FourCC = FourCC(*b"NV16");

/// Surface layouts the VEU reads and writes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Packed 16-bit RGB, single plane
    Rgb565,
    /// Luma plane followed by an interleaved CbCr plane at half height
    YCbCr420,
    /// Luma plane followed by an interleaved CbCr plane at full height
    YCbCr422,
}

impl PixelFormat {
    pub fn fourcc(self) -> FourCC {
        match self {
            PixelFormat::Rgb565 => RGB565,
            PixelFormat::YCbCr420 => NV12,
            PixelFormat::YCbCr422 => NV16,
        }
    }

    pub fn is_rgb(self) -> bool {
        matches!(self, PixelFormat::Rgb565)
    }

    /// Bytes occupied by a tightly packed `width` x `height` frame.
    pub fn frame_size(self, width: u32, height: u32) -> usize {
        let pixels = width as usize * height as usize;
        match self {
            PixelFormat::Rgb565 | PixelFormat::YCbCr422 => pixels * 2,
            PixelFormat::YCbCr420 => pixels * 3 / 2,
        }
    }
}

impl TryFrom<FourCC> for PixelFormat {
    type Error = Error;

    fn try_from(fourcc: FourCC) -> Result<Self, Self::Error> {
        match fourcc {
            RGB565 => Ok(PixelFormat::Rgb565),
            NV12 => Ok(PixelFormat::YCbCr420),
            NV16 => Ok(PixelFormat::YCbCr422),
            other => Err(Violation::UnsupportedFormat(other).into()),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PixelFormat::Rgb565 => f.write_str("RGB565"),
            PixelFormat::YCbCr420 => f.write_str("YCbCr420"),
            PixelFormat::YCbCr422 => f.write_str("YCbCr422"),
        }
    }
}

/// YCbCr quantisation range.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Range {
    /// Studio swing, 16..235 luma
    #[default]
    Compressed,
    /// Full swing, 0..255 luma
    Full,
}

/// YCbCr colour matrix.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Matrix {
    #[default]
    Bt601,
    Bt709,
}

/// How the YCbCr samples of a surface are to be interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColorSpace {
    pub range: Range,
    pub matrix: Matrix,
}

/// Anything that can name a plane by its 32-bit bus address.
pub trait PlaneAddress: Copy {
    fn bus_address(&self) -> u32;

    /// The address `bytes` further into the plane.
    fn offset(self, bytes: u32) -> Self;
}

impl PlaneAddress for u32 {
    fn bus_address(&self) -> u32 {
        *self
    }

    fn offset(self, bytes: u32) -> Self {
        self.wrapping_add(bytes)
    }
}

impl PlaneAddress for PhysAddr {
    fn bus_address(&self) -> u32 {
        self.0
    }

    fn offset(self, bytes: u32) -> Self {
        PhysAddr::offset(self, bytes)
    }
}

/// One surface of a transform.
///
/// The engine never allocates memory; plane addresses must point at buffers
/// the caller got from a physically contiguous allocator such as
/// [`uiomux::MemPool`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageDescriptor<A = u32> {
    /// Luma or RGB plane
    pub py: A,
    /// Interleaved chroma plane, ignored for RGB565
    pub pc: A,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Line pitch of the luma/RGB plane in pixels. The engine's line length
    /// register takes bytes, so the pitch is doubled for RGB565.
    pub pitch: u32,
    pub format: PixelFormat,
    pub color: ColorSpace,
}

impl<A: PlaneAddress> ImageDescriptor<A> {
    /// Describes a tightly packed surface: pitch equals width and the
    /// default colour space applies.
    pub fn new(py: A, pc: A, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            py,
            pc,
            width,
            height,
            pitch: width,
            format,
            color: ColorSpace::default(),
        }
    }

    pub fn with_pitch(mut self, pitch: u32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_color(mut self, color: ColorSpace) -> Self {
        self.color = color;
        self
    }

    /// Narrows the surface to the `width` x `height` window whose top-left
    /// pixel is at `(x, y)`.
    ///
    /// Both plane addresses move to the window and the pitch is kept.
    /// Chroma samples cover pixel pairs, so YCbCr windows must start on an
    /// even column, and YCbCr420 windows on an even row as well.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::CropOutOfBounds`] if the window leaves the
    /// surface or starts off the chroma grid.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Self, Error> {
        let out = || {
            Error::from(Violation::CropOutOfBounds {
                x,
                y,
                width,
                height,
            })
        };

        let inside = x.checked_add(width).is_some_and(|r| r <= self.width)
            && y.checked_add(height).is_some_and(|b| b <= self.height);
        let on_grid = match self.format {
            PixelFormat::Rgb565 => true,
            PixelFormat::YCbCr422 => x % 2 == 0,
            PixelFormat::YCbCr420 => x % 2 == 0 && y % 2 == 0,
        };
        if !inside || !on_grid {
            return Err(out());
        }

        let pitch = u64::from(self.pitch);
        let (col, row) = (u64::from(x), u64::from(y));
        let (luma, chroma) = match self.format {
            PixelFormat::Rgb565 => ((row * pitch + col) * 2, 0),
            PixelFormat::YCbCr422 => (row * pitch + col, row * pitch + col),
            PixelFormat::YCbCr420 => (row * pitch + col, row / 2 * pitch + col),
        };
        let luma = u32::try_from(luma).map_err(|_| out())?;
        let chroma = u32::try_from(chroma).map_err(|_| out())?;

        Ok(Self {
            py: self.py.offset(luma),
            pc: if self.format.is_rgb() {
                self.pc
            } else {
                self.pc.offset(chroma)
            },
            width,
            height,
            ..*self
        })
    }

    /// Pixel count, counted in 64 bits to stay exact at 4092x4092.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl<A> ImageDescriptor<A> {
    /// Line length in bytes of the luma or RGB plane, `None` on overflow.
    pub fn line_length(&self) -> Option<u32> {
        if self.format.is_rgb() {
            self.pitch.checked_mul(2)
        } else {
            Some(self.pitch)
        }
    }
}

impl<A> fmt::Display for ImageDescriptor<A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {} pitch:{}",
            self.width, self.height, self.format, self.pitch
        )
    }
}

/// Image rotation supported by the VEU.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    /// No rotation
    #[default]
    Rotation0,
    /// Rotate 90 degrees clockwise
    Rotation90,
}

/// A complete transform: scale or rotate, crop and convert `source` into
/// `destination`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransformRequest<A = u32> {
    pub source: ImageDescriptor<A>,
    pub destination: ImageDescriptor<A>,
    pub rotation: Rotation,
}

impl<A: PlaneAddress> TransformRequest<A> {
    pub fn new(source: ImageDescriptor<A>, destination: ImageDescriptor<A>) -> Self {
        Self {
            source,
            destination,
            rotation: Rotation::Rotation0,
        }
    }

    pub fn rotated(source: ImageDescriptor<A>, destination: ImageDescriptor<A>) -> Self {
        Self {
            source,
            destination,
            rotation: Rotation::Rotation90,
        }
    }

    pub fn rotate(&self) -> bool {
        self.rotation == Rotation::Rotation90
    }
}

impl<A: PlaneAddress + Default> TransformRequest<A> {
    /// Colour conversion of an NV12 frame into an RGB565 frame of the same
    /// size. Pitches are in pixels.
    pub fn nv12_to_rgb565(
        y_in: A,
        c_in: A,
        rgb_out: A,
        width: u32,
        height: u32,
        pitch_in: u32,
        pitch_out: u32,
    ) -> Self {
        Self::new(
            ImageDescriptor::new(y_in, c_in, width, height, PixelFormat::YCbCr420)
                .with_pitch(pitch_in),
            ImageDescriptor::new(rgb_out, A::default(), width, height, PixelFormat::Rgb565)
                .with_pitch(pitch_out),
        )
    }

    /// Colour conversion of a packed RGB565 frame into a packed NV12 frame
    /// of the same size.
    pub fn rgb565_to_nv12(rgb_in: A, y_out: A, c_out: A, width: u32, height: u32) -> Self {
        Self::new(
            ImageDescriptor::new(rgb_in, A::default(), width, height, PixelFormat::Rgb565),
            ImageDescriptor::new(y_out, c_out, width, height, PixelFormat::YCbCr420),
        )
    }
}
