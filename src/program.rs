// SPDX-License-Identifier: Apache-2.0

use crate::{
    generation::Generation,
    image::{ImageDescriptor, Matrix, PixelFormat, PlaneAddress, Range, TransformRequest},
    regs::*,
    rotate::rotation_offset,
    scale::Scaling,
};
use core::fmt;

/// A single register write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegisterWrite {
    pub offset: u32,
    pub value: u32,
}

/// The ordered register writes that carry out one transform.
///
/// Writes must be issued in order; the last one is always the start trigger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterProgram {
    writes: Vec<RegisterWrite>,
}

impl RegisterProgram {
    /// Builds the program for an already validated `request`.
    ///
    /// Resize coefficients are always computed since the clip registers carry
    /// the output size in rotation mode too; the rotation offset is only
    /// applied when rotating.
    pub fn build<A: PlaneAddress>(request: &TransformRequest<A>, generation: Generation) -> Self {
        let src = &request.source;
        let dst = &request.destination;
        let scaling = Scaling::compute(
            (src.width, src.height),
            (dst.width, dst.height),
            generation,
        );
        let offset = request
            .rotate()
            .then(|| rotation_offset(src.height, dst.format));
        Self::assemble(request, &scaling, offset, generation)
    }

    /// Lays out the program from precomputed resize and rotation values.
    pub fn assemble<A: PlaneAddress>(
        request: &TransformRequest<A>,
        scaling: &Scaling,
        rotation_offset: Option<u32>,
        generation: Generation,
    ) -> Self {
        let src = &request.source;
        let dst = &request.destination;
        let mut p = Self {
            writes: Vec::with_capacity(32),
        };

        p.push(VBSRR, VBSRR_RESET);

        p.push(VSAYR, src.py.bus_address());
        p.push(VSACR, src.pc.bus_address());
        p.push(VESSR, (src.height << 16) | src.width);
        p.push(VESWR, line_length(src));
        p.push(VBSSR, 0);

        let offset = rotation_offset.unwrap_or(0);
        p.push(VDAYR, dst.py.bus_address().wrapping_add(offset));
        p.push(VDACR, dst.pc.bus_address().wrapping_add(offset));
        p.push(VEDWR, line_length(dst));

        p.push(VSWPR, swap_control(src.format, dst.format));
        p.push(VTRCR, transform_control(src, dst));

        if generation.needs_color_matrix() {
            for (reg, coeff) in VMCR.iter().zip(VEU2H_MATRIX) {
                p.push(*reg, coeff);
            }
            p.push(VCOFFR, VEU2H_COLOR_OFFSET);
        }

        p.push(VRFCR, scaling.vrfcr());
        p.push(VRFSR, scaling.vrfsr());
        if generation.has_passband() {
            if let Some(vrpbr) = scaling.vrpbr() {
                p.push(VRPBR, vrpbr);
            }
        }

        if rotation_offset.is_some() {
            p.push(VFMCR, VFMCR_ROTATE);
            p.push(VRFCR, 0);
        } else {
            p.push(VFMCR, 0);
        }

        p.push(VEIER, VEIER_ENABLE);
        p.push(VESTR, VESTR_START);
        p
    }

    fn push(&mut self, offset: u32, value: u32) {
        self.writes.push(RegisterWrite { offset, value });
    }

    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisterWrite> {
        self.writes.iter()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Final value written to `offset`, if the program writes it at all.
    pub fn value_of(&self, offset: u32) -> Option<u32> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.offset == offset)
            .map(|w| w.value)
    }
}

impl<'a> IntoIterator for &'a RegisterProgram {
    type Item = &'a RegisterWrite;
    type IntoIter = std::slice::Iter<'a, RegisterWrite>;

    fn into_iter(self) -> Self::IntoIter {
        self.writes.iter()
    }
}

impl fmt::Display for RegisterProgram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for w in &self.writes {
            writeln!(f, "{:#05x} <- {:#010x}", w.offset, w.value)?;
        }
        Ok(())
    }
}

/// Hardware line length: the pitch in bytes of the addressed plane.
///
/// Validated requests always fit; an overflowing pitch saturates rather than
/// wrapping around.
fn line_length<A>(img: &ImageDescriptor<A>) -> u32 {
    img.line_length().unwrap_or(u32::MAX)
}

fn swap_control(src: PixelFormat, dst: PixelFormat) -> u32 {
    let src = if src.is_rgb() {
        VSWPR_SRC_RGB
    } else {
        VSWPR_SRC_YCBCR
    };
    let dst = if dst.is_rgb() {
        VSWPR_DST_RGB
    } else {
        VSWPR_DST_YCBCR
    };
    src | dst
}

fn transform_control<A>(src: &ImageDescriptor<A>, dst: &ImageDescriptor<A>) -> u32 {
    let mut vtrcr = match src.format {
        PixelFormat::Rgb565 => VTRCR_RY_SRC_RGB | VTRCR_SRC_FMT_RGB565,
        PixelFormat::YCbCr420 => VTRCR_SRC_FMT_YCBCR420,
        PixelFormat::YCbCr422 => VTRCR_SRC_FMT_YCBCR422,
    };
    vtrcr |= match dst.format {
        PixelFormat::Rgb565 => VTRCR_DST_FMT_RGB565,
        PixelFormat::YCbCr420 => VTRCR_DST_FMT_YCBCR420,
        PixelFormat::YCbCr422 => VTRCR_DST_FMT_YCBCR422,
    };

    if src.format != dst.format {
        vtrcr |= VTRCR_TE_BIT_SET;
        if src.color.range == Range::Full || dst.color.range == Range::Full {
            vtrcr |= VTRCR_FULL_COLOR_CONV;
        }
        if src.color.matrix == Matrix::Bt709 || dst.color.matrix == Matrix::Bt709 {
            vtrcr |= VTRCR_BT709;
        }
    }
    vtrcr
}
