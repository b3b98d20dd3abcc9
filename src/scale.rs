// SPDX-License-Identifier: Apache-2.0

//! Fixed-point resize coefficients for VRFCR, VRFSR and VRPBR.

use crate::generation::Generation;

/// Number of fraction steps per unit in the resize ratio.
const FIXED_ONE: u32 = 4096;

/// Passband value for a unity or enlarging filter.
const PASSBAND_UNITY: u32 = 64;

/// Resize ratio for one axis in the engine's 4.12 fixed-point form.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Coefficient {
    pub mant: u32,
    pub frac: u32,
}

impl Coefficient {
    /// Computes the coefficient for resizing `size_in` pixels to `size_out`.
    ///
    /// The fraction is kept on a multiple of 8: inexact values are rounded
    /// down when enlarging and up when reducing. Equal sizes give exactly
    /// zero so a 1:1 axis does not drift.
    ///
    /// Both sizes must be at least 1; validated requests have them in
    /// `16..=4092`.
    pub fn compute(size_in: u32, size_out: u32) -> Self {
        if size_in == size_out {
            return Self::default();
        }

        let fixed = FIXED_ONE * (size_in - 1) / (size_out + 1);
        let mant = fixed / FIXED_ONE;
        let mut frac = fixed - mant * FIXED_ONE;

        if frac & 0x07 != 0 {
            frac &= !0x07;
            if size_out > size_in {
                // only reaches zero for enlargements far beyond 16x
                frac = frac.saturating_sub(8);
            } else {
                frac += 8;
            }
        }

        Self { mant, frac }
    }

    /// The 16-bit VRFCR field.
    pub fn packed(&self) -> u32 {
        (self.mant << 12) | self.frac
    }

    /// Resize filter passband tuning for the VEU3F.
    ///
    /// `zoom` is the request-wide enlarge decision, not this axis' own.
    pub fn passband(&self, zoom: bool) -> u32 {
        if zoom {
            return PASSBAND_UNITY;
        }
        let scale_factor = match self.mant {
            8..=15 => 4,
            4..=7 => 2,
            _ => 1,
        };
        match FIXED_ONE * self.mant + self.frac {
            // 1:1, the ratio is exactly one
            0 => PASSBAND_UNITY,
            ratio => PASSBAND_UNITY * FIXED_ONE * scale_factor / ratio,
        }
    }
}

/// Register settings for one resize axis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AxisScale {
    pub coefficient: Coefficient,
    /// Output size, written to the VRFSR clip field
    pub clip: u32,
    /// VRPBR value, present only on generations with the register
    pub passband: Option<u32>,
}

impl AxisScale {
    pub fn compute(size_in: u32, size_out: u32, zoom: bool, generation: Generation) -> Self {
        let coefficient = Coefficient::compute(size_in, size_out);
        Self {
            coefficient,
            clip: size_out,
            passband: generation
                .has_passband()
                .then(|| coefficient.passband(zoom)),
        }
    }
}

/// Resize settings for both axes of a request.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Scaling {
    pub horizontal: AxisScale,
    pub vertical: AxisScale,
    /// Whether the output has more pixels than the input overall
    pub zoom: bool,
}

impl Scaling {
    /// Computes both axes for resizing `source` to `destination`, each given
    /// as `(width, height)`.
    pub fn compute(source: (u32, u32), destination: (u32, u32), generation: Generation) -> Self {
        let src_area = u64::from(source.0) * u64::from(source.1);
        let dst_area = u64::from(destination.0) * u64::from(destination.1);
        let zoom = dst_area > src_area;

        Self {
            horizontal: AxisScale::compute(source.0, destination.0, zoom, generation),
            vertical: AxisScale::compute(source.1, destination.1, zoom, generation),
            zoom,
        }
    }

    /// VRFCR: vertical coefficient in the high half, horizontal in the low.
    pub fn vrfcr(&self) -> u32 {
        halves(
            self.vertical.coefficient.packed(),
            self.horizontal.coefficient.packed(),
        )
    }

    /// VRFSR: vertical clip in the high half, horizontal in the low.
    pub fn vrfsr(&self) -> u32 {
        halves(self.vertical.clip, self.horizontal.clip)
    }

    /// VRPBR, if the generation has it.
    pub fn vrpbr(&self) -> Option<u32> {
        let vertical = self.vertical.passband?;
        let horizontal = self.horizontal.passband?;
        Some(halves(vertical, horizontal))
    }
}

fn halves(high: u32, low: u32) -> u32 {
    (high << 16) | (low & 0xffff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unity_is_zero() {
        for size in [16, 17, 100, 176, 1280, 4092] {
            assert_eq!(Coefficient::compute(size, size), Coefficient::default());
        }
    }

    #[test]
    fn test_known_coefficients() {
        let cases = [
            (320, 640, 0, 2024),
            (176, 352, 0, 2016),
            (640, 320, 1, 4064),
            (352, 176, 1, 4032),
            (720, 480, 1, 2032),
            (1280, 160, 7, 3872),
            (4092, 256, 15, 3768),
            (100, 99, 0, 4056),
        ];
        for (size_in, size_out, mant, frac) in cases {
            assert_eq!(
                Coefficient::compute(size_in, size_out),
                Coefficient { mant, frac },
                "{size_in} -> {size_out}"
            );
        }
    }

    #[test]
    fn test_fraction_is_multiple_of_eight() {
        for size_in in (16..=4092).step_by(37) {
            let lo = (size_in / 16).max(16);
            let hi = (size_in * 16).min(4092);
            for size_out in (lo..=hi).step_by(13) {
                let c = Coefficient::compute(size_in, size_out);
                assert_eq!(c.frac % 8, 0, "{size_in} -> {size_out}");
                assert!(c.frac <= 4096, "{size_in} -> {size_out}");
            }
        }
    }

    #[test]
    fn test_packed() {
        assert_eq!(Coefficient { mant: 1, frac: 4064 }.packed(), 0x1fe0);
        assert_eq!(Coefficient { mant: 7, frac: 3872 }.packed(), 0x7f20);
    }

    #[test]
    fn test_passband() {
        let c = Coefficient::compute(640, 320);
        assert_eq!(c.passband(true), 64);
        assert_eq!(c.passband(false), 32);

        // scale factor 2 for mantissa 4..8
        assert_eq!(Coefficient::compute(1280, 160).passband(false), 16);
        // scale factor 4 for mantissa 8..16
        assert_eq!(Coefficient::compute(4092, 256).passband(false), 16);
        // an enlarging axis inside an overall reduction
        assert_eq!(Coefficient::compute(320, 640).passband(false), 129);
        assert_eq!(Coefficient::default().passband(false), 64);
    }

    #[test]
    fn test_zoom_is_global() {
        // wider but much shorter: fewer pixels overall
        let s = Scaling::compute((320, 240), (640, 60), Generation::Veu3f);
        assert!(!s.zoom);
        assert_eq!(s.horizontal.passband, Some(129));

        let s = Scaling::compute((320, 240), (640, 480), Generation::Veu3f);
        assert!(s.zoom);
        assert_eq!(s.horizontal.passband, Some(64));
        assert_eq!(s.vertical.passband, Some(64));
    }

    #[test]
    fn test_register_values() {
        let s = Scaling::compute((320, 240), (640, 480), Generation::Veu3f);
        assert_eq!(s.horizontal.coefficient, Coefficient { mant: 0, frac: 2024 });
        assert_eq!(s.vertical.coefficient, Coefficient { mant: 0, frac: 2024 });
        assert_eq!(s.vrfcr(), 0x07e8_07e8);
        assert_eq!(s.vrfsr(), (480 << 16) | 640);
        assert_eq!(s.vrpbr(), Some((64 << 16) | 64));
    }

    #[test]
    fn test_no_passband_on_veu2h() {
        let s = Scaling::compute((640, 480), (320, 240), Generation::Veu2h);
        assert_eq!(s.vrpbr(), None);
        assert_eq!(s.horizontal.passband, None);
        assert_eq!(s.vrfcr(), (0x1fd0 << 16) | 0x1fe0);
    }
}
