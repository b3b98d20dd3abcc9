// SPDX-License-Identifier: Apache-2.0

use core::fmt;
use tracing::warn;

/// Register block size of the VEU2H (SH7723).
pub const VEU2H_BLOCK_SIZE: usize = 0x27c;

/// Register block size of the VEU3F (SH7722/SH7724), which ends right after
/// the passband register.
pub const VEU3F_BLOCK_SIZE: usize = 0xcc;

/// Hardware generation of the VEU.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Generation {
    /// Generation A: at most 8x upscale, needs an explicit colour conversion
    /// matrix, no passband register.
    Veu2h,
    /// Generation B: up to 16x upscale, built-in colour matrix, passband
    /// tuning register.
    Veu3f,
}

impl Generation {
    /// Identifies the generation from the size of its register block.
    ///
    /// Unknown sizes get the VEU2H capability set, which is the smaller of
    /// the two.
    pub fn detect(block_size: usize) -> Self {
        match block_size {
            VEU2H_BLOCK_SIZE => Generation::Veu2h,
            VEU3F_BLOCK_SIZE => Generation::Veu3f,
            _ => {
                warn!(
                    "unknown VEU register block size {:#x}, assuming {}",
                    block_size,
                    Generation::Veu2h
                );
                Generation::Veu2h
            }
        }
    }

    /// Largest supported upscale factor per axis.
    pub fn max_upscale(self) -> u32 {
        match self {
            Generation::Veu2h => 8,
            Generation::Veu3f => 16,
        }
    }

    pub fn has_passband(self) -> bool {
        matches!(self, Generation::Veu3f)
    }

    /// Whether the colour conversion matrix must be written before every
    /// transform.
    pub fn needs_color_matrix(self) -> bool {
        matches!(self, Generation::Veu2h)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Generation::Veu2h => f.write_str("VEU2H"),
            Generation::Veu3f => f.write_str("VEU3F"),
        }
    }
}
