// SPDX-License-Identifier: Apache-2.0

//! VEU register map. Offsets are in bytes from the start of the register
//! block.

/// Start
pub const VESTR: u32 = 0x00;
/// Source line length
pub const VESWR: u32 = 0x10;
/// Source image size
pub const VESSR: u32 = 0x14;
/// Source Y/RGB plane address
pub const VSAYR: u32 = 0x18;
/// Source C plane address
pub const VSACR: u32 = 0x1c;
/// Bundle mode
pub const VBSSR: u32 = 0x20;
/// Destination line length
pub const VEDWR: u32 = 0x30;
/// Destination Y/RGB plane address
pub const VDAYR: u32 = 0x34;
/// Destination C plane address
pub const VDACR: u32 = 0x38;
/// Transform control
pub const VTRCR: u32 = 0x50;
/// Resize scale
pub const VRFCR: u32 = 0x54;
/// Resize clip
pub const VRFSR: u32 = 0x58;
/// Filter mode
pub const VFMCR: u32 = 0x70;
/// Byte/word swap
pub const VSWPR: u32 = 0x94;
/// Interrupt enable
pub const VEIER: u32 = 0xa0;
/// Interrupt event
pub const VEVTR: u32 = 0xa4;
/// Status
pub const VSTAR: u32 = 0xb0;
/// Software reset
pub const VBSRR: u32 = 0xb4;
/// Resize passband (VEU3F only)
pub const VRPBR: u32 = 0xc8;

/// Colour conversion matrix coefficients, row major (VEU2H only)
pub const VMCR: [u32; 9] = [
    0x200, 0x204, 0x208, 0x20c, 0x210, 0x214, 0x218, 0x21c, 0x220,
];
/// Colour conversion offset (VEU2H only)
pub const VCOFFR: u32 = 0x224;

pub const VBSRR_RESET: u32 = 0x100;
pub const VEVTR_ACK: u32 = 0x100;
pub const VSTAR_BUSY: u32 = 1 << 0;
pub const VEIER_ENABLE: u32 = 1;
pub const VESTR_START: u32 = 1;
pub const VFMCR_ROTATE: u32 = 1;

pub const VTRCR_DST_FMT_YCBCR420: u32 = 0 << 22;
pub const VTRCR_DST_FMT_YCBCR422: u32 = 1 << 22;
pub const VTRCR_DST_FMT_RGB565: u32 = 6 << 16;
pub const VTRCR_SRC_FMT_YCBCR420: u32 = 0 << 14;
pub const VTRCR_SRC_FMT_YCBCR422: u32 = 1 << 14;
pub const VTRCR_SRC_FMT_RGB565: u32 = 3 << 8;
pub const VTRCR_BT709: u32 = 1 << 3;
pub const VTRCR_FULL_COLOR_CONV: u32 = 1 << 2;
pub const VTRCR_TE_BIT_SET: u32 = 1 << 1;
pub const VTRCR_RY_SRC_RGB: u32 = 1;

pub const VSWPR_SRC_RGB: u32 = 0x06;
pub const VSWPR_SRC_YCBCR: u32 = 0x07;
pub const VSWPR_DST_RGB: u32 = 0x60;
pub const VSWPR_DST_YCBCR: u32 = 0x70;

/// BT.601 YCbCr to RGB coefficients loaded into VMCR on the VEU2H, which has
/// no built-in default matrix.
pub const VEU2H_MATRIX: [u32; 9] = [
    0x0cc5, 0x0950, 0x0000, 0x397f, 0x0950, 0x3cdd, 0x0000, 0x0950, 0x1023,
];
pub const VEU2H_COLOR_OFFSET: u32 = 0x0080_0010;
