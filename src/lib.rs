// SPDX-License-Identifier: Apache-2.0

//! # SH-Mobile VEU Driver Library
//!
//! This library drives the VEU, the fixed-function video engine of the
//! SH-Mobile application processors. The VEU scales, rotates by 90 degrees,
//! crops and converts between planar YCbCr and packed RGB565 surfaces; this
//! crate turns a declarative [`TransformRequest`] into the register writes
//! that make it do so and synchronizes the caller with its completion.
//!
//! ## Features
//!
//! - **Constraint Validation**: Requests are checked against the engine's
//!   format, pitch, size and scaling ratio limits before any register is
//!   touched.
//! - **Generation Detection**: The VEU2H and VEU3F are told apart by the size
//!   of their register block, selecting the scaling limit, colour matrix and
//!   passband handling.
//! - **Register Programming**: Fixed-point resize coefficients, rotation
//!   offsets and transform control bits are computed as a pure
//!   [`RegisterProgram`].
//! - **Exclusive Execution**: Every handle on a unit shares one lock; a
//!   transform holds it from its first register write until its completion
//!   interrupt is acknowledged.
//!
//! ## Example
//!
//! ```no_run
//! use shveu::{memory_pool, Config, Device, ImageDescriptor, PixelFormat, TransformRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let mut pool = memory_pool(&config)?;
//! let mut veu = Device::open_with(&config)?;
//!
//! let src_buf = pool.alloc(PixelFormat::YCbCr420.frame_size(320, 240), 32)?;
//! let dst_buf = pool.alloc(PixelFormat::Rgb565.frame_size(640, 480), 32)?;
//!
//! let src = ImageDescriptor::new(
//!     src_buf.phys,
//!     src_buf.phys.offset(320 * 240),
//!     320,
//!     240,
//!     PixelFormat::YCbCr420,
//! );
//! let dst = ImageDescriptor::new(dst_buf.phys, dst_buf.phys, 640, 480, PixelFormat::Rgb565);
//!
//! // Upscale and convert to RGB565
//! veu.transform(&TransformRequest::new(src, dst))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Requirements
//!
//! - **Linux**: The VEU exported through `uio_pdrv_genirq`, with its
//!   reserved memory as the second UIO map.
//!
//! ## Safety
//!
//! Register and buffer memory is reached through `mmap` in the [`uiomux`]
//! crate; this crate contains no `unsafe` code.

pub mod device;
pub mod error;
pub mod generation;
pub mod image;
pub mod lock;
pub mod program;
pub mod registers;
pub mod regs;
pub mod rotate;
pub mod scale;
pub mod validate;

pub use device::{memory_pool, Completion, CompletionSource, Config, Device, Transfer};
pub use error::{Axis, Error, Fault, Result, Side, Violation};
pub use generation::Generation;
pub use image::{
    ColorSpace, FourCC, ImageDescriptor, Matrix, PixelFormat, PlaneAddress, Range, Rotation,
    TransformRequest,
};
pub use lock::{ProcessLock, UnitLock};
pub use program::{RegisterProgram, RegisterWrite};
pub use registers::RegisterBlock;
pub use uiomux;
