// SPDX-License-Identifier: Apache-2.0

use crate::image::FourCC;
use std::{fmt, io, time::Duration};
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors reported by the VEU driver.
#[derive(Debug, Error)]
pub enum Error {
    /// The request breaks one of the engine's constraints. No register was
    /// touched; correct the request and retry.
    #[error("invalid request: {0}")]
    InvalidRequest(Violation),

    /// The engine could not be found, mapped or locked.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(#[source] io::Error),

    /// The engine did not behave as expected after starting. The handle
    /// should be closed and reopened.
    #[error("hardware fault: {0}")]
    HardwareFault(Fault),
}

impl From<Violation> for Error {
    fn from(violation: Violation) -> Self {
        Error::InvalidRequest(violation)
    }
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        Error::HardwareFault(fault)
    }
}

/// Which surface of a request a violation refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    Source,
    Destination,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::Source => f.write_str("source"),
            Side::Destination => f.write_str("destination"),
        }
    }
}

/// Resize axis.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Axis::Horizontal => f.write_str("horizontal"),
            Axis::Vertical => f.write_str("vertical"),
        }
    }
}

/// The specific rule a rejected request broke.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(FourCC),

    #[error("{side} line pitch {pitch} is odd")]
    OddPitch { side: Side, pitch: u32 },

    #[error("{side} pitch {pitch} is below width {width} or overflows the line length register")]
    PitchOutOfRange { side: Side, pitch: u32, width: u32 },

    #[error("{side} size {width}x{height} outside 16..=4092")]
    DimensionOutOfRange { side: Side, width: u32, height: u32 },

    #[error("crop {width}x{height} at ({x}, {y}) is outside the surface or off the chroma grid")]
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error(
        "rotation needs swapped geometry, got {}x{} -> {}x{}",
        .from.0, .from.1, .to.0, .to.1
    )]
    RotationGeometry { from: (u32, u32), to: (u32, u32) },

    #[error("{axis} upscale {from} -> {to} exceeds {limit}x")]
    UpscaleTooLarge {
        axis: Axis,
        from: u32,
        to: u32,
        limit: u32,
    },

    #[error("{axis} downscale {from} -> {to} exceeds 16x")]
    DownscaleTooLarge { axis: Axis, from: u32, to: u32 },

    #[error("a transfer is still in flight on this handle")]
    TransferInFlight,
}

/// Unexpected engine behaviour.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("busy bit still set after {waited:?} (status {status:#x})")]
    StuckBusy { status: u32, waited: Duration },

    #[error("handle faulted earlier, reopen the device")]
    Poisoned,
}
