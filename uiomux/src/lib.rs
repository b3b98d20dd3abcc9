// SPDX-License-Identifier: Apache-2.0

//! # Userspace I/O plumbing for SH-Mobile multimedia blocks
//!
//! The SH-Mobile kernels expose each multimedia engine (VEU, VPU, BEU, ...)
//! through `uio_pdrv_genirq`. Every engine shows up as a `/dev/uioN` node with
//! a sysfs description of its memory maps: map 0 is the register block and
//! map 1, when present, is a physically contiguous memory reservation the
//! engine can DMA into.
//!
//! This crate covers the parts of driving such an engine that are not specific
//! to any one block:
//!
//! - [`UioDevice`] finds a device by name and reads its map table.
//! - [`Mapping`] is a bounds-checked `mmap` of one map with volatile 32-bit
//!   access.
//! - [`FileLock`] is an exclusive `flock` on the device node, shared by every
//!   process and every handle that opens the same unit.
//! - [`MemPool`] hands out aligned, physically addressed buffers from the
//!   reserved memory map.

mod device;
mod lock;
mod mapping;
mod pool;

pub use device::{MapInfo, UioDevice, DEV_ROOT, SYSFS_UIO_ROOT};
pub use lock::FileLock;
pub use mapping::{page_size, Mapping};
pub use pool::{Buffer, MemPool, PhysAddr};
