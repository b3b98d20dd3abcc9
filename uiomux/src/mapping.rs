// SPDX-License-Identifier: Apache-2.0

use crate::device::MapInfo;
use std::{
    ffi::c_void,
    fs::File,
    io,
    os::fd::AsRawFd,
    ptr::{self, null_mut},
    slice::{from_raw_parts, from_raw_parts_mut},
};
use tracing::{debug, warn};

/// Returns the system page size.
pub fn page_size() -> usize {
    unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

/// One UIO map, mapped into this process.
///
/// All register accesses are volatile and bounds checked against the size
/// the kernel reported for the map, not the page-rounded mapping length.
pub struct Mapping {
    ptr: *mut u8,
    len: usize,
    info: MapInfo,
}

// Safety: the mapping is owned by this value; register access goes through
// volatile reads/writes and writes require &mut self.
unsafe impl Send for Mapping {}

impl Mapping {
    pub(crate) fn new(file: &File, index: usize, info: MapInfo) -> io::Result<Self> {
        if info.size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("map {index} is empty"),
            ));
        }
        let page = page_size();
        let len = info.size.div_ceil(page) * page;

        let ptr = unsafe {
            libc::mmap(
                null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                (index * page) as libc::off_t,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        debug!(
            "mapped map{} phys {:#x} size {:#x} at {:p}",
            index, info.addr, info.size, ptr
        );
        Ok(Self {
            ptr: ptr as *mut u8,
            len,
            info,
        })
    }

    /// Physical base address of the map.
    pub fn phys_addr(&self) -> u64 {
        self.info.addr
    }

    /// Size of the map as reported by the kernel.
    pub fn size(&self) -> usize {
        self.info.size
    }

    fn in_bounds(&self, offset: usize, width: usize) -> bool {
        offset % width == 0 && offset.checked_add(width).is_some_and(|end| end <= self.info.size)
    }

    /// Reads the 32-bit word at byte `offset`.
    #[inline]
    pub fn read32(&self, offset: usize) -> Option<u32> {
        if !self.in_bounds(offset, 4) {
            return None;
        }
        Some(unsafe { ptr::read_volatile(self.ptr.add(offset) as *const u32) })
    }

    /// Writes the 32-bit word at byte `offset`. Returns `false` when the
    /// offset is outside the map.
    #[inline]
    pub fn write32(&mut self, offset: usize, value: u32) -> bool {
        if !self.in_bounds(offset, 4) {
            return false;
        }
        unsafe { ptr::write_volatile(self.ptr.add(offset) as *mut u32, value) };
        true
    }

    /// CPU view of `len` bytes at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        if end > self.info.size {
            return None;
        }
        Some(unsafe { from_raw_parts(self.ptr.add(offset), len) })
    }

    /// Mutable CPU view of `len` bytes at `offset`.
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        let end = offset.checked_add(len)?;
        if end > self.info.size {
            return None;
        }
        Some(unsafe { from_raw_parts_mut(self.ptr.add(offset), len) })
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        if unsafe { libc::munmap(self.ptr.cast::<c_void>(), self.len) } != 0 {
            warn!("munmap of {:#x} failed!", self.info.addr);
        }
    }
}

impl std::fmt::Debug for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapping")
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("phys", &format_args!("{:#x}", self.info.addr))
            .field("size", &format_args!("{:#x}", self.info.size))
            .finish()
    }
}
