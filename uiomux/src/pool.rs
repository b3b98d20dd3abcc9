// SPDX-License-Identifier: Apache-2.0

use crate::mapping::Mapping;
use std::{fmt, io};
use tracing::debug;

/// A 32-bit bus address as seen by the multimedia engines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u32);

impl PhysAddr {
    pub fn offset(self, bytes: u32) -> Self {
        Self(self.0.wrapping_add(bytes))
    }
}

impl From<PhysAddr> for u32 {
    fn from(addr: PhysAddr) -> Self {
        addr.0
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A buffer carved out of a [`MemPool`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Buffer {
    /// Bus address of the first byte
    pub phys: PhysAddr,
    /// Byte offset of the buffer inside the pool mapping
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
}

/// Bump allocator over a reserved, physically contiguous memory map.
///
/// Buffers are never freed individually; [`MemPool::reset`] releases them all.
#[derive(Debug)]
pub struct MemPool {
    mapping: Mapping,
    base: u32,
    next: usize,
}

impl MemPool {
    /// Wraps a mapping of the device's memory reservation.
    ///
    /// # Errors
    ///
    /// Fails if the reservation does not sit entirely below 4 GiB, since the
    /// engines only take 32-bit addresses.
    pub fn new(mapping: Mapping) -> io::Result<Self> {
        let end = mapping.phys_addr() + mapping.size() as u64;
        if end > u64::from(u32::MAX) + 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("memory map at {:#x} is not 32-bit addressable", mapping.phys_addr()),
            ));
        }
        Ok(Self {
            base: mapping.phys_addr() as u32,
            mapping,
            next: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.mapping.size()
    }

    pub fn used(&self) -> usize {
        self.next
    }

    /// Allocates `len` bytes with the bus address aligned to `align` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidInput`] if `align` is not a power of
    /// two and [`io::ErrorKind::OutOfMemory`] if the pool is exhausted.
    pub fn alloc(&mut self, len: usize, align: usize) -> io::Result<Buffer> {
        let (offset, end) = carve(self.base, self.next, len, align, self.capacity())?;
        self.next = end;
        let buf = Buffer {
            phys: PhysAddr(self.base + offset as u32),
            offset,
            len,
        };
        debug!("pool alloc {} bytes at {}", len, buf.phys);
        Ok(buf)
    }

    /// Releases every buffer handed out so far.
    pub fn reset(&mut self) {
        self.next = 0;
    }

    pub fn slice(&self, buf: &Buffer) -> &[u8] {
        self.mapping
            .bytes(buf.offset, buf.len)
            .unwrap_or_default()
    }

    pub fn slice_mut(&mut self, buf: &Buffer) -> &mut [u8] {
        self.mapping
            .bytes_mut(buf.offset, buf.len)
            .unwrap_or_default()
    }
}

/// Computes the `(offset, end)` of the next allocation inside a pool whose
/// first byte sits at bus address `base`.
fn carve(
    base: u32,
    next: usize,
    len: usize,
    align: usize,
    capacity: usize,
) -> io::Result<(usize, usize)> {
    if !align.is_power_of_two() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("alignment {align} is not a power of two"),
        ));
    }
    let addr = base as usize + next;
    let offset = addr.next_multiple_of(align) - base as usize;
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok((offset, end)),
        _ => Err(io::Error::new(
            io::ErrorKind::OutOfMemory,
            format!("pool exhausted: {len} bytes requested, {} free", capacity.saturating_sub(next)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carve_aligns_bus_address() {
        // pool base is only 16-byte aligned
        let (offset, end) = carve(0x0d00_0010, 0, 100, 32, 4096).unwrap();
        assert_eq!(offset, 0x10);
        assert_eq!(end, 0x10 + 100);

        let (offset, end) = carve(0x0d00_0010, end, 8, 32, 4096).unwrap();
        assert_eq!((0x0d00_0010 + offset) % 32, 0);
        assert_eq!(end, offset + 8);
    }

    #[test]
    fn test_carve_exhausted() {
        let err = carve(0x1000, 0, 4097, 32, 4096).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
        assert!(carve(0x1000, 0, 4096, 32, 4096).is_ok());
    }

    #[test]
    fn test_carve_bad_alignment() {
        let err = carve(0x1000, 0, 16, 24, 4096).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_phys_offset() {
        assert_eq!(PhysAddr(0x100).offset(0x20), PhysAddr(0x120));
        assert_eq!(PhysAddr(0x0d00_0000).to_string(), "0x0d000000");
    }
}
