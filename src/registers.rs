// SPDX-License-Identifier: Apache-2.0

use tracing::warn;
use uiomux::Mapping;

/// Typed access to the engine's block of 32-bit registers.
///
/// This is the only way the driver touches hardware memory. Implementations
/// must make every access volatile and keep writes in program order.
pub trait RegisterBlock {
    /// Size of the register block in bytes, used for generation detection.
    fn size(&self) -> usize;

    fn read(&self, offset: u32) -> u32;

    fn write(&mut self, offset: u32, value: u32);
}

impl RegisterBlock for Mapping {
    fn size(&self) -> usize {
        Mapping::size(self)
    }

    fn read(&self, offset: u32) -> u32 {
        self.read32(offset as usize).unwrap_or_else(|| {
            warn!("read of register {:#x} outside the block", offset);
            0
        })
    }

    fn write(&mut self, offset: u32, value: u32) {
        if !self.write32(offset as usize, value) {
            warn!("dropped write of {:#x} to register {:#x} outside the block", value, offset);
        }
    }
}

impl<R: RegisterBlock + ?Sized> RegisterBlock for Box<R> {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn read(&self, offset: u32) -> u32 {
        (**self).read(offset)
    }

    fn write(&mut self, offset: u32, value: u32) {
        (**self).write(offset, value)
    }
}
