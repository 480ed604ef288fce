// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::region::Region;

#[cfg(feature = "std")]
mod faulty;
#[cfg(feature = "std")]
mod linear;

#[cfg(feature = "std")]
pub use faulty::{FaultyMemory, InjectedFault};
#[cfg(feature = "std")]
pub use linear::LinearMemory;

/// Byte-wide access to the memory under test.
///
/// Every call is one direct, synchronous access: no buffering, caching or
/// batching. Accesses are infallible because the engine only ever touches
/// addresses inside a region for which [`MemoryBus::maps`] returned true.
pub trait MemoryBus {
    fn read_u8(&mut self, addr: u64) -> u8;
    fn write_u8(&mut self, addr: u64, value: u8);

    /// True if every address of `region` is backed by this bus.
    fn maps(&self, region: &Region) -> bool;
}

impl<B: MemoryBus + ?Sized> MemoryBus for &mut B {
    fn read_u8(&mut self, addr: u64) -> u8 {
        (**self).read_u8(addr)
    }

    fn write_u8(&mut self, addr: u64, value: u8) {
        (**self).write_u8(addr, value)
    }

    fn maps(&self, region: &Region) -> bool {
        (**self).maps(region)
    }
}

/// Physical memory reached through volatile loads and stores.
#[derive(Debug)]
pub struct VolatileRegion {
    region: Region,
}

impl VolatileRegion {
    /// # Safety
    ///
    /// Every address of `region` must be RAM valid for byte reads and writes.
    /// It must not hold the stack, statics or anything else the running
    /// program relies on, and nothing else may access it while the test runs.
    pub const unsafe fn new(region: Region) -> Self {
        Self { region }
    }

    pub const fn region(&self) -> Region {
        self.region
    }
}

impl MemoryBus for VolatileRegion {
    fn read_u8(&mut self, addr: u64) -> u8 {
        // SAFETY: `addr` lies inside the region handed to `new`, see its contract.
        unsafe { core::ptr::read_volatile(addr as usize as *const u8) }
    }

    fn write_u8(&mut self, addr: u64, value: u8) {
        // SAFETY: as for `read_u8`.
        unsafe { core::ptr::write_volatile(addr as usize as *mut u8, value) }
    }

    fn maps(&self, region: &Region) -> bool {
        self.region.covers(region) && region.end() <= usize::MAX as u64
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_volatile_region_round_trip() {
        let mut cells = [0u8; 16];
        let base = cells.as_mut_ptr() as u64;
        let region = Region::with_len(base, cells.len() as u64).unwrap();

        // SAFETY: the region is exactly `cells`, borrowed for the whole block.
        let mut bus = unsafe { VolatileRegion::new(region) };
        assert!(bus.maps(&region));
        assert!(!bus.maps(&Region::with_len(base, 17).unwrap()));

        bus.write_u8(base + 3, 0x5A);
        assert_eq!(bus.read_u8(base + 3), 0x5A);
        assert_eq!(bus.read_u8(base + 4), 0x00);
        assert_eq!(cells[3], 0x5A);
    }

    #[test]
    fn test_mut_ref_forwards() {
        let mut mem = LinearMemory::new(4, 0x100);
        {
            let mut bus: &mut LinearMemory = &mut mem;
            MemoryBus::write_u8(&mut bus, 0x101, 7);
            assert_eq!(MemoryBus::read_u8(&mut bus, 0x101), 7);
        }
        assert_eq!(mem.get(0x101), Some(7));
    }
}
