// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::MemoryBus;
use crate::region::Region;
use std::collections::TryReserveError;

/// A simple flat memory storage
#[derive(Debug, Clone)]
pub struct LinearMemory {
    data: Vec<u8>,
    base_addr: u64,
}

impl LinearMemory {
    pub fn new(size: usize, base_addr: u64) -> Self {
        Self::with_fill(size, base_addr, 0)
    }

    /// Memory whose prior content is `fill` in every cell.
    pub fn with_fill(size: usize, base_addr: u64, fill: u8) -> Self {
        Self {
            data: vec![fill; size],
            base_addr,
        }
    }

    /// Memory backing exactly `region`.
    ///
    /// Panics if the host cannot allocate `region.len()` bytes; use
    /// [`LinearMemory::try_for_region`] for regions of untrusted size.
    pub fn for_region(region: &Region, fill: u8) -> Self {
        Self::with_fill(region.len() as usize, region.begin(), fill)
    }

    /// Like [`LinearMemory::for_region`], but reports an allocation failure
    /// instead of aborting.
    pub fn try_for_region(region: &Region, fill: u8) -> Result<Self, TryReserveError> {
        let mut data = Vec::new();
        // A length beyond usize can never be reserved.
        let len = usize::try_from(region.len()).unwrap_or(usize::MAX);
        data.try_reserve_exact(len)?;
        data.resize(len, fill);
        Ok(Self {
            data,
            base_addr: region.begin(),
        })
    }

    pub fn base_addr(&self) -> u64 {
        self.base_addr
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Contents of `region`, or `None` if it is not backed by this memory.
    pub fn slice(&self, region: &Region) -> Option<&[u8]> {
        if !self.maps(region) {
            return None;
        }
        let start = (region.begin() - self.base_addr) as usize;
        self.data.get(start..start + region.len() as usize)
    }

    pub fn get(&self, addr: u64) -> Option<u8> {
        self.offset(addr).map(|offset| self.data[offset])
    }

    pub fn set(&mut self, addr: u64, value: u8) -> bool {
        match self.offset(addr) {
            Some(offset) => {
                self.data[offset] = value;
                true
            }
            None => false,
        }
    }

    fn offset(&self, addr: u64) -> Option<usize> {
        let offset = addr.checked_sub(self.base_addr)?;
        if offset < self.data.len() as u64 {
            Some(offset as usize)
        } else {
            None
        }
    }
}

impl MemoryBus for LinearMemory {
    fn read_u8(&mut self, addr: u64) -> u8 {
        // Unmapped reads float high like an open bus.
        self.get(addr).unwrap_or(0xFF)
    }

    fn write_u8(&mut self, addr: u64, value: u8) {
        self.set(addr, value);
    }

    fn maps(&self, region: &Region) -> bool {
        if self.data.is_empty() {
            return false;
        }
        let last = self.base_addr + (self.data.len() as u64 - 1);
        region.begin() >= self.base_addr && region.end() <= last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = LinearMemory::new(1024, 0x1000);

        // Valid write
        assert!(mem.set(0x1000, 42));
        assert!(mem.set(0x13FF, 99)); // Last byte

        // Invalid write (out of bounds)
        assert!(!mem.set(0x0FFF, 1));
        assert!(!mem.set(0x1400, 1));

        assert_eq!(mem.get(0x1000), Some(42));
        assert_eq!(mem.get(0x13FF), Some(99));
        assert_eq!(mem.get(0x0FFF), None);
        assert_eq!(mem.get(0x1400), None);
    }

    #[test]
    fn test_bus_reads_float_high_outside_memory() {
        let mut mem = LinearMemory::new(4, 0x10);
        assert_eq!(mem.read_u8(0x0F), 0xFF);
        assert_eq!(mem.read_u8(0x10), 0x00);
        mem.write_u8(0x14, 0x12);
        assert_eq!(mem.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_maps_region() {
        let mem = LinearMemory::with_fill(0x100, 0x2000_0000, 0xA5);
        assert!(mem.maps(&Region::new(0x2000_0000, 0x2000_00FF).unwrap()));
        assert!(mem.maps(&Region::new(0x2000_0010, 0x2000_0010).unwrap()));
        assert!(!mem.maps(&Region::new(0x2000_0000, 0x2000_0100).unwrap()));
        assert!(!mem.maps(&Region::new(0x1FFF_FFFF, 0x2000_0000).unwrap()));
        assert!(!LinearMemory::new(0, 0).maps(&Region::new(0, 0).unwrap()));
    }

    #[test]
    fn test_try_for_region() {
        let region = Region::new(0x2000_0000, 0x2000_000F).unwrap();
        let mem = LinearMemory::try_for_region(&region, 0x5A).unwrap();
        assert_eq!(mem.base_addr(), 0x2000_0000);
        assert_eq!(mem.as_slice(), &[0x5A; 16][..]);
        assert!(mem.maps(&region));
    }

    #[test]
    fn test_try_for_region_reports_impossible_allocation() {
        let region = Region::new(0, u64::MAX - 1).unwrap();
        assert!(LinearMemory::try_for_region(&region, 0x00).is_err());
    }

    #[test]
    fn test_for_region_and_slice() {
        let region = Region::new(0x40, 0x47).unwrap();
        let mut mem = LinearMemory::for_region(&region, 0xEE);
        assert_eq!(mem.slice(&region), Some(&[0xEE; 8][..]));

        mem.set(0x41, 0x01);
        let inner = Region::new(0x41, 0x42).unwrap();
        assert_eq!(mem.slice(&inner), Some(&[0x01, 0xEE][..]));
        assert_eq!(mem.slice(&Region::new(0x47, 0x48).unwrap()), None);
    }
}
