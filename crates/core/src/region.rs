// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::fmt;
use core::ops::RangeInclusive;
use serde::{Deserialize, Serialize};

/// Address traversal order of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub const fn arrow(self) -> char {
        match self {
            Direction::Ascending => '⇑',
            Direction::Descending => '⇓',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegionError {
    #[error("Region end {end:#x} lies below its begin {begin:#x}")]
    Inverted { begin: u64, end: u64 },
    #[error("Region at {begin:#x} has zero length")]
    Empty { begin: u64 },
    #[error("Region {begin:#x}..={end:#x} does not fit the address space")]
    Overflow { begin: u64, end: u64 },
    #[error("Region {begin:#x}..={end:#x} is not mapped by the memory bus")]
    Unmapped { begin: u64, end: u64 },
}

/// Inclusive, contiguous byte range `[begin, end]` under test.
///
/// A region is never empty and its length always fits a `u64`, so traversal
/// never wraps outside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Region {
    begin: u64,
    end: u64,
}

impl Region {
    pub const fn new(begin: u64, end: u64) -> Result<Self, RegionError> {
        if end < begin {
            return Err(RegionError::Inverted { begin, end });
        }
        // `len()` must stay representable.
        if begin == 0 && end == u64::MAX {
            return Err(RegionError::Overflow { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// Region of `len` bytes starting at `begin`.
    pub const fn with_len(begin: u64, len: u64) -> Result<Self, RegionError> {
        if len == 0 {
            return Err(RegionError::Empty { begin });
        }
        match begin.checked_add(len - 1) {
            Some(end) => Self::new(begin, end),
            None => Err(RegionError::Overflow {
                begin,
                end: u64::MAX,
            }),
        }
    }

    pub const fn begin(&self) -> u64 {
        self.begin
    }

    pub const fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes in the region (`end - begin + 1`).
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> u64 {
        self.end - self.begin + 1
    }

    pub const fn contains(&self, addr: u64) -> bool {
        addr >= self.begin && addr <= self.end
    }

    /// True if `other` lies entirely inside `self`.
    pub const fn covers(&self, other: &Region) -> bool {
        other.begin >= self.begin && other.end <= self.end
    }

    /// Every address of the region exactly once, in `direction` order.
    pub fn addresses(&self, direction: Direction) -> Addresses {
        Addresses {
            range: self.begin..=self.end,
            direction,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}..={:#x} ({} bytes)", self.begin, self.end, self.len())
    }
}

/// Traversal cursor over a [`Region`].
#[derive(Debug, Clone)]
pub struct Addresses {
    range: RangeInclusive<u64>,
    direction: Direction,
}

impl Iterator for Addresses {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        match self.direction {
            Direction::Ascending => self.range.next(),
            Direction::Descending => self.range.next_back(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_region_len_is_inclusive() {
        let region = Region::new(0x2000_0000, 0x2000_0FFF).unwrap();
        assert_eq!(region.len(), 4096);
        assert!(region.contains(0x2000_0000));
        assert!(region.contains(0x2000_0FFF));
        assert!(!region.contains(0x2000_1000));
        assert!(!region.contains(0x1FFF_FFFF));
    }

    #[test]
    fn test_region_rejects_bad_bounds() {
        assert_eq!(
            Region::new(0x100, 0xFF),
            Err(RegionError::Inverted {
                begin: 0x100,
                end: 0xFF
            })
        );
        assert!(matches!(
            Region::new(0, u64::MAX),
            Err(RegionError::Overflow { .. })
        ));
        assert_eq!(
            Region::with_len(0x10, 0),
            Err(RegionError::Empty { begin: 0x10 })
        );
        assert!(matches!(
            Region::with_len(u64::MAX, 2),
            Err(RegionError::Overflow { .. })
        ));
    }

    #[test]
    fn test_with_len_matches_new() {
        assert_eq!(Region::with_len(0x1000, 4), Region::new(0x1000, 0x1003));
        assert_eq!(Region::with_len(0x1000, 1), Region::new(0x1000, 0x1000));
    }

    #[test]
    fn test_traversal_orders() {
        let region = Region::new(0x10, 0x13).unwrap();
        let up: Vec<u64> = region.addresses(Direction::Ascending).collect();
        let down: Vec<u64> = region.addresses(Direction::Descending).collect();
        assert_eq!(up, vec![0x10, 0x11, 0x12, 0x13]);
        assert_eq!(down, vec![0x13, 0x12, 0x11, 0x10]);
    }

    #[test]
    fn test_traversal_at_top_of_address_space_does_not_wrap() {
        let region = Region::new(u64::MAX - 2, u64::MAX).unwrap();
        let up: Vec<u64> = region.addresses(Direction::Ascending).collect();
        assert_eq!(up, vec![u64::MAX - 2, u64::MAX - 1, u64::MAX]);
        assert_eq!(region.addresses(Direction::Descending).count(), 3);
    }

    #[test]
    fn test_single_byte_region_orders_coincide() {
        let region = Region::new(0x42, 0x42).unwrap();
        let up: Vec<u64> = region.addresses(Direction::Ascending).collect();
        let down: Vec<u64> = region.addresses(Direction::Descending).collect();
        assert_eq!(up, down);
        assert_eq!(up, vec![0x42]);
    }

    #[test]
    fn test_covers() {
        let outer = Region::new(0x1000, 0x1FFF).unwrap();
        assert!(outer.covers(&Region::new(0x1000, 0x1FFF).unwrap()));
        assert!(outer.covers(&Region::new(0x1800, 0x1800).unwrap()));
        assert!(!outer.covers(&Region::new(0x0FFF, 0x1000).unwrap()));
        assert!(!outer.covers(&Region::new(0x1FFF, 0x2000).unwrap()));
    }
}
