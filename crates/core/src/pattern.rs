// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bit-walk patterns.
//!
//! Every bit-walk pass moves a byte from its start value to the opposite value
//! one bit at a time, so each pass writes exactly [`BITS`] distinct values per
//! byte. Reading the byte back after step `k` checks bit `k` and, because the
//! access is byte wide, re-checks every other bit of the cell as well.

use crate::region::Direction;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Bits per cell, which is also the number of writes per byte and pass.
pub const BITS: u8 = 8;

/// The four bit-walk passes of the march.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    /// ⇑(r0,w1,r1): shift left, ones enter at the LSB.
    AscendingSet,
    /// ⇑(r1,w0): shift left, zeros enter at the LSB.
    AscendingClear,
    /// ⇓(r0,w1): shift right, ones enter at the MSB.
    DescendingSet,
    /// ⇓(r1,w0): shift right, zeros enter at the MSB.
    DescendingClear,
}

impl Pass {
    pub const ALL: [Pass; 4] = [
        Pass::AscendingSet,
        Pass::AscendingClear,
        Pass::DescendingSet,
        Pass::DescendingClear,
    ];

    pub const fn direction(self) -> Direction {
        match self {
            Pass::AscendingSet | Pass::AscendingClear => Direction::Ascending,
            Pass::DescendingSet | Pass::DescendingClear => Direction::Descending,
        }
    }

    pub const fn sets_bits(self) -> bool {
        matches!(self, Pass::AscendingSet | Pass::DescendingSet)
    }

    /// Value the cell holds when the pass reaches it.
    pub const fn start(self) -> u8 {
        if self.sets_bits() {
            0x00
        } else {
            0xFF
        }
    }

    /// Value the cell holds once the pass is done with it.
    pub const fn end(self) -> u8 {
        !self.start()
    }

    /// The ascending set pass compares after every write (r0, then w1 r1 per
    /// bit); the others compare before every write (r w per bit).
    pub const fn reads_back(self) -> bool {
        matches!(self, Pass::AscendingSet)
    }

    /// March notation, e.g. `⇑(r0,w1,r1)`.
    pub const fn notation(self) -> &'static str {
        match self {
            Pass::AscendingSet => "⇑(r0,w1,r1)",
            Pass::AscendingClear => "⇑(r1,w0)",
            Pass::DescendingSet => "⇓(r0,w1)",
            Pass::DescendingClear => "⇓(r1,w0)",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Pass::AscendingSet => "ascending-set",
            Pass::AscendingClear => "ascending-clear",
            Pass::DescendingSet => "descending-set",
            Pass::DescendingClear => "descending-clear",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.notation())
    }
}

/// Cell value after `step` writes of `pass`.
///
/// `value(pass, 0)` is [`Pass::start`] and `value(pass, BITS)` is
/// [`Pass::end`]; steps past [`BITS`] saturate at the end value.
pub const fn value(pass: Pass, step: u8) -> u8 {
    let step = if step > BITS { BITS } else { step };
    match pass {
        Pass::AscendingSet => ((1u16 << step) - 1) as u8,
        Pass::AscendingClear => (0x00FFu16 << step) as u8,
        Pass::DescendingSet => (0xFF00u16 >> step) as u8,
        Pass::DescendingClear => (0x00FFu16 >> step) as u8,
    }
}

/// Single shift of `pass` applied to `current`.
pub const fn next(pass: Pass, current: u8) -> u8 {
    match pass {
        Pass::AscendingSet => (current << 1) | 0x01,
        Pass::AscendingClear => current << 1,
        Pass::DescendingSet => (current >> 1) | 0x80,
        Pass::DescendingClear => current >> 1,
    }
}

/// Values written by one pass over one byte, in order.
#[derive(Debug, Clone)]
pub struct BitWalk {
    pass: Pass,
    current: u8,
}

impl BitWalk {
    pub const fn new(pass: Pass) -> Self {
        Self {
            pass,
            current: pass.start(),
        }
    }
}

impl Iterator for BitWalk {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.current == self.pass.end() {
            return None;
        }
        self.current = next(self.pass, self.current);
        Some(self.current)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_ascending_set_sequence() {
        let walk: Vec<u8> = BitWalk::new(Pass::AscendingSet).collect();
        assert_eq!(walk, vec![0x01, 0x03, 0x07, 0x0F, 0x1F, 0x3F, 0x7F, 0xFF]);
    }

    #[test]
    fn test_ascending_clear_sequence() {
        let walk: Vec<u8> = BitWalk::new(Pass::AscendingClear).collect();
        assert_eq!(walk, vec![0xFE, 0xFC, 0xF8, 0xF0, 0xE0, 0xC0, 0x80, 0x00]);
    }

    #[test]
    fn test_descending_set_sequence() {
        let walk: Vec<u8> = BitWalk::new(Pass::DescendingSet).collect();
        assert_eq!(walk, vec![0x80, 0xC0, 0xE0, 0xF0, 0xF8, 0xFC, 0xFE, 0xFF]);
    }

    #[test]
    fn test_descending_clear_sequence() {
        let walk: Vec<u8> = BitWalk::new(Pass::DescendingClear).collect();
        assert_eq!(walk, vec![0x7F, 0x3F, 0x1F, 0x0F, 0x07, 0x03, 0x01, 0x00]);
    }

    #[test]
    fn test_closed_form_matches_shift_walk() {
        for pass in Pass::ALL {
            assert_eq!(value(pass, 0), pass.start(), "{pass}");
            let mut current = pass.start();
            for step in 1..=BITS {
                current = next(pass, current);
                assert_eq!(value(pass, step), current, "{pass} step {step}");
            }
            assert_eq!(current, pass.end(), "{pass}");
        }
    }

    #[test]
    fn test_every_pass_writes_eight_distinct_values() {
        for pass in Pass::ALL {
            let mut walk: Vec<u8> = BitWalk::new(pass).collect();
            assert_eq!(walk.len(), BITS as usize, "{pass}");
            assert_eq!(walk.last(), Some(&pass.end()), "{pass}");
            walk.sort_unstable();
            walk.dedup();
            assert_eq!(walk.len(), BITS as usize, "{pass}");
        }
    }

    #[test]
    fn test_each_step_flips_exactly_one_bit() {
        for pass in Pass::ALL {
            for step in 1..=BITS {
                let flipped = value(pass, step - 1) ^ value(pass, step);
                assert_eq!(flipped.count_ones(), 1, "{pass} step {step}");
            }
        }
    }

    #[test]
    fn test_ascending_set_bit_invariant() {
        // Before setting bit k the lower bits are 1 and bits >= k are 0;
        // afterwards bits 0..=k are 1 and the rest 0.
        for k in 0..BITS {
            let before = value(Pass::AscendingSet, k);
            let after = value(Pass::AscendingSet, k + 1);
            for bit in 0..BITS {
                let mask = 1u8 << bit;
                assert_eq!(before & mask != 0, bit < k, "before k={k} bit={bit}");
                assert_eq!(after & mask != 0, bit <= k, "after k={k} bit={bit}");
            }
        }
    }

    #[test]
    fn test_steps_saturate_at_end() {
        for pass in Pass::ALL {
            assert_eq!(value(pass, BITS + 1), pass.end());
            assert_eq!(value(pass, u8::MAX), pass.end());
        }
    }

    #[test]
    fn test_pass_metadata() {
        assert!(Pass::AscendingSet.reads_back());
        assert!(!Pass::DescendingClear.reads_back());
        assert_eq!(Pass::DescendingSet.direction(), Direction::Descending);
        assert_eq!(Pass::AscendingClear.start(), 0xFF);
        assert_eq!(Pass::AscendingClear.end(), 0x00);
    }
}
