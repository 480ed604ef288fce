// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::MemoryBus;
use crate::region::Region;
use serde::{Deserialize, Serialize};

/// Classical RAM fault models that can be injected into a simulated memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectedFault {
    /// `bit` of the cell always holds `level`.
    StuckAt { address: u64, bit: u8, level: bool },
    /// `bit` of the cell cannot rise from 0 to 1 (`rising`) or fall from 1 to 0.
    Transition { address: u64, bit: u8, rising: bool },
    /// When `aggressor_bit` of `aggressor` makes a rising (or falling)
    /// transition, `victim_bit` of `victim` inverts.
    Coupling {
        aggressor: u64,
        aggressor_bit: u8,
        victim: u64,
        victim_bit: u8,
        rising: bool,
    },
    /// The cell is overwritten with `value` once, as soon as the memory has
    /// accepted at least `after_writes` writes. With `after_writes: 0` the
    /// cell is already corrupt when the first access arrives.
    Corrupt {
        address: u64,
        after_writes: u64,
        value: u8,
    },
}

impl InjectedFault {
    /// Cells the fault reads or modifies.
    pub fn addresses(&self) -> Vec<u64> {
        match *self {
            InjectedFault::StuckAt { address, .. }
            | InjectedFault::Transition { address, .. }
            | InjectedFault::Corrupt { address, .. } => vec![address],
            InjectedFault::Coupling {
                aggressor, victim, ..
            } => vec![aggressor, victim],
        }
    }

    /// Bit positions the fault names.
    pub fn bits(&self) -> Vec<u8> {
        match *self {
            InjectedFault::StuckAt { bit, .. } | InjectedFault::Transition { bit, .. } => {
                vec![bit]
            }
            InjectedFault::Coupling {
                aggressor_bit,
                victim_bit,
                ..
            } => vec![aggressor_bit, victim_bit],
            InjectedFault::Corrupt { .. } => Vec::new(),
        }
    }
}

fn mask(bit: u8) -> u8 {
    1u8.checked_shl(u32::from(bit)).unwrap_or(0)
}

fn force(value: u8, bit: u8, level: bool) -> u8 {
    if level {
        value | mask(bit)
    } else {
        value & !mask(bit)
    }
}

/// Wraps a bus and makes it misbehave according to a list of [`InjectedFault`]s.
#[derive(Debug)]
pub struct FaultyMemory<M> {
    inner: M,
    faults: Vec<InjectedFault>,
    fired: Vec<bool>,
    writes: u64,
}

impl<M: MemoryBus> FaultyMemory<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            faults: Vec::new(),
            fired: Vec::new(),
            writes: 0,
        }
    }

    pub fn with_fault(mut self, fault: InjectedFault) -> Self {
        self.inject(fault);
        self
    }

    pub fn inject(&mut self, fault: InjectedFault) {
        self.faults.push(fault);
        self.fired.push(false);
    }

    pub fn faults(&self) -> &[InjectedFault] {
        &self.faults
    }

    /// Writes accepted so far, not counting the ones faults make on their own.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }

    /// Fires every pending `Corrupt` whose write threshold has been reached.
    fn corrupt_due(&mut self) {
        for (fault, fired) in self.faults.iter().zip(self.fired.iter_mut()) {
            if let InjectedFault::Corrupt {
                address,
                after_writes,
                value,
            } = *fault
            {
                if !*fired && self.writes >= after_writes {
                    self.inner.write_u8(address, value);
                    *fired = true;
                }
            }
        }
    }
}

impl<M: MemoryBus> MemoryBus for FaultyMemory<M> {
    fn read_u8(&mut self, addr: u64) -> u8 {
        self.corrupt_due();
        let mut value = self.inner.read_u8(addr);
        for fault in &self.faults {
            if let InjectedFault::StuckAt {
                address,
                bit,
                level,
            } = *fault
            {
                if address == addr {
                    value = force(value, bit, level);
                }
            }
        }
        value
    }

    fn write_u8(&mut self, addr: u64, value: u8) {
        self.corrupt_due();
        let old = self.inner.read_u8(addr);
        let mut stored = value;
        for fault in &self.faults {
            match *fault {
                InjectedFault::StuckAt {
                    address,
                    bit,
                    level,
                } if address == addr => stored = force(stored, bit, level),
                InjectedFault::Transition {
                    address,
                    bit,
                    rising,
                } if address == addr => {
                    let m = mask(bit);
                    let was_set = old & m != 0;
                    let wants_set = value & m != 0;
                    if was_set != wants_set && wants_set == rising {
                        stored = force(stored, bit, was_set);
                    }
                }
                _ => {}
            }
        }
        self.inner.write_u8(addr, stored);
        self.writes += 1;

        for fault in &self.faults {
            if let InjectedFault::Coupling {
                aggressor,
                aggressor_bit,
                victim,
                victim_bit,
                rising,
            } = *fault
            {
                let m = mask(aggressor_bit);
                let was_set = old & m != 0;
                let is_set = stored & m != 0;
                if aggressor == addr && was_set != is_set && is_set == rising {
                    let current = self.inner.read_u8(victim);
                    self.inner.write_u8(victim, current ^ mask(victim_bit));
                }
            }
        }
        self.corrupt_due();
    }

    fn maps(&self, region: &Region) -> bool {
        self.inner.maps(region)
    }
}
