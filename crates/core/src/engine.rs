// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The March Test Engine.
//!
//! Six phases run strictly in order over the whole region:
//!
//! | # | phase            | order | per byte                                   |
//! |---|------------------|-------|--------------------------------------------|
//! | 1 | fill             | ⇑     | w0                                         |
//! | 2 | ascending-set    | ⇑     | r0, then 8 × (w, r) walking ones in at LSB |
//! | 3 | ascending-clear  | ⇑     | 8 × (r, w) walking zeros in at LSB         |
//! | 4 | descending-set   | ⇓     | 8 × (r, w) walking ones in at MSB          |
//! | 5 | descending-clear | ⇓     | 8 × (r, w) walking zeros in at MSB         |
//! | 6 | verify           | ⇑     | r0                                         |
//!
//! The first mismatching read halts the engine. A halted engine never touches
//! memory again; the cells keep whatever they held at the fault.

use crate::memory::MemoryBus;
use crate::observer::MarchObserver;
use crate::pattern::{self, Pass, BITS};
use crate::region::{Direction, Region, RegionError};
use crate::MarchResult;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Fill,
    AscendingSet,
    AscendingClear,
    DescendingSet,
    DescendingClear,
    Verify,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Fill,
        Phase::AscendingSet,
        Phase::AscendingClear,
        Phase::DescendingSet,
        Phase::DescendingClear,
        Phase::Verify,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn next(self) -> Option<Phase> {
        match self {
            Phase::Fill => Some(Phase::AscendingSet),
            Phase::AscendingSet => Some(Phase::AscendingClear),
            Phase::AscendingClear => Some(Phase::DescendingSet),
            Phase::DescendingSet => Some(Phase::DescendingClear),
            Phase::DescendingClear => Some(Phase::Verify),
            Phase::Verify => None,
        }
    }

    /// Bit-walk pass run by this phase; fill and verify have none.
    pub const fn pass(self) -> Option<Pass> {
        match self {
            Phase::AscendingSet => Some(Pass::AscendingSet),
            Phase::AscendingClear => Some(Pass::AscendingClear),
            Phase::DescendingSet => Some(Pass::DescendingSet),
            Phase::DescendingClear => Some(Pass::DescendingClear),
            Phase::Fill | Phase::Verify => None,
        }
    }

    /// Traversal order. The final verification is direction agnostic and
    /// runs ascending.
    pub const fn direction(self) -> Direction {
        match self.pass() {
            Some(pass) => pass.direction(),
            None => Direction::Ascending,
        }
    }

    /// Every cell holds this value once the phase completes.
    pub const fn post_condition(self) -> u8 {
        match self.pass() {
            Some(pass) => pass.end(),
            None => 0x00,
        }
    }

    pub const fn name(self) -> &'static str {
        match self.pass() {
            Some(pass) => pass.name(),
            None => match self {
                Phase::Fill => "fill",
                _ => "verify",
            },
        }
    }

    pub const fn notation(self) -> &'static str {
        match self.pass() {
            Some(pass) => pass.notation(),
            None => match self {
                Phase::Fill => "⇑(w0)",
                _ => "⇕(r0)",
            },
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A read that disagreed with the value the current phase and step mandate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("Content mismatch in {phase} at {address:#x}: expected {expected:#04x}, read {actual:#04x}")]
pub struct MismatchFault {
    pub phase: Phase,
    pub address: u64,
    pub expected: u8,
    pub actual: u8,
}

impl MismatchFault {
    /// Bits that read differently from what was expected.
    pub const fn flipped_bits(&self) -> u8 {
        self.expected ^ self.actual
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// The phase `advance` runs next.
    Ready(Phase),
    /// All six phases passed. Terminal.
    AllClear,
    /// A mismatch stopped the run. Terminal.
    Halted(MismatchFault),
}

impl EngineState {
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, EngineState::Ready(_))
    }
}

/// Runs the Extended March C- over `region` of `bus`.
pub struct MarchEngine<B: MemoryBus, O: MarchObserver = ()> {
    bus: B,
    region: Region,
    observer: O,
    state: EngineState,
}

impl<B: MemoryBus> MarchEngine<B> {
    /// Fails if `bus` does not back every address of `region`.
    pub fn new(bus: B, region: Region) -> Result<Self, RegionError> {
        if !bus.maps(&region) {
            return Err(RegionError::Unmapped {
                begin: region.begin(),
                end: region.end(),
            });
        }
        Ok(Self {
            bus,
            region,
            observer: (),
            state: EngineState::Ready(Phase::Fill),
        })
    }
}

impl<B: MemoryBus, O: MarchObserver> MarchEngine<B, O> {
    pub fn with_observer<P: MarchObserver>(self, observer: P) -> MarchEngine<B, P> {
        MarchEngine {
            bus: self.bus,
            region: self.region,
            observer,
            state: self.state,
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Direct bus access between phases, e.g. to disturb cells in a simulation.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    /// Runs every remaining phase. Returns the fault that halted the engine,
    /// now or on an earlier call.
    pub fn run(&mut self) -> MarchResult<()> {
        while self.advance()?.is_some() {}
        Ok(())
    }

    /// Runs exactly one phase and returns it, or `None` once all clear.
    ///
    /// Terminal states are sticky: a halted engine keeps returning its fault
    /// and neither terminal state accesses memory again.
    pub fn advance(&mut self) -> MarchResult<Option<Phase>> {
        let phase = match self.state {
            EngineState::Ready(phase) => phase,
            EngineState::AllClear => return Ok(None),
            EngineState::Halted(fault) => return Err(fault),
        };

        log_debug!(%phase, notation = phase.notation(), region = %self.region, "Phase start");
        self.observer.on_phase_start(phase);

        if let Err(fault) = self.execute(phase) {
            log_warn!(%fault, "March halted");
            self.state = EngineState::Halted(fault);
            self.observer.on_fault(&fault);
            return Err(fault);
        }

        self.observer.on_phase_end(phase);
        log_debug!(%phase, "Phase done");

        self.state = match phase.next() {
            Some(next) => EngineState::Ready(next),
            None => {
                log_info!(region = %self.region, "March complete, memory all clear");
                self.observer.on_complete();
                EngineState::AllClear
            }
        };
        Ok(Some(phase))
    }

    fn execute(&mut self, phase: Phase) -> MarchResult<()> {
        let addresses = self.region.addresses(phase.direction());
        match phase.pass() {
            Some(pass) => {
                for address in addresses {
                    self.walk(phase, pass, address)?;
                }
            }
            None if phase == Phase::Fill => {
                for address in addresses {
                    self.write(phase, address, 0x00);
                }
            }
            None => {
                for address in addresses {
                    self.expect(phase, address, 0x00)?;
                }
            }
        }
        Ok(())
    }

    /// One byte through the full bit-walk of `pass`.
    fn walk(&mut self, phase: Phase, pass: Pass, address: u64) -> MarchResult<()> {
        let reads_back = pass.reads_back();
        if reads_back {
            self.expect(phase, address, pass.start())?;
        }
        for step in 1..=BITS {
            if !reads_back {
                self.expect(phase, address, pattern::value(pass, step - 1))?;
            }
            let value = pattern::value(pass, step);
            self.write(phase, address, value);
            if reads_back {
                self.expect(phase, address, value)?;
            }
        }
        Ok(())
    }

    fn write(&mut self, phase: Phase, address: u64, value: u8) {
        self.bus.write_u8(address, value);
        self.observer.on_write(phase, address, value);
    }

    fn expect(&mut self, phase: Phase, address: u64, expected: u8) -> MarchResult<()> {
        let actual = self.bus.read_u8(address);
        self.observer.on_read(phase, address, actual);
        if actual == expected {
            Ok(())
        } else {
            Err(MismatchFault {
                phase,
                address,
                expected,
                actual,
            })
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::memory::LinearMemory;

    fn engine(len: u64, fill: u8) -> MarchEngine<LinearMemory> {
        let region = Region::with_len(0x2000_0000, len).unwrap();
        MarchEngine::new(LinearMemory::for_region(&region, fill), region).unwrap()
    }

    #[test]
    fn test_phase_order() {
        let mut phase = Phase::Fill;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            seen.push(next);
            phase = next;
        }
        assert_eq!(seen, Phase::ALL.to_vec());
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[test]
    fn test_phase_directions_and_post_conditions() {
        assert_eq!(Phase::Fill.direction(), Direction::Ascending);
        assert_eq!(Phase::AscendingClear.direction(), Direction::Ascending);
        assert_eq!(Phase::DescendingSet.direction(), Direction::Descending);
        assert_eq!(Phase::DescendingClear.direction(), Direction::Descending);
        assert_eq!(Phase::Verify.direction(), Direction::Ascending);

        let post: Vec<u8> = Phase::ALL.iter().map(|p| p.post_condition()).collect();
        assert_eq!(post, vec![0x00, 0xFF, 0x00, 0xFF, 0x00, 0x00]);
    }

    #[test]
    fn test_new_rejects_unmapped_region() {
        let mem = LinearMemory::new(16, 0x1000);
        let region = Region::new(0x1008, 0x1010).unwrap();
        assert_eq!(
            MarchEngine::new(mem, region).err(),
            Some(RegionError::Unmapped {
                begin: 0x1008,
                end: 0x1010
            })
        );
    }

    #[test]
    fn test_run_on_healthy_memory() {
        let mut engine = engine(64, 0xA5);
        assert_eq!(engine.run(), Ok(()));
        assert_eq!(engine.state(), EngineState::AllClear);
        assert!(engine.bus().as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_advance_reports_each_phase_then_none() {
        let mut engine = engine(4, 0x00);
        for phase in Phase::ALL {
            assert_eq!(engine.state(), EngineState::Ready(phase));
            assert_eq!(engine.advance(), Ok(Some(phase)));
        }
        assert_eq!(engine.advance(), Ok(None));
        assert_eq!(engine.run(), Ok(()));
    }

    #[test]
    fn test_halt_is_sticky() {
        let mut engine = engine(4, 0x00);
        engine.advance().unwrap(); // fill
        engine.bus_mut().set(0x2000_0002, 0x40);

        let fault = engine.run().unwrap_err();
        assert_eq!(
            fault,
            MismatchFault {
                phase: Phase::AscendingSet,
                address: 0x2000_0002,
                expected: 0x00,
                actual: 0x40,
            }
        );
        assert_eq!(fault.flipped_bits(), 0x40);
        assert_eq!(engine.state(), EngineState::Halted(fault));
        assert!(engine.state().is_terminal());

        let snapshot = engine.bus().as_slice().to_vec();
        assert_eq!(engine.advance(), Err(fault));
        assert_eq!(engine.run(), Err(fault));
        assert_eq!(engine.bus().as_slice(), &snapshot[..]);
    }

    #[test]
    fn test_fault_message() {
        let fault = MismatchFault {
            phase: Phase::DescendingClear,
            address: 0x2000_0010,
            expected: 0x3F,
            actual: 0x7F,
        };
        assert_eq!(
            fault.to_string(),
            "Content mismatch in descending-clear at 0x20000010: expected 0x3f, read 0x7f"
        );
    }
}
