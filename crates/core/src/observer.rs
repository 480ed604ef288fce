// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::engine::{MismatchFault, Phase};

/// Trait for observing march events in a modular way.
///
/// Hooks run synchronously inside the engine loop, so they see every access in
/// program order. They cannot touch the memory under test.
pub trait MarchObserver {
    fn on_phase_start(&self, _phase: Phase) {}
    fn on_phase_end(&self, _phase: Phase) {}
    fn on_read(&self, _phase: Phase, _address: u64, _value: u8) {}
    fn on_write(&self, _phase: Phase, _address: u64, _value: u8) {}
    fn on_fault(&self, _fault: &MismatchFault) {}
    fn on_complete(&self) {}
}

impl MarchObserver for () {}

impl<T: MarchObserver + ?Sized> MarchObserver for &T {
    fn on_phase_start(&self, phase: Phase) {
        (**self).on_phase_start(phase)
    }
    fn on_phase_end(&self, phase: Phase) {
        (**self).on_phase_end(phase)
    }
    fn on_read(&self, phase: Phase, address: u64, value: u8) {
        (**self).on_read(phase, address, value)
    }
    fn on_write(&self, phase: Phase, address: u64, value: u8) {
        (**self).on_write(phase, address, value)
    }
    fn on_fault(&self, fault: &MismatchFault) {
        (**self).on_fault(fault)
    }
    fn on_complete(&self) {
        (**self).on_complete()
    }
}

#[cfg(feature = "std")]
impl<T: MarchObserver + ?Sized> MarchObserver for std::sync::Arc<T> {
    fn on_phase_start(&self, phase: Phase) {
        (**self).on_phase_start(phase)
    }
    fn on_phase_end(&self, phase: Phase) {
        (**self).on_phase_end(phase)
    }
    fn on_read(&self, phase: Phase, address: u64, value: u8) {
        (**self).on_read(phase, address, value)
    }
    fn on_write(&self, phase: Phase, address: u64, value: u8) {
        (**self).on_write(phase, address, value)
    }
    fn on_fault(&self, fault: &MismatchFault) {
        (**self).on_fault(fault)
    }
    fn on_complete(&self) {
        (**self).on_complete()
    }
}

#[cfg(feature = "std")]
impl<T: MarchObserver> MarchObserver for Vec<T> {
    fn on_phase_start(&self, phase: Phase) {
        self.iter().for_each(|o| o.on_phase_start(phase))
    }
    fn on_phase_end(&self, phase: Phase) {
        self.iter().for_each(|o| o.on_phase_end(phase))
    }
    fn on_read(&self, phase: Phase, address: u64, value: u8) {
        self.iter().for_each(|o| o.on_read(phase, address, value))
    }
    fn on_write(&self, phase: Phase, address: u64, value: u8) {
        self.iter().for_each(|o| o.on_write(phase, address, value))
    }
    fn on_fault(&self, fault: &MismatchFault) {
        self.iter().for_each(|o| o.on_fault(fault))
    }
    fn on_complete(&self) {
        self.iter().for_each(|o| o.on_complete())
    }
}

impl<T: MarchObserver> MarchObserver for Option<T> {
    fn on_phase_start(&self, phase: Phase) {
        if let Some(o) = self {
            o.on_phase_start(phase)
        }
    }
    fn on_phase_end(&self, phase: Phase) {
        if let Some(o) = self {
            o.on_phase_end(phase)
        }
    }
    fn on_read(&self, phase: Phase, address: u64, value: u8) {
        if let Some(o) = self {
            o.on_read(phase, address, value)
        }
    }
    fn on_write(&self, phase: Phase, address: u64, value: u8) {
        if let Some(o) = self {
            o.on_write(phase, address, value)
        }
    }
    fn on_fault(&self, fault: &MismatchFault) {
        if let Some(o) = self {
            o.on_fault(fault)
        }
    }
    fn on_complete(&self) {
        if let Some(o) = self {
            o.on_complete()
        }
    }
}

impl<A: MarchObserver, B: MarchObserver> MarchObserver for (A, B) {
    fn on_phase_start(&self, phase: Phase) {
        self.0.on_phase_start(phase);
        self.1.on_phase_start(phase);
    }
    fn on_phase_end(&self, phase: Phase) {
        self.0.on_phase_end(phase);
        self.1.on_phase_end(phase);
    }
    fn on_read(&self, phase: Phase, address: u64, value: u8) {
        self.0.on_read(phase, address, value);
        self.1.on_read(phase, address, value);
    }
    fn on_write(&self, phase: Phase, address: u64, value: u8) {
        self.0.on_write(phase, address, value);
        self.1.on_write(phase, address, value);
    }
    fn on_fault(&self, fault: &MismatchFault) {
        self.0.on_fault(fault);
        self.1.on_fault(fault);
    }
    fn on_complete(&self) {
        self.0.on_complete();
        self.1.on_complete();
    }
}
