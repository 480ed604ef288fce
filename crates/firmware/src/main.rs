// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Stand-alone March C- over the upper 16K of SRAM.
//!
//! There is no output channel. Attach a debugger and look at the PC: it sits
//! in `all_clear` after a clean run, or in `halted` with the fault (phase,
//! address, expected and actual byte) held live in its frame.

#![no_std]
#![no_main]

use core::hint::black_box;
use cortex_m_rt::entry;
use marchc_core::{MarchEngine, MismatchFault, Region, VolatileRegion};
use panic_halt as _;

/// First byte of the region under test.
const MEM_BEGIN: u64 = 0x2000_1000;
/// Last byte of the region under test (inclusive).
const MEM_END: u64 = 0x2000_4FFF;

const REGION: Region = match Region::new(MEM_BEGIN, MEM_END) {
    Ok(region) => region,
    Err(_) => panic!("MEM_END must not lie below MEM_BEGIN"),
};

#[entry]
fn main() -> ! {
    // SAFETY: memory.x keeps the stack and all statics below MEM_BEGIN, so
    // nothing else lives in the region while the march owns it.
    let bus = unsafe { VolatileRegion::new(REGION) };

    let Ok(mut engine) = MarchEngine::new(bus, REGION) else {
        halted(None)
    };
    match engine.run() {
        Ok(()) => all_clear(),
        Err(fault) => halted(Some(fault)),
    }
}

/// Every phase passed and the region reads back all zero.
#[inline(never)]
fn all_clear() -> ! {
    loop {
        cortex_m::asm::nop();
    }
}

/// A cell mismatched. `None` means the region was not addressable at all.
#[inline(never)]
fn halted(fault: Option<MismatchFault>) -> ! {
    loop {
        black_box(&fault);
        cortex_m::asm::nop();
    }
}
