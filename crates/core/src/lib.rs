// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Extended March C- memory test.
//!
//! The engine walks a contiguous byte region through six ordered phases and
//! compares the cell content against the expected bit-walk value before every
//! mutation. The first mismatch halts the engine for good; no memory access
//! happens after it.
//!
//! Without the default `std` feature the crate is `no_std` and carries only the
//! engine, the bit-walk patterns and the volatile hardware bus, which is what
//! bare-metal firmware needs.

#![cfg_attr(not(feature = "std"), no_std)]

// Log statements compile out on bare metal, where there is no reporting channel.
#[cfg(feature = "std")]
macro_rules! log_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}
#[cfg(not(feature = "std"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "std")]
macro_rules! log_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}
#[cfg(not(feature = "std"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "std")]
macro_rules! log_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}
#[cfg(not(feature = "std"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "std")]
pub mod access_log;
pub mod engine;
pub mod memory;
#[cfg(feature = "std")]
pub mod metrics;
pub mod observer;
pub mod pattern;
pub mod region;


pub use engine::{EngineState, MarchEngine, MismatchFault, Phase};
pub use memory::{MemoryBus, VolatileRegion};
pub use observer::MarchObserver;
pub use pattern::Pass;
pub use region::{Direction, Region, RegionError};

/// Outcome of a march step: the only error is a content mismatch.
pub type MarchResult<T> = Result<T, MismatchFault>;
