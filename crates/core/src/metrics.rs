// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::engine::{MismatchFault, Phase};
use crate::observer::MarchObserver;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const PHASES: usize = Phase::ALL.len();

/// Read/write counts of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseCounts {
    pub phase: Phase,
    pub reads: u64,
    pub writes: u64,
}

/// Per-phase access counters plus wall-clock throughput.
#[derive(Debug)]
pub struct AccessMetrics {
    reads: [AtomicU64; PHASES],
    writes: [AtomicU64; PHASES],
    start_time: Mutex<Option<Instant>>,
    elapsed: Mutex<Option<Duration>>,
}

impl Default for AccessMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessMetrics {
    pub fn new() -> Self {
        Self {
            reads: std::array::from_fn(|_| AtomicU64::new(0)),
            writes: std::array::from_fn(|_| AtomicU64::new(0)),
            start_time: Mutex::new(None),
            elapsed: Mutex::new(None),
        }
    }

    pub fn reset(&self) {
        for counter in self.reads.iter().chain(self.writes.iter()) {
            counter.store(0, Ordering::SeqCst);
        }
        if let Ok(mut start) = self.start_time.lock() {
            *start = None;
        }
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed = None;
        }
    }

    pub fn reads(&self, phase: Phase) -> u64 {
        self.reads[phase.index()].load(Ordering::SeqCst)
    }

    pub fn writes(&self, phase: Phase) -> u64 {
        self.writes[phase.index()].load(Ordering::SeqCst)
    }

    pub fn total_reads(&self) -> u64 {
        Phase::ALL.iter().map(|&p| self.reads(p)).sum()
    }

    pub fn total_writes(&self) -> u64 {
        Phase::ALL.iter().map(|&p| self.writes(p)).sum()
    }

    pub fn phases(&self) -> Vec<PhaseCounts> {
        Phase::ALL
            .iter()
            .map(|&phase| PhaseCounts {
                phase,
                reads: self.reads(phase),
                writes: self.writes(phase),
            })
            .collect()
    }

    /// Time from the first phase start to completion or fault, or to now if
    /// the run is still going.
    pub fn elapsed(&self) -> Duration {
        if let Some(elapsed) = self.elapsed.lock().ok().and_then(|e| *e) {
            return elapsed;
        }
        self.start_time
            .lock()
            .ok()
            .and_then(|s| *s)
            .map(|s| s.elapsed())
            .unwrap_or_default()
    }

    pub fn accesses_per_sec(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            (self.total_reads() + self.total_writes()) as f64 / elapsed
        } else {
            0.0
        }
    }

    fn stop_clock(&self) {
        let started = self.start_time.lock().ok().and_then(|s| *s);
        if let (Some(started), Ok(mut elapsed)) = (started, self.elapsed.lock()) {
            *elapsed = Some(started.elapsed());
        }
    }
}

impl MarchObserver for AccessMetrics {
    fn on_phase_start(&self, _phase: Phase) {
        if let Ok(mut start) = self.start_time.lock() {
            start.get_or_insert_with(Instant::now);
        }
    }

    fn on_read(&self, phase: Phase, _address: u64, _value: u8) {
        self.reads[phase.index()].fetch_add(1, Ordering::Relaxed);
    }

    fn on_write(&self, phase: Phase, _address: u64, _value: u8) {
        self.writes[phase.index()].fetch_add(1, Ordering::Relaxed);
    }

    fn on_fault(&self, _fault: &MismatchFault) {
        self.stop_clock();
    }

    fn on_complete(&self) {
        self.stop_clock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_phase() {
        let metrics = AccessMetrics::new();
        metrics.on_phase_start(Phase::Fill);
        metrics.on_write(Phase::Fill, 0, 0);
        metrics.on_write(Phase::Fill, 1, 0);
        metrics.on_read(Phase::Verify, 0, 0);

        assert_eq!(metrics.writes(Phase::Fill), 2);
        assert_eq!(metrics.reads(Phase::Fill), 0);
        assert_eq!(metrics.reads(Phase::Verify), 1);
        assert_eq!(metrics.total_writes(), 2);
        assert_eq!(metrics.total_reads(), 1);

        let phases = metrics.phases();
        assert_eq!(phases.len(), 6);
        assert_eq!(
            phases[0],
            PhaseCounts {
                phase: Phase::Fill,
                reads: 0,
                writes: 2
            }
        );
    }

    #[test]
    fn test_clock_freezes_on_complete() {
        let metrics = AccessMetrics::new();
        assert_eq!(metrics.elapsed(), Duration::ZERO);
        metrics.on_phase_start(Phase::Fill);
        metrics.on_complete();
        let frozen = metrics.elapsed();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(metrics.elapsed(), frozen);
    }

    #[test]
    fn test_reset() {
        let metrics = AccessMetrics::new();
        metrics.on_phase_start(Phase::Fill);
        metrics.on_write(Phase::Fill, 0, 0);
        metrics.reset();
        assert_eq!(metrics.total_writes(), 0);
        assert_eq!(metrics.elapsed(), Duration::ZERO);
    }
}
