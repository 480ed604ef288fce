// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::size_limited_writer::SizeLimitedWriter;
use marchc_core::access_log::{Access, AccessKind};
use marchc_core::{MarchObserver, Phase};
use std::io::{self, Write};
use std::sync::Mutex;

/// Streams every access to `W` as it happens, one line per access.
///
/// Nothing is buffered beyond the writer itself, so memory use stays flat
/// however large the region is. Once the byte cap is hit further accesses
/// are not even formatted.
pub struct AccessTrace<W: Write> {
    state: Mutex<TraceState<W>>,
}

struct TraceState<W: Write> {
    out: SizeLimitedWriter<W>,
    error: Option<io::Error>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSummary {
    pub bytes_written: u64,
    pub truncated: bool,
}

impl<W: Write> AccessTrace<W> {
    pub fn new(writer: W, max_bytes: u64) -> Self {
        Self {
            state: Mutex::new(TraceState {
                out: SizeLimitedWriter::new(writer, max_bytes),
                error: None,
            }),
        }
    }

    /// Flushes the trace and hands back the writer. Reports the first write
    /// error seen during the run, if any.
    pub fn finish(self) -> io::Result<(W, TraceSummary)> {
        let state = self
            .state
            .into_inner()
            .map_err(|_| io::Error::other("access trace lock poisoned"))?;
        let TraceState { mut out, error } = state;
        if let Some(e) = error {
            return Err(e);
        }
        out.flush()?;
        let summary = TraceSummary {
            bytes_written: out.bytes_written(),
            truncated: out.limit_exceeded(),
        };
        Ok((out.into_inner(), summary))
    }

    fn record(&self, access: Access) {
        if let Ok(mut state) = self.state.lock() {
            if state.error.is_some() || state.out.limit_exceeded() {
                return;
            }
            if let Err(e) = writeln!(state.out, "{}", access) {
                state.error = Some(e);
            }
        }
    }
}

impl<W: Write> MarchObserver for AccessTrace<W> {
    fn on_read(&self, phase: Phase, address: u64, value: u8) {
        self.record(Access {
            phase,
            kind: AccessKind::Read,
            address,
            value,
        });
    }

    fn on_write(&self, phase: Phase, address: u64, value: u8) {
        self.record(Access {
            phase,
            kind: AccessKind::Write,
            address,
            value,
        });
    }
}
