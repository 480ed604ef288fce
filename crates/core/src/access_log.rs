// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::engine::Phase;
use crate::observer::MarchObserver;
use serde::Serialize;
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Read,
    Write,
}

/// One memory access as the engine made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Access {
    pub phase: Phase,
    pub kind: AccessKind,
    pub address: u64,
    pub value: u8,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.kind {
            AccessKind::Read => 'R',
            AccessKind::Write => 'W',
        };
        write!(
            f,
            "{:<16} {} {:#010x} {:#04x}",
            self.phase.name(),
            op,
            self.address,
            self.value
        )
    }
}

/// Records every access in program order.
///
/// Keeps every entry in memory, 67 per byte of a clean run. Meant for
/// inspecting small regions; stream to a writer for anything larger.
#[derive(Debug, Default)]
pub struct AccessLog {
    entries: Mutex<Vec<Access>>,
}

impl AccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Access> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<Access> {
        self.entries.lock().ok().and_then(|e| e.last().copied())
    }

    fn push(&self, access: Access) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(access);
        }
    }
}

impl MarchObserver for AccessLog {
    fn on_read(&self, phase: Phase, address: u64, value: u8) {
        self.push(Access {
            phase,
            kind: AccessKind::Read,
            address,
            value,
        });
    }

    fn on_write(&self, phase: Phase, address: u64, value: u8) {
        self.push(Access {
            phase,
            kind: AccessKind::Write,
            address,
            value,
        });
    }
}
