// MarchC - Extended March C- Memory Test
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::io::{self, Write};

/// A `Write` wrapper that stops forwarding once `max_bytes` have gone through.
/// Writes past the cap are accepted and dropped.
pub struct SizeLimitedWriter<W: Write> {
    inner: W,
    bytes_written: u64,
    max_bytes: u64,
    limit_exceeded: bool,
}

impl<W: Write> SizeLimitedWriter<W> {
    pub fn new(inner: W, max_bytes: u64) -> Self {
        Self {
            inner,
            bytes_written: 0,
            max_bytes,
            limit_exceeded: false,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// True once any byte has been dropped.
    pub fn limit_exceeded(&self) -> bool {
        self.limit_exceeded
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for SizeLimitedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.max_bytes.saturating_sub(self.bytes_written);
        if remaining == 0 {
            self.limit_exceeded |= !buf.is_empty();
            return Ok(buf.len());
        }

        let to_write = buf.len().min(remaining.try_into().unwrap_or(usize::MAX));
        let written = self.inner.write(&buf[..to_write])?;
        self.bytes_written += written as u64;
        if written == to_write && to_write < buf.len() {
            // The tail that did not fit is swallowed.
            self.limit_exceeded = true;
            return Ok(buf.len());
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
