//! Accumulation of one HTTP response into forecast records.

use crate::{extract::closing, model::ForecastKind, record::ForecastRecord};

/// Tag wrapping one hourly or daily entry.
const ENTRY_TAG: &str = "time";

/// Collects response bytes for one exchange.
///
/// Single-entry responses are kept whole. Multi-entry responses are cut at each
/// `</time>`: the finished entry is scraped and the buffer starts over, so memory stays
/// bounded by one entry. Accumulation is complete once `target` entries were seen.
#[derive(Debug)]
pub(crate) struct ResponseBuffer {
    kind: ForecastKind,
    target: Option<usize>,
    entry_end: String,
    buf: Vec<u8>,
    entries: Vec<ForecastRecord>,
}

impl ResponseBuffer {
    pub(crate) fn new(kind: ForecastKind, count: Option<u32>) -> Self {
        let target = kind
            .is_multi_entry()
            .then(|| count.unwrap_or(1).max(1) as usize);

        Self {
            kind,
            target,
            entry_end: closing(ENTRY_TAG),
            buf: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Appends `bytes`; returns `true` once nothing more needs to be read. Bytes past
    /// the target entry are dropped.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> bool {
        let Some(target) = self.target else {
            self.buf.extend_from_slice(bytes);
            return false;
        };

        for &byte in bytes {
            self.buf.push(byte);
            if self.buf.ends_with(self.entry_end.as_bytes()) {
                let entry = ForecastRecord::scrape(self.kind, &String::from_utf8_lossy(&self.buf));
                self.entries.push(entry);
                self.buf.clear();

                if self.entries.len() >= target {
                    return true;
                }
            }
        }
        false
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.target.is_some_and(|target| self.entries.len() >= target)
    }

    /// Returns the record to publish and every entry scraped on the way.
    ///
    /// A multi-entry response that ended before any `</time>` is scraped from
    /// whatever arrived, so a truncated first entry still yields its fields.
    pub(crate) fn finish(self) -> (ForecastRecord, Vec<ForecastRecord>) {
        if self.target.is_none() || self.entries.is_empty() {
            let record = ForecastRecord::scrape(self.kind, &String::from_utf8_lossy(&self.buf));
            let entries = if self.target.is_none() { vec![record.clone()] } else { Vec::new() };
            return (record, entries);
        }

        let record = self.entries.last().cloned().unwrap_or_default();
        (record, self.entries)
    }
}

/// Status code from an `HTTP/1.x NNN ...` status line at the start of `head`.
pub(crate) fn status_code(head: &[u8]) -> Option<u16> {
    let line = head.split(|&b| b == b'\r' || b == b'\n').next()?;
    let line = std::str::from_utf8(line).ok()?;
    let mut parts = line.split_whitespace();

    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}
