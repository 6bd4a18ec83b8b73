//! Coherent-memory write-back tracking: host-coherent memory mapped for the duration of a
//! command buffer's recording is treated as written at submission time rather than only at
//! explicit map/unmap boundaries, satisfying downstream hosts that assume observation
//! application occurs.

use crate::interval::{self, Span};
use crate::resource_model::Handle;

/// Tracks which device-memory ranges are currently host-mapped and coherent.
#[derive(Debug, Clone, Default)]
pub struct CoherentMemoryTracker {
    mapped: std::collections::HashMap<Handle, Vec<Span>>,
}

impl CoherentMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `[offset, offset+size)` of `memory` is now host-mapped and coherent.
    pub fn map(&mut self, memory: Handle, offset: u64, size: u64) {
        let list = self.mapped.entry(memory).or_default();
        interval::merge(list, Span::new(offset, offset + size), true);
    }

    pub fn unmap(&mut self, memory: Handle, offset: u64, size: u64) {
        if let Some(list) = self.mapped.get_mut(&memory) {
            interval::remove(list, Span::new(offset, offset + size));
        }
    }

    /// For the given read observation `(memory, span)`, return the sub-spans that intersect a
    /// currently-mapped coherent range — the ranges that must additionally be treated as written
    /// by this command.
    pub fn intersect_mapped(&self, memory: Handle, span: Span) -> Vec<Span> {
        let Some(list) = self.mapped.get(&memory) else { return Vec::new() };
        let (first, count) = interval::intersect(list, span);
        list[first..first + count]
            .iter()
            .map(|s| Span::new(s.start.max(span.start), s.end.min(span.end)))
            .collect()
    }
}
