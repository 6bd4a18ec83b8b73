//! Per-device-memory ordered list of bindings, with conflict resolution when a new binding
//! overlaps existing ones.
//!
//! A `vkBindBufferMemory`/`vkBindImageMemory` call attaches a byte range of one `VkDeviceMemory`
//! to a buffer or image. Two bindings can legally overlap in raw Vulkan (aliasing), but for
//! liveness purposes the *most recent* binding wins over the range it covers, so this tracker
//! keeps the list non-overlapping by truncating, splitting, or deleting whatever the incoming
//! binding shadows. This is the write side of [`crate::dependency`]'s def/use bookkeeping for
//! memory spans.

use crate::interval::Span;
use crate::Error;

/// One binding of `payload` to a half-open byte range of a device memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding<T> {
    pub span: Span,
    pub payload: T,
}

/// Ordered, conflict-resolved list of bindings against a single `VkDeviceMemory`.
#[derive(Debug, Clone, Default)]
pub struct MemBindingList<T> {
    bindings: Vec<Binding<T>>,
}

impl<T: Clone> MemBindingList<T> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// All current bindings, ordered by span start ascending.
    pub fn bindings(&self) -> &[Binding<T>] {
        &self.bindings
    }

    /// Add a new binding, resolving conflicts with any existing binding it overlaps.
    ///
    /// For each existing span `s` intersecting the incoming `b`, exactly one of four outcomes
    /// applies (see component 4.B): shrink `s`'s tail, shrink its head, split it in two, or
    /// delete it outright. The whole operation is externally atomic: if any `shrink` call fails
    /// (would move a bound outside the original span) the tracker is left untouched and the error
    /// is propagated with the span, offset and size that failed.
    pub fn add_binding(&mut self, incoming: Binding<T>) -> Result<(), Error> {
        let resolved = Self::resolve(&self.bindings, incoming)?;
        self.bindings = resolved;
        self.bindings.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then(a.span.end.cmp(&b.span.end))
        });
        Ok(())
    }

    fn resolve(existing: &[Binding<T>], incoming: Binding<T>) -> Result<Vec<Binding<T>>, Error> {
        let b = incoming.span;
        let mut out = Vec::with_capacity(existing.len() + 1);
        for entry in existing {
            let s = entry.span;
            if !s.overlaps(&b) {
                out.push(entry.clone());
                continue;
            }

            if s.start < b.start && b.start < s.end && s.end <= b.end {
                // Shrink the tail of s to [s.start, b.start)
                let mut shrunk = entry.clone();
                let overlap = s.end - b.start;
                shrunk.span.shrink(0, s.len() - overlap)?;
                out.push(shrunk);
            } else if b.start <= s.start && s.start < b.end && s.end > b.end {
                // Shrink the head of s to [b.end, s.end)
                let mut shrunk = entry.clone();
                let overlap = b.end - s.start;
                shrunk.span.shrink(overlap, s.len() - overlap)?;
                out.push(shrunk);
            } else if s.start < b.start && s.end > b.end {
                // Split s into [s.start, b.start) and [b.end, s.end)
                let mut head = entry.clone();
                head.span.shrink(0, b.start - s.start)?;
                out.push(head);

                let mut tail = entry.clone();
                tail.span.shrink(b.end - s.start, s.end - b.end)?;
                out.push(tail);
            } else if b.start <= s.start && s.end <= b.end {
                // Fully covered: delete s.
            } else {
                unreachable!("span overlap classification is exhaustive");
            }
        }
        out.push(incoming);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(a: u64, b: u64, payload: &'static str) -> Binding<&'static str> {
        Binding {
            span: Span::new(a, b),
            payload,
        }
    }

    fn spans<T>(list: &MemBindingList<T>) -> Vec<(u64, u64)> {
        list.bindings().iter().map(|b| (b.span.start, b.span.end)).collect()
    }

    #[test]
    fn non_overlapping_bindings_are_kept() {
        let mut list = MemBindingList::new();
        list.add_binding(bind(0, 10, "a")).unwrap();
        list.add_binding(bind(20, 30, "b")).unwrap();
        assert_eq!(spans(&list), vec![(0, 10), (20, 30)]);
    }

    #[test]
    fn split_resolve_outcome_from_testable_properties() {
        // addBinding on L=[[0,10),[20,30)] with b=[5,25) yields [[0,5),[5,25),[25,30)]
        let mut list = MemBindingList::new();
        list.add_binding(bind(0, 10, "a")).unwrap();
        list.add_binding(bind(20, 30, "b")).unwrap();
        list.add_binding(bind(5, 25, "c")).unwrap();
        assert_eq!(spans(&list), vec![(0, 5), (5, 25), (25, 30)]);
    }

    #[test]
    fn shrink_tail_on_partial_head_overlap() {
        let mut list = MemBindingList::new();
        list.add_binding(bind(0, 10, "a")).unwrap();
        list.add_binding(bind(5, 15, "b")).unwrap();
        assert_eq!(spans(&list), vec![(0, 5), (5, 15)]);
    }

    #[test]
    fn shrink_head_on_partial_tail_overlap() {
        let mut list = MemBindingList::new();
        list.add_binding(bind(10, 20, "a")).unwrap();
        list.add_binding(bind(5, 15, "b")).unwrap();
        assert_eq!(spans(&list), vec![(5, 15), (15, 20)]);
    }

    #[test]
    fn full_containment_deletes_existing() {
        let mut list = MemBindingList::new();
        list.add_binding(bind(0, 10, "a")).unwrap();
        list.add_binding(bind(0, 10, "b")).unwrap();
        assert_eq!(spans(&list), vec![(0, 10)]);
        assert_eq!(list.bindings()[0].payload, "b");
    }

    #[test]
    fn result_is_always_non_overlapping() {
        let mut list = MemBindingList::new();
        list.add_binding(bind(0, 100, "base")).unwrap();
        list.add_binding(bind(10, 20, "x")).unwrap();
        list.add_binding(bind(50, 60, "y")).unwrap();
        list.add_binding(bind(15, 55, "z")).unwrap();
        let s = spans(&list);
        for w in s.windows(2) {
            assert!(w[0].1 <= w[1].0, "overlap between {:?} and {:?}", w[0], w[1]);
        }
    }
}
