//! Ordered, non-overlapping, half-open spans of `u64` and the handful of set operations the rest
//! of the crate builds on: [`search`], [`intersect`], [`merge`] and [`remove`].
//!
//! A [`SpanList`] is kept sorted by `start` ascending (ties broken by `end` ascending) and
//! non-overlapping at all times; every operation here both assumes and preserves that invariant.
//! This mirrors the interval trees commonly used for GPU sub-allocation, reduced to the purely
//! functional subset this crate needs: there is no backing allocation here, only set algebra over
//! byte ranges.

use std::cmp::Ordering;

/// A half-open byte range `[start, end)`.
///
/// `end >= start` is a contract of every constructor; a zero-length span (`start == end`) is legal
/// but carries no liveness (see [`Span::is_empty`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

impl Span {
    /// Create a new span. Panics if `end < start`, matching the size contract in the data model.
    pub fn new(start: u64, end: u64) -> Self {
        assert!(end >= start, "span end {end} before start {start}");
        Self {
            start,
            end,
        }
    }

    /// Number of bytes covered by this span.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// True if this span covers no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `self` and `other` share at least one byte.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True if `self` fully contains `other`.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Order spans by start ascending, ties broken by end ascending. This is the determinism
    /// contract every enumeration in this module follows.
    fn cmp_order(&self, other: &Span) -> Ordering {
        self.start.cmp(&other.start).then(self.end.cmp(&other.end))
    }

    /// Shrink this span in place to `[start + offset, start + offset + size)`.
    ///
    /// Returns [`crate::Error::ShrinkOutOfBounds`] if the requested sub-range does not fit inside
    /// the current span.
    pub fn shrink(&mut self, offset: u64, size: u64) -> Result<(), crate::Error> {
        let new_start = self.start + offset;
        let new_end = new_start + size;
        if offset > self.len() || new_end > self.end {
            return Err(crate::Error::ShrinkOutOfBounds {
                span: *self,
                offset,
                size,
            });
        }
        self.start = new_start;
        self.end = new_end;
        Ok(())
    }
}

/// An ordered, non-overlapping list of spans. A thin `Vec<Span>` wrapper so call sites read as
/// "the span list", matching [`crate::memory_binding::MemBindingList`]'s naming style.
pub type SpanList = Vec<Span>;

/// Lowest index `i` such that `predicate(list[i])` holds, assuming `predicate` is monotone (false
/// for all indices below some threshold, true from there on). Returns `list.len()` if no such
/// index exists.
pub fn search(list: &SpanList, predicate: impl Fn(&Span) -> bool) -> usize {
    list.partition_point(|s| !predicate(s))
}

/// First index and count of spans in `list` that overlap `query`.
pub fn intersect(list: &SpanList, query: Span) -> (usize, usize) {
    let first = search(list, |s| s.end > query.start);
    let count = list[first..]
        .iter()
        .take_while(|s| s.start < query.end)
        .count();
    (first, count)
}

/// Insert `query` into `list`, removing any existing coverage it overlaps and replacing it.
/// If `coalesce` is true, the inserted span is merged with immediately-touching neighbors
/// (`left.end == query.start` or `query.end == right.start`) into a single span.
pub fn merge(list: &mut SpanList, query: Span, coalesce: bool) {
    if query.is_empty() {
        return;
    }
    remove(list, query);
    let mut insert_at = search(list, |s| s.start >= query.start);
    let mut span = query;

    if coalesce {
        if insert_at > 0 {
            let left = list[insert_at - 1];
            if left.end == span.start {
                span.start = left.start;
                insert_at -= 1;
                list.remove(insert_at);
            }
        }
        if insert_at < list.len() {
            let right = list[insert_at];
            if span.end == right.start {
                span.end = right.end;
                list.remove(insert_at);
            }
        }
    }

    list.insert(insert_at, span);
}

/// Subtract `query` from every span in `list`, splitting spans as needed so the result remains
/// non-overlapping.
pub fn remove(list: &mut SpanList, query: Span) {
    if query.is_empty() {
        return;
    }
    let (first, count) = intersect(list, query);
    if count == 0 {
        return;
    }
    let affected: Vec<Span> = list.splice(first..first + count, std::iter::empty()).collect();
    let mut replacement: Vec<Span> = Vec::with_capacity(affected.len());
    for s in affected {
        if s.start < query.start {
            replacement.push(Span::new(s.start, query.start.min(s.end)));
        }
        if s.end > query.end {
            replacement.push(Span::new(query.end.max(s.start), s.end));
        }
    }
    replacement.sort_by(|a, b| a.cmp_order(b));
    for (i, s) in replacement.into_iter().enumerate() {
        list.insert(first + i, s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(a: u64, b: u64) -> Span {
        Span::new(a, b)
    }

    #[test]
    fn merge_into_empty() {
        let mut list = SpanList::new();
        merge(&mut list, span(10, 20), true);
        assert_eq!(list, vec![span(10, 20)]);
    }

    #[test]
    fn merge_coalesces_touching_spans() {
        let mut list = vec![span(0, 10), span(20, 30)];
        merge(&mut list, span(10, 20), true);
        assert_eq!(list, vec![span(0, 30)]);
    }

    #[test]
    fn merge_without_coalesce_keeps_spans_distinct() {
        let mut list = vec![span(0, 10), span(20, 30)];
        merge(&mut list, span(10, 20), false);
        assert_eq!(list, vec![span(0, 10), span(10, 20), span(20, 30)]);
    }

    #[test]
    fn remove_splits_containing_span() {
        let mut list = vec![span(0, 30)];
        remove(&mut list, span(10, 20));
        assert_eq!(list, vec![span(0, 10), span(20, 30)]);
    }

    #[test]
    fn remove_truncates_partial_overlap() {
        let mut list = vec![span(0, 10), span(20, 30)];
        remove(&mut list, span(5, 25));
        assert_eq!(list, vec![span(0, 5), span(25, 30)]);
    }

    #[test]
    fn intersect_returns_exact_window() {
        let list = vec![span(0, 10), span(10, 20), span(30, 40)];
        let (first, count) = intersect(&list, span(5, 35));
        assert_eq!(first, 0);
        assert_eq!(count, 3);

        let (first, count) = intersect(&list, span(21, 29));
        assert_eq!(first, 2);
        assert_eq!(count, 0);
    }

    #[test]
    fn merge_then_remove_round_trips_modulo_coalescing() {
        let original = vec![span(0, 10), span(20, 30)];
        let mut list = original.clone();
        merge(&mut list, span(10, 20), false);
        remove(&mut list, span(10, 20));
        assert_eq!(list, original);
    }

    #[test]
    fn shrink_out_of_bounds_errors() {
        let mut s = span(0, 10);
        let err = s.shrink(5, 10).unwrap_err();
        assert!(matches!(err, crate::Error::ShrinkOutOfBounds { .. }));
    }

    #[test]
    fn shrink_in_bounds() {
        let mut s = span(0, 10);
        s.shrink(2, 5).unwrap();
        assert_eq!(s, span(2, 7));
    }
}
