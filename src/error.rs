//! Exposes the footgraph error type.

use thiserror::Error;

use crate::interval::Span;

/// Error type returned by the fallible APIs of this crate.
///
/// Per the propagation policy, most of these are attached to a [`Behavior`](crate::dependency::Behavior)
/// rather than bubbled up as a hard failure: footprint emission itself never throws. Command-splitter
/// errors are the exception — invalid command-buffer shapes are programmer bugs and are expected to
/// panic rather than round-trip through this type. Priming errors are genuine user-facing failures.
#[derive(Error, Debug)]
pub enum Error {
    /// No queue exists with the requested capability set.
    #[error("no queue found with the required capability set")]
    NullQueue,
    /// A priming strategy that is not yet implemented for this combination of image properties.
    #[error("priming strategy not implemented for this image configuration")]
    NotImplemented,
    /// A queue existed in the old replay state but not in the new one.
    #[error("queue no longer exists in the new replay state")]
    QueueNotInNewState,
    /// A referenced handle is absent from the expected global state table.
    #[error("handle `{0:#x}` missing from global state")]
    HandleMissing(u64),
    /// The binding tracker's `shrink` was asked to shrink a span out of its own bounds.
    #[error("shrink out of bounds: span {span:?}, offset {offset}, size {size}")]
    ShrinkOutOfBounds {
        span: Span,
        offset: u64,
        size: u64,
    },
    /// The executed sub-command index did not match the next pending sub-command index.
    #[error("ordering violation: expected sub-command `{expected}`, got `{actual}`")]
    OrderingViolation {
        expected: String,
        actual: String,
    },
    /// The texel-block unpacker encountered a format it does not implement.
    #[error("unsupported texel format for unpacking: `{0:?}`")]
    UnsupportedFormat(ash::vk::Format),
    /// A bit-extraction or range computation request was out of bounds.
    #[error("dimension error: {0}")]
    DimensionError(String),
    /// A mutation determined that the command is malformed. Emission continues; the behavior
    /// carrying this error is marked aborted.
    #[error("aborted: {0}")]
    Aborted(String),
    /// A priming strategy that reconstructs an image from host-captured bytes was selected, but
    /// no host data was supplied to build its kit.
    #[error("priming strategy requires host data but none was supplied")]
    MissingHostData,
}
