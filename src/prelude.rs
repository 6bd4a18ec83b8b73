//! Re-exports of the most commonly used types.

pub use ash::vk;

pub use crate::dependency::{Behavior, DependencyMachine, SubCmdIdx, Variable};
pub use crate::error::Error;
pub use crate::footprint::FootprintBuilder;
pub use crate::interval::{Span, SpanList};
pub use crate::memory_binding::{Binding, MemBindingList};
pub use crate::priming::{PrimeKit, Primeable, PrimingEngine};
pub use crate::queue_exec::QueueExecutor;
pub use crate::resource_model::{
    BoundDataId, BoundDescriptorSetId, CommandId, Descriptor, DescriptorId, DescriptorKind,
    DescriptorSetTable, ForwardPairedLabelId, Handle, Label, MemorySpan, SubpassId,
};
pub use crate::splitter::CommandSplitter;
pub use crate::state::GlobalState;

pub use traits::*;

/// Re-exports of the library's public traits.
pub mod traits {
    pub use crate::dependency::graphviz::dot as behavior_dot;
}
