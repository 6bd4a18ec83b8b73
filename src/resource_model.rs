//! The abstract resource model: the closed tagged union of def/use variables the dependency
//! machine and footprint builder operate over, plus the supporting types (labels, bound data,
//! descriptors, descriptor sets) that give those variables meaning.
//!
//! Variables with pointer identity are modeled as arena indices: `(category, index)` pairs with no
//! lifetime cycles, rather than actual pointers or `Rc` cells. Each category lives in its own
//! `Vec` owned by the [`crate::footprint::FootprintBuilder`](crate::footprint::FootprintBuilder)
//! that allocates them.

use std::sync::atomic::{AtomicU64, Ordering};

use ash::vk;

use crate::interval::Span;

/// Reserved handle value meaning "no object".
pub const NULL_HANDLE: u64 = 0;
/// Reserved handle value meaning "unused attachment index" (`VK_ATTACHMENT_UNUSED`).
pub const UNUSED_HANDLE: u64 = 0xFFFF_FFFF;

/// Opaque 64-bit driver-assigned identifier. Unique per object class within a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u64);

static_assertions::const_assert_eq!(std::mem::size_of::<Handle>(), std::mem::size_of::<u64>());

impl Handle {
    pub const NULL: Handle = Handle(NULL_HANDLE);
    pub const UNUSED: Handle = Handle(UNUSED_HANDLE);

    pub fn is_null(&self) -> bool {
        self.0 == NULL_HANDLE
    }
}

impl From<u64> for Handle {
    fn from(value: u64) -> Self {
        Handle(value)
    }
}

/// Process-global monotonic counter backing the ad hoc [`Label::new`] constructor. Not part of
/// any builder's seeded sequence — see [`crate::footprint::FootprintBuilder::mint_label`] for the
/// per-builder, `label_seed`-honoring mint path used by production command emission.
static NEXT_LABEL: AtomicU64 = AtomicU64::new(1);

/// A freshly-minted abstract marker with no content, used to represent state that is
/// definable/usable without a binary payload (e.g. "pipeline currently bound").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u64);

impl Label {
    /// Mint a label from the process-wide counter. Convenient for fixtures and call sites with no
    /// builder at hand, but does not participate in any [`crate::footprint::FootprintBuilder`]'s
    /// seeded sequence — use [`crate::footprint::FootprintBuilder::mint_label`] when a builder
    /// owns the label's identity.
    pub fn new() -> Self {
        Label(NEXT_LABEL.fetch_add(1, Ordering::Relaxed))
    }

    /// Construct a label from an explicit raw value. Crate-internal: only a builder's own seeded
    /// counter should mint labels this way.
    pub(crate) fn from_raw(value: u64) -> Self {
        Label(value)
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::new()
    }
}

/// A half-open byte range within one device memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemorySpan {
    pub memory: Handle,
    pub span: Span,
}

/// Arena index into a category vector owned by the footprint builder. Carries no lifetime; two
/// ids are equal iff they index the same slot, which is exactly the pointer-identity semantics
/// the starred variants need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId<Category> {
    index: usize,
    _category: std::marker::PhantomData<Category>,
}

impl<Category> ArenaId<Category> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            _category: std::marker::PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Marker categories for [`ArenaId`].
pub mod category {
    pub struct CommandBufferCommand;
    pub struct SubpassIndex;
    pub struct BoundData;
    pub struct Descriptor;
    pub struct BoundDescriptorSet;
    pub struct ForwardPairedLabel;
}

pub type CommandId = ArenaId<category::CommandBufferCommand>;
pub type SubpassId = ArenaId<category::SubpassIndex>;
pub type BoundDataId = ArenaId<category::BoundData>;
pub type DescriptorId = ArenaId<category::Descriptor>;
pub type BoundDescriptorSetId = ArenaId<category::BoundDescriptorSet>;
pub type ForwardPairedLabelId = ArenaId<category::ForwardPairedLabel>;

/// Indirection wrapping a backing variable. Binding a buffer/image to memory replaces the
/// backing; rebinding is a write to the wrapper (prior contents become dead) and a write to the
/// new backing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundDataBacking {
    /// Not yet bound to anything.
    Unbound,
    Memory(MemorySpan),
}

/// Kinds of descriptor a [`Descriptor`] can hold, matching `VkDescriptorType`'s relevant subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformBuffer,
    UniformBufferDynamic,
    StorageBuffer,
    StorageBufferDynamic,
    UniformTexelBuffer,
    StorageTexelBuffer,
    InputAttachment,
}

impl DescriptorKind {
    /// Storage-kind descriptors (images/buffers/texel buffers) accumulate into the subpass's
    /// modified-descriptor-data list and are modified rather than merely read on bind.
    pub fn is_storage_kind(&self) -> bool {
        matches!(
            self,
            DescriptorKind::StorageImage
                | DescriptorKind::StorageBuffer
                | DescriptorKind::StorageBufferDynamic
                | DescriptorKind::StorageTexelBuffer
        )
    }

    pub fn from_vk(ty: vk::DescriptorType) -> Option<Self> {
        use vk::DescriptorType as T;
        Some(match ty {
            T::SAMPLER => DescriptorKind::Sampler,
            T::COMBINED_IMAGE_SAMPLER => DescriptorKind::CombinedImageSampler,
            T::SAMPLED_IMAGE => DescriptorKind::SampledImage,
            T::STORAGE_IMAGE => DescriptorKind::StorageImage,
            T::UNIFORM_BUFFER => DescriptorKind::UniformBuffer,
            T::UNIFORM_BUFFER_DYNAMIC => DescriptorKind::UniformBufferDynamic,
            T::STORAGE_BUFFER => DescriptorKind::StorageBuffer,
            T::STORAGE_BUFFER_DYNAMIC => DescriptorKind::StorageBufferDynamic,
            T::UNIFORM_TEXEL_BUFFER => DescriptorKind::UniformTexelBuffer,
            T::STORAGE_TEXEL_BUFFER => DescriptorKind::StorageTexelBuffer,
            T::INPUT_ATTACHMENT => DescriptorKind::InputAttachment,
            _ => return None,
        })
    }
}

/// A triple `(kind, backing data, sampler handle)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub kind: DescriptorKind,
    pub backing: BoundDataId,
    pub sampler: Handle,
}

/// A sparse two-level mapping `(binding, array-index) -> Descriptor`, plus per-binding counts.
/// Bindings need not be contiguous; writes overflow from one binding into the next in
/// binding-major, array-element order, matching the Vulkan descriptor update spec.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSetTable {
    bindings: std::collections::HashMap<u32, std::collections::HashMap<u32, Descriptor>>,
    counts: std::collections::HashMap<u32, u32>,
}

impl DescriptorSetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the element count for a binding (its descriptor array length), needed to know
    /// where a write update overflows into the next binding.
    pub fn declare_binding(&mut self, binding: u32, count: u32) {
        self.counts.insert(binding, count);
        self.bindings.entry(binding).or_default();
    }

    pub fn get(&self, binding: u32, array_index: u32) -> Option<&Descriptor> {
        self.bindings.get(&binding).and_then(|m| m.get(&array_index))
    }

    /// Write `descriptors` starting at `(start_binding, start_array_index)`, overflowing into
    /// subsequent bindings (in ascending binding order) once the current binding's declared count
    /// is exhausted, exactly as `vkUpdateDescriptorSet` does.
    ///
    /// Returns the `(binding, array_index)` slot each input descriptor landed in, in order.
    pub fn write(
        &mut self,
        start_binding: u32,
        start_array_index: u32,
        descriptors: impl IntoIterator<Item = Descriptor>,
    ) -> Vec<(u32, u32)> {
        let mut sorted_bindings: Vec<u32> = self.counts.keys().copied().collect();
        sorted_bindings.sort_unstable();

        let mut cursor = sorted_bindings
            .iter()
            .position(|&b| b == start_binding)
            .unwrap_or(0);
        let mut array_index = start_array_index;
        let mut landed = Vec::new();

        for d in descriptors {
            loop {
                let binding = sorted_bindings[cursor];
                let count = *self.counts.get(&binding).unwrap_or(&0);
                if array_index < count {
                    self.bindings.entry(binding).or_default().insert(array_index, d);
                    landed.push((binding, array_index));
                    array_index += 1;
                    break;
                } else {
                    cursor += 1;
                    array_index = 0;
                }
            }
        }
        landed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> Descriptor {
        Descriptor {
            kind: DescriptorKind::UniformBuffer,
            backing: BoundDataId::new(0),
            sampler: Handle::NULL,
        }
    }

    #[test]
    fn descriptor_overflow_lands_in_expected_slots() {
        // layout [binding0 x5, binding1 x10], write 10 descriptors starting at (0, 3)
        let mut table = DescriptorSetTable::new();
        table.declare_binding(0, 5);
        table.declare_binding(1, 10);

        let landed = table.write(0, 3, std::iter::repeat_with(descriptor).take(10));
        let expected: Vec<(u32, u32)> = vec![
            (0, 3),
            (0, 4),
            (1, 0),
            (1, 1),
            (1, 2),
            (1, 3),
            (1, 4),
            (1, 5),
            (1, 6),
            (1, 7),
        ];
        assert_eq!(landed, expected);
    }

    #[test]
    fn labels_are_unique() {
        let a = Label::new();
        let b = Label::new();
        assert_ne!(a, b);
    }

    #[test]
    fn null_handle_detection() {
        assert!(Handle::NULL.is_null());
        assert!(!Handle::from(42).is_null());
    }
}
