//! Staging-resource allocation and destroy-deferral: the rules common to every priming strategy,
//! independent of which one is chosen.

use ash::vk;
use gpu_allocator::MemoryLocation;

use crate::resource_model::Handle;

/// Prefer device-local memory; fall back to the first offered compatible location.
pub fn choose_memory_location(candidates: &[MemoryLocation]) -> MemoryLocation {
    if candidates.contains(&MemoryLocation::GpuOnly) {
        MemoryLocation::GpuOnly
    } else {
        candidates.first().copied().unwrap_or(MemoryLocation::CpuToGpu)
    }
}

/// Staging resources over-allocate by a factor of two to accommodate driver alignment/padding
/// requirements.
pub fn staging_allocation_size(requested: u64) -> u64 {
    requested * 2
}

/// One host-copy recipe: which subresource to target and the raw bytes to copy into it. The byte
/// payload is excluded from `Debug` output since dumping it is never useful and can be large.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct HostCopyRecipe {
    pub subresource: vk::ImageSubresourceLayers,
    pub buffer_offset: u64,
    #[derivative(Debug = "ignore")]
    pub data: Vec<u8>,
}

/// A staging resource (buffer or image) awaiting destruction once its priming queue goes idle.
#[derive(Debug, Clone, Copy)]
pub struct StagingResource {
    pub handle: Handle,
    pub size: u64,
    pub location: MemoryLocation,
}

/// A compute shader's workgroup counts, sized to cover an image one texel per invocation with an
/// 8x8 local size.
#[derive(Debug, Clone, Copy)]
pub struct ComputeDispatch {
    pub group_count_x: u32,
    pub group_count_y: u32,
    pub group_count_z: u32,
}

impl ComputeDispatch {
    /// Cover `extent` with 8x8x1 workgroups, rounding up.
    pub fn covering(extent: vk::Extent3D) -> Self {
        let groups = |n: u32| n.div_ceil(8).max(1);
        Self {
            group_count_x: groups(extent.width),
            group_count_y: groups(extent.height),
            group_count_z: extent.depth.max(1),
        }
    }
}

/// A direct copy into a preinitialized, linearly-tiled image's own memory at `linear_offset`. The
/// byte payload is excluded from `Debug` output for the same reason as [`HostCopyRecipe`].
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct PreinitCopy {
    pub linear_offset: u64,
    #[derivative(Debug = "ignore")]
    pub data: Vec<u8>,
}

/// Staging resources are only ever destroyed after their queue reports idle, via a
/// post-executed callback; until then they accumulate here.
#[derive(Debug, Default)]
pub struct DestroyDeferralList {
    pending: Vec<StagingResource>,
}

impl DestroyDeferralList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, resource: StagingResource) {
        self.pending.push(resource);
    }

    /// Called from the queue-idle post-executed callback: hands back every resource queued for
    /// destruction, in reverse-of-insertion (LIFO) order, and clears the list. A later-deferred
    /// resource may depend on an earlier one still being alive, so it must be torn down first.
    pub fn drain(&mut self) -> Vec<StagingResource> {
        let mut pending = std::mem::take(&mut self.pending);
        pending.reverse();
        pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
