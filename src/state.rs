//! The global state surface this crate consumes: handle-keyed tables of every Vulkan object class
//! the footprint builder and priming engine need metadata about.
//!
//! This crate never owns a live Vulkan object — only the metadata a trace replay's state tracker
//! would otherwise expose.

use std::collections::HashMap;

use ash::vk;

use crate::error::Error;
use crate::resource_model::Handle;

/// A handle-keyed table of metadata records of one object class.
///
/// Thin wrapper so call sites read `images.get(h)` / `images.contains(h)` directly, rather than
/// reaching for `HashMap` methods by name.
#[derive(Debug, Clone, Default)]
pub struct HandleTable<T> {
    entries: HashMap<Handle, T>,
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.entries.get(&handle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.entries.get_mut(&handle)
    }

    pub fn insert(&mut self, handle: Handle, value: T) -> Option<T> {
        self.entries.insert(handle, value)
    }

    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        self.entries.remove(&handle)
    }

    /// Every handle currently present, in arbitrary order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.entries.keys().copied()
    }

    /// Look a handle up, or fail with [`Error::HandleMissing`] — the common case at call sites
    /// that must treat an absent handle as an error rather than `None`.
    pub fn require(&self, handle: Handle) -> Result<&T, Error> {
        self.get(handle).ok_or(Error::HandleMissing(handle.0))
    }
}

/// Metadata kept for one image: everything the priming engine and footprint builder need without
/// touching a live device.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub format: vk::Format,
    pub image_usage: vk::ImageUsageFlags,
    pub extent: vk::Extent3D,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub samples: vk::SampleCountFlags,
    pub tiling: vk::ImageTiling,
    pub aspect: vk::ImageAspectFlags,
    pub memory_requirements: vk::MemoryRequirements,
    pub initial_layout: vk::ImageLayout,
    pub sparse_resident: bool,
    pub last_bound_queues: Vec<Handle>,
}

/// Metadata kept for one image view used to determine the `fullImageData` heuristic.
///
/// `VkImageViewCreateInfo` carries no extent of its own; `extent` here is the view's extent at
/// its base mip level, derived from the backing image when the view is recorded.
#[derive(Debug, Clone)]
pub struct ImageViewInfo {
    pub image: Handle,
    pub view_type: vk::ImageViewType,
    pub base_array_layer: u32,
    pub layer_count: u32,
    pub base_mip_level: u32,
    pub level_count: u32,
    pub extent: vk::Extent3D,
}

#[derive(Debug, Clone)]
pub struct BufferInfo {
    pub size: vk::DeviceSize,
    pub memory_requirements: vk::MemoryRequirements,
}

#[derive(Debug, Clone)]
pub struct MemoryInfo {
    pub size: vk::DeviceSize,
    pub memory_type_index: u32,
    pub host_coherent: bool,
    pub mapped_ptr: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct QueueInfo {
    pub device: Handle,
    pub family_index: u32,
    pub queue_flags: vk::QueueFlags,
}

#[derive(Debug, Clone)]
pub struct CommandPoolInfo {
    pub family_index: u32,
}

#[derive(Debug, Clone)]
pub struct CommandBufferInfo {
    pub pool: Handle,
    pub is_secondary: bool,
}

#[derive(Debug, Clone)]
pub struct RenderPassInfo {
    pub subpasses: Vec<crate::queue_exec::subpass::SubpassDescriptor>,
    pub attachments: Vec<crate::queue_exec::subpass::AttachmentDescription>,
}

#[derive(Debug, Clone)]
pub struct FramebufferInfo {
    pub attachments: Vec<Handle>,
    pub width: u32,
    pub height: u32,
    pub layers: u32,
}

/// Aggregates one [`HandleTable`] per Vulkan object class whose metadata the footprint builder,
/// queue-execution model, and priming engine consume.
#[derive(Debug, Default)]
pub struct GlobalState {
    pub images: HandleTable<ImageInfo>,
    pub image_views: HandleTable<ImageViewInfo>,
    pub buffers: HandleTable<BufferInfo>,
    pub memories: HandleTable<MemoryInfo>,
    pub queues: HandleTable<QueueInfo>,
    pub command_pools: HandleTable<CommandPoolInfo>,
    pub command_buffers: HandleTable<CommandBufferInfo>,
    pub descriptor_set_layouts: HandleTable<Vec<(u32, vk::DescriptorType, u32)>>,
    pub descriptor_sets: HandleTable<Handle>,
    pub render_passes: HandleTable<RenderPassInfo>,
    pub framebuffers: HandleTable<FramebufferInfo>,
    pub samplers: HandleTable<()>,
    pub query_pools: HandleTable<()>,
    pub semaphores: HandleTable<()>,
    pub fences: HandleTable<()>,
    pub events: HandleTable<()>,
    pub swapchains: HandleTable<Vec<Handle>>,
    pub pipelines: HandleTable<Handle>,
    pub pipeline_layouts: HandleTable<()>,
    pub shader_modules: HandleTable<()>,
}

/// The extent of `image` at mip `level`, each dimension halved and floored per level, clamped to
/// at least 1 — the same rule the view's `extent` field is expected to have been derived with.
pub fn extent_at_mip_level(extent: vk::Extent3D, level: u32) -> vk::Extent3D {
    vk::Extent3D {
        width: (extent.width >> level).max(1),
        height: (extent.height >> level).max(1),
        depth: (extent.depth >> level).max(1),
    }
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff `view` covers the entirety of its backing image: all layers, all mips, matching
    /// extent — the "full image data" heuristic from the Queue-Execution Model.
    pub fn is_full_image_data(&self, view: Handle) -> bool {
        let Some(view_info) = self.image_views.get(view) else { return false };
        let Some(image) = self.images.get(view_info.image) else { return false };

        let is_2d_like = matches!(
            view_info.view_type,
            vk::ImageViewType::TYPE_2D | vk::ImageViewType::TYPE_2D_ARRAY
        );
        let base_extent = extent_at_mip_level(image.extent, view_info.base_mip_level);
        is_2d_like
            && view_info.base_array_layer == 0
            && view_info.layer_count == image.array_layers
            && view_info.base_mip_level == 0
            && view_info.level_count == image.mip_levels
            && view_info.extent == base_extent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_table_require_errors_on_missing() {
        let table: HandleTable<u32> = HandleTable::new();
        let err = table.require(Handle::from(5)).unwrap_err();
        assert!(matches!(err, Error::HandleMissing(5)));
    }

    #[test]
    fn full_image_data_true_for_whole_2d_view() {
        let mut state = GlobalState::new();
        let image = Handle::from(1);
        state.images.insert(
            image,
            ImageInfo {
                format: vk::Format::R8G8B8A8_UNORM,
                image_usage: vk::ImageUsageFlags::SAMPLED,
                extent: vk::Extent3D {
                    width: 64,
                    height: 64,
                    depth: 1,
                },
                mip_levels: 1,
                array_layers: 1,
                samples: vk::SampleCountFlags::TYPE_1,
                tiling: vk::ImageTiling::OPTIMAL,
                aspect: vk::ImageAspectFlags::COLOR,
                memory_requirements: vk::MemoryRequirements::default(),
                initial_layout: vk::ImageLayout::UNDEFINED,
                sparse_resident: false,
                last_bound_queues: vec![],
            },
        );
        let view = Handle::from(2);
        state.image_views.insert(
            view,
            ImageViewInfo {
                image,
                view_type: vk::ImageViewType::TYPE_2D,
                base_array_layer: 0,
                layer_count: 1,
                base_mip_level: 0,
                level_count: 1,
                extent: vk::Extent3D {
                    width: 64,
                    height: 64,
                    depth: 1,
                },
            },
        );
        assert!(state.is_full_image_data(view));
    }

    #[test]
    fn full_image_data_false_when_extent_does_not_match() {
        let mut state = GlobalState::new();
        let image = Handle::from(1);
        state.images.insert(
            image,
            ImageInfo {
                format: vk::Format::R8G8B8A8_UNORM,
                image_usage: vk::ImageUsageFlags::SAMPLED,
                extent: vk::Extent3D {
                    width: 64,
                    height: 64,
                    depth: 1,
                },
                mip_levels: 1,
                array_layers: 1,
                samples: vk::SampleCountFlags::TYPE_1,
                tiling: vk::ImageTiling::OPTIMAL,
                aspect: vk::ImageAspectFlags::COLOR,
                memory_requirements: vk::MemoryRequirements::default(),
                initial_layout: vk::ImageLayout::UNDEFINED,
                sparse_resident: false,
                last_bound_queues: vec![],
            },
        );
        let view = Handle::from(2);
        state.image_views.insert(
            view,
            ImageViewInfo {
                image,
                view_type: vk::ImageViewType::TYPE_2D,
                base_array_layer: 0,
                layer_count: 1,
                base_mip_level: 0,
                level_count: 1,
                extent: vk::Extent3D {
                    width: 32,
                    height: 32,
                    depth: 1,
                },
            },
        );
        assert!(!state.is_full_image_data(view));
    }

    #[test]
    fn full_image_data_false_for_partial_view() {
        let mut state = GlobalState::new();
        let image = Handle::from(1);
        state.images.insert(
            image,
            ImageInfo {
                format: vk::Format::R8G8B8A8_UNORM,
                image_usage: vk::ImageUsageFlags::SAMPLED,
                extent: vk::Extent3D {
                    width: 64,
                    height: 64,
                    depth: 1,
                },
                mip_levels: 4,
                array_layers: 1,
                samples: vk::SampleCountFlags::TYPE_1,
                tiling: vk::ImageTiling::OPTIMAL,
                aspect: vk::ImageAspectFlags::COLOR,
                memory_requirements: vk::MemoryRequirements::default(),
                initial_layout: vk::ImageLayout::UNDEFINED,
                sparse_resident: false,
                last_bound_queues: vec![],
            },
        );
        let view = Handle::from(2);
        state.image_views.insert(
            view,
            ImageViewInfo {
                image,
                view_type: vk::ImageViewType::TYPE_2D,
                base_array_layer: 0,
                layer_count: 1,
                base_mip_level: 0,
                level_count: 1,
                extent: vk::Extent3D {
                    width: 64,
                    height: 64,
                    depth: 1,
                },
            },
        );
        assert!(!state.is_full_image_data(view));
    }
}
