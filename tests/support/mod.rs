//! Synthetic fixtures shared by the integration tests: a tiny command-stream builder and a
//! minimal populated [`GlobalState`], standing in for what a real trace replay would provide.

use footgraph::prelude::*;
use footgraph::queue_exec::subpass::{AttachmentDescription, AttachmentRef, SubpassDescriptor};

/// A handful of recorded commands, in order, plus the handle of the buffer they were recorded
/// into. Mirrors a single `vkBeginCommandBuffer .. vkEndCommandBuffer` stream.
pub struct FakeCommandStream {
    pub cb: Handle,
    pub records: Vec<(CommandId, vk::CommandBufferLevel)>,
}

impl FakeCommandStream {
    pub fn new(cb: Handle) -> Self {
        Self { cb, records: Vec::new() }
    }

    pub fn record(&mut self, builder: &mut FootprintBuilder, begin_label: Label, kind: footgraph::footprint::CommandKind, source: SubCmdIdx) -> CommandId {
        let id = builder.record_into_command_buffer(self.cb, begin_label, kind, source);
        self.records.push((id, vk::CommandBufferLevel::PRIMARY));
        id
    }
}

/// One color-only subpass with a single color attachment at index 0, no resolve/input/depth.
pub fn trivial_subpass_descriptor() -> SubpassDescriptor {
    SubpassDescriptor {
        color_attachments: vec![AttachmentRef { attachment: 0, layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL }],
        resolve_attachments: vec![None],
        input_attachments: vec![],
        depth_stencil_attachment: None,
    }
}

pub fn trivial_attachment() -> AttachmentDescription {
    AttachmentDescription {
        load_op: vk::AttachmentLoadOp::CLEAR,
        store_op: vk::AttachmentStoreOp::STORE,
        stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
        stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
        initial_layout: vk::ImageLayout::UNDEFINED,
        final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

/// A `GlobalState` populated with one image, one queue capable of everything, and nothing else —
/// enough for the priming integration tests.
pub fn state_with_one_image(usage: vk::ImageUsageFlags, format: vk::Format) -> (GlobalState, Handle, Handle) {
    let mut state = GlobalState::new();
    let image = Handle::from(1);
    let queue = Handle::from(2);
    state.queues.insert(
        queue,
        footgraph::state::QueueInfo {
            device: Handle::from(0),
            family_index: 0,
            queue_flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
        },
    );
    state.images.insert(
        image,
        footgraph::state::ImageInfo {
            format,
            image_usage: usage,
            extent: vk::Extent3D { width: 4, height: 4, depth: 1 },
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling: vk::ImageTiling::OPTIMAL,
            aspect: vk::ImageAspectFlags::COLOR,
            memory_requirements: vk::MemoryRequirements::default(),
            initial_layout: vk::ImageLayout::UNDEFINED,
            sparse_resident: false,
            last_bound_queues: vec![queue],
        },
    );
    (state, image, queue)
}

