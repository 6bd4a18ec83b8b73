//! The Queue-Execution Model: per-queue pipeline/descriptor/subpass state, and the render-pass
//! begin/next/end and draw-dispatch semantics that turn deferred command-buffer commands into
//! concrete [`Behavior`]s once their owning submit is rolled out.

pub mod state;
pub mod subpass;

use crate::dependency::{Behavior, SubCmdIdx, Variable};
use crate::error::Error;
use crate::resource_model::{BoundDataId, BoundDescriptorSetId, Descriptor, DescriptorKind, ForwardPairedLabelId, Label, MemorySpan};

pub use state::{CbLevel, CommandBufferExecutionState};
pub use subpass::{AttachmentDescription, AttachmentRef, AttachmentState, SubpassDescriptor, SubpassInfo};

/// Live, per-queue execution state: which subpass is active, the attachment table for the current
/// render pass, and the primary/secondary command-buffer execution states.
#[derive(Debug, Clone, Default)]
pub struct QueueExecInfo {
    pub primary_state: CommandBufferExecutionState,
    pub secondary_state: CommandBufferExecutionState,
    pub subpasses: Vec<SubpassInfo>,
    pub current_subpass: usize,
    pub render_pass_begin_label: Option<ForwardPairedLabelId>,
    pub attachments: Vec<AttachmentState>,
    pub last_submit_id: u64,
}

/// Drives one queue's [`QueueExecInfo`] as deferred command-buffer commands are rolled out.
#[derive(Debug, Clone, Default)]
pub struct QueueExecutor {
    pub info: QueueExecInfo,
}

impl QueueExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn cb_state(&mut self, level: CbLevel) -> &mut CommandBufferExecutionState {
        match level {
            CbLevel::Primary => &mut self.info.primary_state,
            CbLevel::Secondary => &mut self.info.secondary_state,
        }
    }

    /// Transition into a fresh command-buffer level (primary↔secondary), resetting its bound
    /// state — `vkCmdExecuteCommands` starts the secondary level with no inherited bindings.
    pub fn reset_level(&mut self, level: CbLevel) {
        *self.cb_state(level) = CommandBufferExecutionState::new();
    }

    pub fn bind_vertex_buffer(&mut self, level: CbLevel, binding: u32, buffer: BoundDataId) {
        self.cb_state(level).vertex_buffers.insert(binding, buffer);
    }

    pub fn bind_index_buffer(&mut self, level: CbLevel, buffer: BoundDataId, index_type: ash::vk::IndexType) {
        let state = self.cb_state(level);
        state.index_buffer = Some(buffer);
        state.index_type = Some(index_type);
    }

    pub fn bind_pipeline(&mut self, level: CbLevel, pipeline: Label) {
        self.cb_state(level).pipeline = Some(pipeline);
    }

    pub fn set_dynamic_state(&mut self, level: CbLevel, label: Label) {
        self.cb_state(level).dynamic_state = Some(label);
    }

    pub fn bind_descriptor_sets(&mut self, level: CbLevel, first_set: u32, sets: &[BoundDescriptorSetId]) {
        let state = self.cb_state(level);
        for (i, &set) in sets.iter().enumerate() {
            state.descriptor_sets.insert(first_set + i as u32, set);
        }
    }

    /// Begin a render pass: build the attachment table and assign load/store-list membership per
    /// subpass, then reset the subpass cursor to 0. `mint_label` allocates each attachment's
    /// initial layout label from the owning builder's own seeded counter.
    pub fn begin_render_pass(
        &mut self,
        descriptors: &[SubpassDescriptor],
        views: &[crate::resource_model::Handle],
        full_image_data: &[bool],
        descriptions: &[AttachmentDescription],
        initial_backing: impl Fn(usize) -> BoundDataId,
        begin_label: ForwardPairedLabelId,
        mint_label: &mut impl FnMut() -> Label,
    ) {
        self.info.attachments = subpass::begin_render_pass(views, full_image_data, descriptions, initial_backing, mint_label);
        self.info.subpasses = subpass::assign_load_store_lists(descriptors, views.len());
        self.info.current_subpass = 0;
        self.info.render_pass_begin_label = Some(begin_label);
    }

    fn current_subpass_index_var(&self) -> Variable {
        Variable::Subpass(crate::resource_model::SubpassId::new(self.info.current_subpass))
    }

    /// Emit load behaviors for the current subpass.
    pub fn start_subpass(&mut self, source: SubCmdIdx) -> Vec<Behavior> {
        let subpass = &self.info.subpasses[self.info.current_subpass];
        subpass::start_subpass(subpass, &mut self.info.attachments, source)
    }

    /// Emit store/resolve/modified-descriptor behaviors for the current subpass.
    pub fn end_subpass(&mut self, source: SubCmdIdx) -> Vec<Behavior> {
        let subpass = &self.info.subpasses[self.info.current_subpass];
        subpass::end_subpass(subpass, &self.info.attachments, self.current_subpass_index_var(), source)
    }

    /// End the current subpass, move to the next, and start it.
    pub fn next_subpass(&mut self, source: SubCmdIdx) -> Vec<Behavior> {
        let mut behaviors = self.end_subpass(source.clone());
        self.info.current_subpass += 1;
        behaviors.extend(self.start_subpass(source));
        behaviors
    }

    /// End the render pass: just ends the current (last) subpass.
    pub fn end_render_pass(&mut self, source: SubCmdIdx) -> Vec<Behavior> {
        self.end_subpass(source)
    }

    /// Emit the behavior for a (non-indexed) draw call.
    pub fn draw(&mut self, level: CbLevel, source: SubCmdIdx, descriptor_lookup: impl Fn(BoundDescriptorSetId) -> Vec<(u32, u32, Descriptor)>) -> Vec<Behavior> {
        let subpass_idx = self.info.current_subpass;
        let state = self.cb_state(level).clone();

        let mut reads = vec![self.current_subpass_index_var()];
        if let Some(pipeline) = state.pipeline {
            reads.push(Variable::Label(pipeline));
        }
        if let Some(dyn_state) = state.dynamic_state {
            reads.push(Variable::Label(dyn_state));
        }
        reads.extend(state.vertex_buffers.values().map(|&b| Variable::BoundData(b)));
        if let Some(index_buffer) = state.index_buffer {
            reads.push(Variable::BoundData(index_buffer));
        }

        let mut modifies = Vec::new();
        for &set in state.descriptor_sets.values() {
            for (_, _, d) in descriptor_lookup(set) {
                reads.push(Variable::Handle(d.sampler));
                if d.kind.is_storage_kind() {
                    modifies.push(Variable::BoundData(d.backing));
                    self.info.subpasses[subpass_idx]
                        .modified_descriptor_data
                        .push(Variable::BoundData(d.backing));
                } else {
                    reads.push(Variable::BoundData(d.backing));
                }
            }
        }

        let subpass = &self.info.subpasses[subpass_idx];
        for attachment in subpass.descriptor.input_attachments.iter() {
            reads.push(Variable::BoundData(self.info.attachments[attachment.attachment as usize].backing));
        }
        for attachment in subpass.descriptor.color_attachments.iter() {
            modifies.push(Variable::BoundData(self.info.attachments[attachment.attachment as usize].backing));
        }
        if let Some(ds) = subpass.descriptor.depth_stencil_attachment {
            modifies.push(Variable::BoundData(self.info.attachments[ds.attachment as usize].backing));
        }

        vec![Behavior::new(source).reading(reads).modifying(modifies)]
    }

    /// Emit the behavior for an indexed draw call: everything [`Self::draw`] reads/modifies, plus
    /// a read of the index buffer's sub-range `[first_index*index_size, (first_index+count)*index_size)`.
    pub fn draw_indexed(
        &mut self,
        level: CbLevel,
        source: SubCmdIdx,
        first_index: u32,
        index_count: u32,
        index_size: u64,
        index_memory: Option<MemorySpan>,
        descriptor_lookup: impl Fn(BoundDescriptorSetId) -> Vec<(u32, u32, Descriptor)>,
    ) -> Vec<Behavior> {
        let mut behaviors = self.draw(level, source, descriptor_lookup);
        if let Some(index_memory) = index_memory {
            let start = index_memory.span.start + first_index as u64 * index_size;
            let end = index_memory.span.start + (first_index as u64 + index_count as u64) * index_size;
            let span = crate::interval::Span::new(start, end);
            if let Some(b) = behaviors.last_mut() {
                *b = std::mem::take(b).reading([Variable::Memory(MemorySpan {
                    memory: index_memory.memory,
                    span,
                })]);
            }
        }
        behaviors
    }
}

/// Validate that `descriptor.kind` matches a Vulkan descriptor type, used by the footprint
/// builder when translating a raw `vkUpdateDescriptorSet` write into a [`Descriptor`].
pub fn descriptor_kind_from_vk(ty: ash::vk::DescriptorType) -> Result<DescriptorKind, Error> {
    DescriptorKind::from_vk(ty).ok_or(Error::NotImplemented)
}
