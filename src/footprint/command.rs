//! The recorded-command shape: what a command buffer captures at record time, and how it is
//! rolled out against live queue-execution state once its owning submit is observed to execute.
//!
//! Modeled as a closed enum of command shapes plus a small payload rather than a boxed closure, so
//! the recorded stream stays serializable.

use ash::vk;

use crate::dependency::{Behavior, SubCmdIdx, Variable};
use crate::queue_exec::{subpass::AttachmentDescription, subpass::SubpassDescriptor, CbLevel, QueueExecutor};
use crate::resource_model::{BoundDataId, BoundDescriptorSetId, Descriptor, ForwardPairedLabelId, Handle, Label, MemorySpan};

/// One `vkCmd*` recorded into a command buffer, represented as a closed shape rather than a
/// closure so replay can serialize it.
#[derive(Debug, Clone)]
pub enum CommandKind {
    BindVertexBuffer {
        binding: u32,
        buffer: BoundDataId,
    },
    BindIndexBuffer {
        buffer: BoundDataId,
        index_type: vk::IndexType,
    },
    BindPipeline {
        pipeline: Label,
    },
    SetDynamicState {
        label: Label,
    },
    BindDescriptorSets {
        first_set: u32,
        sets: Vec<BoundDescriptorSetId>,
    },
    Draw,
    DrawIndexed {
        first_index: u32,
        index_count: u32,
        index_size: u64,
        index_memory: Option<MemorySpan>,
    },
    BeginRenderPass {
        render_pass: Handle,
        descriptors: Vec<SubpassDescriptor>,
        views: Vec<Handle>,
        full_image_data: Vec<bool>,
        descriptions: Vec<AttachmentDescription>,
        initial_backings: Vec<BoundDataId>,
        begin_label: ForwardPairedLabelId,
    },
    NextSubpass,
    EndRenderPass,
    /// A whole-memory barrier (no specific buffer/image given) touches every known buffer/image.
    PipelineBarrier {
        touched: Vec<Variable>,
        attached_reads: Vec<Variable>,
    },
    ClearAttachments {
        attachments: Vec<(BoundDataId, bool)>,
    },
    ExecuteCommands {
        secondary_cbs: Vec<Handle>,
    },
    Present {
        acquire_label: Label,
        present_label: Label,
    },
    /// A command kind this crate does not decode further. Conservatively alive.
    Unknown,
}

/// A command appended to a command buffer's record list: the shape plus which secondary buffers
/// it references (non-empty only for `vkCmdExecuteCommands`).
#[derive(Debug, Clone)]
pub struct CommandRecord {
    pub kind: CommandKind,
    pub is_execute_commands: bool,
    pub secondary_cbs: Vec<Handle>,
}

impl CommandRecord {
    pub fn new(kind: CommandKind) -> Self {
        let is_execute_commands = matches!(kind, CommandKind::ExecuteCommands { .. });
        let secondary_cbs = match &kind {
            CommandKind::ExecuteCommands { secondary_cbs } => secondary_cbs.clone(),
            _ => Vec::new(),
        };
        Self {
            kind,
            is_execute_commands,
            secondary_cbs,
        }
    }

    /// Roll this command out against live queue-execution state, producing its behaviors.
    ///
    /// `mint_label` mints a label from the owning builder's own seeded counter (needed only by
    /// `BeginRenderPass`, which allocates one per-attachment layout label). `conservative_unknowns`
    /// gates whether an `Unknown` command is forced alive or left DCE-eligible.
    pub fn roll_out(
        &self,
        exec: &mut QueueExecutor,
        level: CbLevel,
        source: SubCmdIdx,
        descriptor_lookup: impl Fn(BoundDescriptorSetId) -> Vec<(u32, u32, Descriptor)>,
        mint_label: &mut impl FnMut() -> Label,
        conservative_unknowns: bool,
    ) -> Vec<Behavior> {
        match &self.kind {
            CommandKind::BindVertexBuffer { binding, buffer } => {
                exec.bind_vertex_buffer(level, *binding, *buffer);
                vec![]
            }
            CommandKind::BindIndexBuffer { buffer, index_type } => {
                exec.bind_index_buffer(level, *buffer, *index_type);
                vec![]
            }
            CommandKind::BindPipeline { pipeline } => {
                exec.bind_pipeline(level, *pipeline);
                vec![]
            }
            CommandKind::SetDynamicState { label } => {
                exec.set_dynamic_state(level, *label);
                vec![]
            }
            CommandKind::BindDescriptorSets { first_set, sets } => {
                exec.bind_descriptor_sets(level, *first_set, sets);
                vec![]
            }
            CommandKind::Draw => exec.draw(level, source, descriptor_lookup),
            CommandKind::DrawIndexed {
                first_index,
                index_count,
                index_size,
                index_memory,
            } => exec.draw_indexed(level, source, *first_index, *index_count, *index_size, *index_memory, descriptor_lookup),
            CommandKind::BeginRenderPass {
                render_pass: _,
                descriptors,
                views,
                full_image_data,
                descriptions,
                initial_backings,
                begin_label,
            } => {
                exec.begin_render_pass(descriptors, views, full_image_data, descriptions, |i| initial_backings[i], *begin_label, mint_label);
                exec.start_subpass(source)
            }
            CommandKind::NextSubpass => exec.next_subpass(source),
            CommandKind::EndRenderPass => exec.end_render_pass(source),
            CommandKind::PipelineBarrier { touched, attached_reads } => crate::footprint::barrier::emit_barrier_behaviors(touched, attached_reads, source),
            CommandKind::ClearAttachments { attachments } => attachments
                .iter()
                .map(|(backing, full)| {
                    let b = Behavior::new(source.clone());
                    if *full {
                        b.writing([Variable::BoundData(*backing)])
                    } else {
                        b.modifying([Variable::BoundData(*backing)])
                    }
                })
                .collect(),
            CommandKind::ExecuteCommands { .. } => {
                exec.reset_level(CbLevel::Secondary);
                vec![]
            }
            CommandKind::Present { acquire_label, present_label } => {
                vec![Behavior::new(source)
                    .reading([Variable::Label(*acquire_label)])
                    .writing([Variable::Label(*present_label)])
                    .force_alive()]
            }
            CommandKind::Unknown => {
                let behavior = Behavior::new(source);
                if conservative_unknowns {
                    vec![behavior.force_alive()]
                } else {
                    vec![behavior]
                }
            }
        }
    }
}
