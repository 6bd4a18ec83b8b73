//! The Command Splitter: rewrites a recorded command stream so external tooling can be invoked
//! between arbitrary sub-commands, including mid-render-pass and mid-subpass, by synthesizing
//! patched render passes and re-parented pipelines around each cut point.

pub mod external_memory;
pub mod pipeline_reparent;
pub mod renderpass_variants;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use ash::vk;

pub use pipeline_reparent::ClonedPipeline;
pub use renderpass_variants::{RenderPassVariants, Variant};

use crate::dependency::SubCmdIdx;
use crate::footprint::CommandKind;
use crate::queue_exec::subpass::{AttachmentDescription, SubpassDescriptor};
use crate::resource_model::{CommandId, Handle};

/// Handles minted by the splitter for synthesized render passes, clones, and transient
/// command pools/buffers live in the upper half of the handle space so they can never collide
/// with a handle that appeared in the original trace.
static NEXT_SYNTHETIC_HANDLE: AtomicU64 = AtomicU64::new(1 << 63);

fn mint_handle() -> Handle {
    Handle::from(NEXT_SYNTHETIC_HANDLE.fetch_add(1, Ordering::Relaxed))
}

/// One command in the rewritten stream: either a command from the original stream, a render-pass
/// boundary the splitter inserted, or the cut sentinel itself.
#[derive(Debug, Clone)]
pub enum SplicedCommand {
    Original(CommandId),
    EndRenderPass,
    BeginRenderPass {
        render_pass: Handle,
        subpass: SubpassDescriptor,
        attachments: Vec<AttachmentDescription>,
    },
    /// The point at which external tooling runs; corresponds to one requested split point.
    Insertion(SubCmdIdx),
}

/// Everything the splitter needs to know about the render pass currently open while walking a
/// command buffer's command list.
#[derive(Debug, Clone)]
struct OpenRenderPass {
    handle: Handle,
    subpass_index: usize,
    subpass_count: usize,
    descriptors: Vec<SubpassDescriptor>,
    attachments: Vec<AttachmentDescription>,
    post_subpass_layouts: Vec<vk::ImageLayout>,
}

/// Rewrites command buffers to splice in cut points, caching synthesized render-pass variants and
/// re-parented pipelines per original handle, and lazily creating the transient pool/buffers the
/// inserted commands are recorded into.
#[derive(Debug, Default)]
pub struct CommandSplitter {
    cut_points: Vec<SubCmdIdx>,
    variant_cache: HashMap<(Handle, usize), RenderPassVariants>,
    pipeline_cache: HashMap<Handle, ClonedPipeline>,
    transient_pool: Option<Handle>,
    insert_buffers: Vec<Handle>,
}

impl CommandSplitter {
    pub fn new(cut_points: Vec<SubCmdIdx>) -> Self {
        Self {
            cut_points,
            ..Default::default()
        }
    }

    fn is_cut_point(&self, idx: &SubCmdIdx) -> bool {
        self.cut_points.contains(idx)
    }

    /// Lazily create the transient command pool these insert buffers are allocated from.
    pub fn ensure_transient_pool(&mut self) -> Handle {
        *self.transient_pool.get_or_insert_with(mint_handle)
    }

    /// Allocate a fresh per-insert command buffer from the transient pool.
    pub fn alloc_insert_buffer(&mut self) -> Handle {
        self.ensure_transient_pool();
        let buf = mint_handle();
        self.insert_buffers.push(buf);
        buf
    }

    /// Synthesize (or retrieve the cached) First/Middle/Last variants for subpass `subpass_index`
    /// of `render_pass`.
    pub fn variants_for(
        &mut self,
        render_pass: Handle,
        subpass_index: usize,
        subpass_count: usize,
        descriptor: &SubpassDescriptor,
        attachments: &[AttachmentDescription],
        post_subpass_layouts: &[vk::ImageLayout],
    ) -> &RenderPassVariants {
        self.variant_cache.entry((render_pass, subpass_index)).or_insert_with(|| {
            renderpass_variants::synthesize(descriptor, attachments, subpass_index, subpass_count, post_subpass_layouts)
        })
    }

    /// Clone `original` against the cached `First` variant render pass, reusing a prior clone if
    /// one was already minted for this pipeline.
    pub fn reparented_pipeline(&mut self, original: Handle, first_variant_render_pass: Handle) -> ClonedPipeline {
        *self
            .pipeline_cache
            .entry(original)
            .or_insert_with(|| pipeline_reparent::reparent(original, first_variant_render_pass, mint_handle))
    }

    /// A cut point that falls strictly inside a subpass: end the current render pass, emit the
    /// insertion sentinel, then resume with the `Middle` variant of the same subpass.
    fn cut_in_subpass(&mut self, open: &OpenRenderPass, at: SubCmdIdx) -> Vec<SplicedCommand> {
        let variants = self.variants_for(
            open.handle,
            open.subpass_index,
            open.subpass_count,
            &open.descriptors[open.subpass_index],
            &open.attachments,
            &open.post_subpass_layouts,
        );
        let middle = (variants.descriptor.clone(), variants.middle.clone());
        vec![
            SplicedCommand::EndRenderPass,
            SplicedCommand::Insertion(at),
            SplicedCommand::BeginRenderPass {
                render_pass: open.handle,
                subpass: middle.0,
                attachments: middle.1,
            },
        ]
    }

    /// Replace a `vkCmdNextSubpass` at a cut point: end subpass `i` with its `Last` variant, then
    /// begin subpass `i+1` with its `First` variant.
    fn cut_across_subpass_boundary(&mut self, open: &OpenRenderPass) -> Vec<SplicedCommand> {
        let last = self.variants_for(
            open.handle,
            open.subpass_index,
            open.subpass_count,
            &open.descriptors[open.subpass_index],
            &open.attachments,
            &open.post_subpass_layouts,
        );
        let last = (last.descriptor.clone(), last.last.clone());

        let next_index = open.subpass_index + 1;
        let first = self.variants_for(
            open.handle,
            next_index,
            open.subpass_count,
            &open.descriptors[next_index],
            &open.attachments,
            &open.post_subpass_layouts,
        );
        let first = (first.descriptor.clone(), first.first.clone());

        vec![
            SplicedCommand::EndRenderPass,
            SplicedCommand::BeginRenderPass {
                render_pass: open.handle,
                subpass: last.0,
                attachments: last.1,
            },
            SplicedCommand::EndRenderPass,
            SplicedCommand::BeginRenderPass {
                render_pass: open.handle,
                subpass: first.0,
                attachments: first.1,
            },
        ]
    }

    /// Walk one command buffer's recorded commands in order, splicing in cut points. `kind_of`
    /// looks up a command's decoded shape; `secondary_commands` looks up a secondary buffer's own
    /// command list (recursed into for `vkCmdExecuteCommands`, with the parent's index extended by
    /// the secondary's position per [`SubCmdIdx::secondary`]).
    pub fn rewrite_command_buffer(
        &mut self,
        commands: &[(CommandId, SubCmdIdx)],
        kind_of: &impl Fn(CommandId) -> CommandKind,
        secondary_commands: &impl Fn(Handle) -> Vec<(CommandId, SubCmdIdx)>,
    ) -> Vec<SplicedCommand> {
        let mut out = Vec::new();
        let mut open: Option<OpenRenderPass> = None;

        for &(cmd, ref idx) in commands {
            match kind_of(cmd) {
                CommandKind::BeginRenderPass {
                    render_pass,
                    descriptors,
                    descriptions,
                    begin_label: _,
                    views,
                    full_image_data: _,
                    initial_backings: _,
                } => {
                    let count = descriptors.len();
                    open = Some(OpenRenderPass {
                        handle: render_pass,
                        subpass_index: 0,
                        subpass_count: count,
                        descriptors,
                        attachments: descriptions,
                        post_subpass_layouts: vec![vk::ImageLayout::GENERAL; views.len()],
                    });
                    out.push(SplicedCommand::Original(cmd));
                }
                CommandKind::NextSubpass => {
                    if let Some(rp) = open.as_mut() {
                        if self.is_cut_point(idx) {
                            out.extend(self.cut_across_subpass_boundary(rp));
                        } else {
                            out.push(SplicedCommand::Original(cmd));
                        }
                        rp.subpass_index += 1;
                    }
                }
                CommandKind::EndRenderPass => {
                    out.push(SplicedCommand::Original(cmd));
                    open = None;
                }
                CommandKind::ExecuteCommands { secondary_cbs } => {
                    for &sec_cb in &secondary_cbs {
                        let sec_cmds = secondary_commands(sec_cb);
                        out.extend(self.rewrite_command_buffer(&sec_cmds, kind_of, secondary_commands));
                    }
                }
                _ => {
                    out.push(SplicedCommand::Original(cmd));
                }
            }

            if self.is_cut_point(idx) {
                if let Some(rp) = &open {
                    out.extend(self.cut_in_subpass(rp, idx.clone()));
                } else {
                    out.push(SplicedCommand::Insertion(idx.clone()));
                }
            }
        }
        out
    }

    /// Rewrite a submission's command-buffer list: interleave a fresh insert buffer before every
    /// original command buffer that contains at least one cut point, and after the last one if the
    /// final command in the stream is itself a cut point.
    pub fn rewrite_submission(&mut self, cbs: &[Handle], cb_has_cut: impl Fn(Handle) -> bool) -> Vec<Handle> {
        let mut out = Vec::new();
        for &cb in cbs {
            if cb_has_cut(cb) {
                out.push(self.alloc_insert_buffer());
            }
            out.push(cb);
        }
        out
    }
}
