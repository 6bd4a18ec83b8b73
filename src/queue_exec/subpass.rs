//! Render-pass begin/next/end semantics: the part of the Queue-Execution Model that tracks
//! per-attachment layout/backing state across a subpass chain and emits behaviors for loads,
//! stores, and resolves.

use ash::vk;

use crate::dependency::{Behavior, SubCmdIdx, Variable};
use crate::resource_model::{BoundDataId, Handle, Label};

/// A plain, pointer-free stand-in for `VkAttachmentReference`.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentRef {
    pub attachment: u32,
    pub layout: vk::ImageLayout,
}

/// A plain, pointer-free stand-in for `VkSubpassDescription`'s attachment lists.
#[derive(Debug, Clone, Default)]
pub struct SubpassDescriptor {
    pub color_attachments: Vec<AttachmentRef>,
    pub resolve_attachments: Vec<Option<AttachmentRef>>,
    pub input_attachments: Vec<AttachmentRef>,
    pub depth_stencil_attachment: Option<AttachmentRef>,
}

/// A plain stand-in for `VkAttachmentDescription`'s load/store-op and layout-transition fields.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentDescription {
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub stencil_load_op: vk::AttachmentLoadOp,
    pub stencil_store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
}

/// Live per-framebuffer-attachment state: the pair `(layout label, backing data)` plus the
/// originating attachment description and the `fullImageData` heuristic result.
#[derive(Debug, Clone)]
pub struct AttachmentState {
    pub view: Handle,
    pub layout_label: Label,
    pub backing: BoundDataId,
    pub description: AttachmentDescription,
    pub full_image_data: bool,
}

/// Per-subpass bookkeeping: which framebuffer attachments load/store in this subpass, which are
/// color/resolve/input/depth-stencil, and the accumulator of descriptor writes made during draws
/// in this subpass (consumed at subpass end).
#[derive(Debug, Clone, Default)]
pub struct SubpassInfo {
    pub load_attachments: Vec<usize>,
    pub store_attachments: Vec<usize>,
    pub descriptor: SubpassDescriptor,
    pub modified_descriptor_data: Vec<Variable>,
}

/// Walk subpass descriptions in ascending order and assign each framebuffer attachment to the
/// `load_attachments` list of the first subpass referencing it, and the `store_attachments` list
/// of its last.
pub fn assign_load_store_lists(descriptors: &[SubpassDescriptor], attachment_count: usize) -> Vec<SubpassInfo> {
    let mut subpasses: Vec<SubpassInfo> = descriptors
        .iter()
        .map(|d| SubpassInfo {
            descriptor: d.clone(),
            ..Default::default()
        })
        .collect();

    let mut first_ref = vec![None; attachment_count];
    let mut last_ref = vec![None; attachment_count];

    for (i, d) in descriptors.iter().enumerate() {
        let refs = referenced_attachments(d);
        for a in refs {
            if first_ref[a].is_none() {
                first_ref[a] = Some(i);
            }
            last_ref[a] = Some(i);
        }
    }

    for a in 0..attachment_count {
        if let Some(i) = first_ref[a] {
            subpasses[i].load_attachments.push(a);
        }
        if let Some(i) = last_ref[a] {
            subpasses[i].store_attachments.push(a);
        }
    }

    subpasses
}

fn referenced_attachments(d: &SubpassDescriptor) -> Vec<usize> {
    let mut out = Vec::new();
    out.extend(d.color_attachments.iter().map(|r| r.attachment as usize));
    out.extend(d.resolve_attachments.iter().flatten().map(|r| r.attachment as usize));
    out.extend(d.input_attachments.iter().map(|r| r.attachment as usize));
    out.extend(d.depth_stencil_attachment.iter().map(|r| r.attachment as usize));
    out
}

/// Begin a render pass: determine `fullImageData` for every framebuffer attachment and record its
/// initial `(layout label, backing)` pair. Does not itself emit behaviors — loads are handled by
/// [`start_subpass`].
pub fn begin_render_pass(
    views: &[Handle],
    full_image_data: &[bool],
    descriptions: &[AttachmentDescription],
    initial_backing: impl Fn(usize) -> BoundDataId,
    mint_label: &mut impl FnMut() -> Label,
) -> Vec<AttachmentState> {
    views
        .iter()
        .enumerate()
        .map(|(i, &view)| AttachmentState {
            view,
            layout_label: mint_label(),
            backing: initial_backing(i),
            description: descriptions[i],
            full_image_data: full_image_data[i],
        })
        .collect()
}

/// Start a subpass: emit behaviors for every load-listed attachment (layout always modified;
/// backing read/written/modified per the load-op and `fullImageData` rules).
pub fn start_subpass(subpass: &SubpassInfo, attachments: &mut [AttachmentState], source: SubCmdIdx) -> Vec<Behavior> {
    let mut behaviors = Vec::new();
    let ds_index = subpass.descriptor.depth_stencil_attachment.map(|r| r.attachment as usize);

    for &idx in &subpass.load_attachments {
        let att = &attachments[idx];
        let is_ds = ds_index == Some(idx);

        let mut b = Behavior::new(source.clone()).modifying([Variable::Label(att.layout_label)]);

        if is_ds {
            let both_non_load = att.description.load_op != vk::AttachmentLoadOp::LOAD
                && att.description.stencil_load_op != vk::AttachmentLoadOp::LOAD;
            let both_load = att.description.load_op == vk::AttachmentLoadOp::LOAD
                && att.description.stencil_load_op == vk::AttachmentLoadOp::LOAD;
            b = if both_non_load {
                if att.full_image_data {
                    b.writing([backing_var(att)])
                } else {
                    b.modifying([backing_var(att)])
                }
            } else if both_load {
                b.reading([backing_var(att)])
            } else {
                b.modifying([backing_var(att)])
            };
        } else {
            b = if att.description.load_op == vk::AttachmentLoadOp::LOAD {
                b.reading([backing_var(att)])
            } else if att.full_image_data {
                b.writing([backing_var(att)])
            } else {
                b.modifying([backing_var(att)])
            };
        }
        behaviors.push(b);
    }
    behaviors
}

/// End a subpass: emit two behaviors per store-listed attachment (layout modify, backing
/// write/modify per store-op), plus a read of the paired color attachment for every resolve
/// attachment, plus one behavior per accumulated modified-descriptor entry. Every emitted behavior
/// also reads the current subpass index.
pub fn end_subpass(
    subpass: &SubpassInfo,
    attachments: &[AttachmentState],
    subpass_index: Variable,
    source: SubCmdIdx,
) -> Vec<Behavior> {
    let mut behaviors = Vec::new();

    for &idx in &subpass.store_attachments {
        let att = &attachments[idx];
        behaviors.push(
            Behavior::new(source.clone())
                .reading([subpass_index])
                .modifying([Variable::Label(att.layout_label)]),
        );

        let store_behavior = if att.description.store_op == vk::AttachmentStoreOp::DONT_CARE {
            if att.full_image_data {
                Behavior::new(source.clone()).reading([subpass_index]).writing([backing_var(att)])
            } else {
                Behavior::new(source.clone()).reading([subpass_index]).modifying([backing_var(att)])
            }
        } else {
            Behavior::new(source.clone()).reading([subpass_index]).modifying([backing_var(att)])
        };
        behaviors.push(store_behavior);
    }

    for _resolve in subpass.descriptor.resolve_attachments.iter().flatten() {
        let color_idx = subpass
            .descriptor
            .color_attachments
            .first()
            .map(|r| r.attachment as usize);
        if let Some(color_idx) = color_idx {
            let color_att = &attachments[color_idx];
            behaviors.push(Behavior::new(source.clone()).reading([subpass_index, backing_var(color_att)]));
        }
    }

    for &modified in &subpass.modified_descriptor_data {
        behaviors.push(Behavior::new(source.clone()).reading([subpass_index]).modifying([modified]));
    }

    behaviors
}

fn backing_var(att: &AttachmentState) -> Variable {
    Variable::BoundData(att.backing)
}
