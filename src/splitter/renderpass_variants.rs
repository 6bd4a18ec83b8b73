//! Render-pass triple-patching: for a given subpass of an original render pass, synthesize the
//! First/Middle/Last single-subpass variants a cut point can resume into or out of.

use ash::vk;

use crate::queue_exec::subpass::{AttachmentDescription, SubpassDescriptor};

/// Which position in a render-pass cut chain a synthesized single-subpass render pass plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Resumed into from outside the render pass; handed off to a `Middle` or `Last` variant.
    First,
    /// Resumed into and handed off again; used when a cut falls inside the same subpass more
    /// than once.
    Middle,
    /// The terminal variant for this subpass before the real render pass moves on (or ends).
    Last,
}

/// Strip resolve attachments and keep exactly the one subpass this variant patches; every
/// synthesized render pass clears subpass dependencies (there is only ever one subpass).
fn patch_subpass_descriptor(original: &SubpassDescriptor) -> SubpassDescriptor {
    SubpassDescriptor {
        color_attachments: original.color_attachments.clone(),
        resolve_attachments: Vec::new(),
        input_attachments: original.input_attachments.clone(),
        depth_stencil_attachment: original.depth_stencil_attachment,
    }
}

/// Patch one attachment description for `variant` of subpass `subpass_index` out of
/// `subpass_count` total, given the layout the attachment must end up in to hand off to whatever
/// comes next (`post_subpass_layout`).
fn patch_attachment(
    original: AttachmentDescription,
    variant: Variant,
    subpass_index: usize,
    subpass_count: usize,
    post_subpass_layout: vk::ImageLayout,
) -> AttachmentDescription {
    let is_first_subpass = subpass_index == 0;
    let is_last_subpass = subpass_index + 1 == subpass_count;

    let forced_handoff = AttachmentDescription {
        load_op: vk::AttachmentLoadOp::LOAD,
        stencil_load_op: vk::AttachmentLoadOp::LOAD,
        store_op: vk::AttachmentStoreOp::STORE,
        stencil_store_op: vk::AttachmentStoreOp::STORE,
        final_layout: post_subpass_layout,
        ..original
    };

    match variant {
        Variant::First => {
            if is_first_subpass {
                AttachmentDescription {
                    store_op: vk::AttachmentStoreOp::STORE,
                    stencil_store_op: vk::AttachmentStoreOp::STORE,
                    final_layout: post_subpass_layout,
                    ..original
                }
            } else {
                forced_handoff
            }
        }
        Variant::Middle => forced_handoff,
        Variant::Last => {
            if is_last_subpass {
                forced_handoff
            } else {
                AttachmentDescription {
                    load_op: vk::AttachmentLoadOp::LOAD,
                    stencil_load_op: vk::AttachmentLoadOp::LOAD,
                    ..original
                }
            }
        }
    }
}

/// The three synthesized single-subpass render-pass variants for one original subpass, cached so
/// repeated cuts in the same subpass reuse the same synthesized description.
#[derive(Debug, Clone)]
pub struct RenderPassVariants {
    pub descriptor: SubpassDescriptor,
    pub first: Vec<AttachmentDescription>,
    pub middle: Vec<AttachmentDescription>,
    pub last: Vec<AttachmentDescription>,
}

/// Synthesize all three variants for `subpass_index` of an original `subpass_count`-subpass
/// render pass, given its attachment descriptions and the layout each attachment must hand off to.
pub fn synthesize(
    original: &SubpassDescriptor,
    attachments: &[AttachmentDescription],
    subpass_index: usize,
    subpass_count: usize,
    post_subpass_layouts: &[vk::ImageLayout],
) -> RenderPassVariants {
    let patch = |variant: Variant| {
        attachments
            .iter()
            .zip(post_subpass_layouts.iter())
            .map(|(&att, &layout)| patch_attachment(att, variant, subpass_index, subpass_count, layout))
            .collect::<Vec<_>>()
    };

    RenderPassVariants {
        descriptor: patch_subpass_descriptor(original),
        first: patch(Variant::First),
        middle: patch(Variant::Middle),
        last: patch(Variant::Last),
    }
}
