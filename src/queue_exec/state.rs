//! Per-command-buffer execution state tracked while rolling out a queue's pending commands.

use std::collections::HashMap;

use crate::resource_model::{BoundDataId, BoundDescriptorSetId, Label};

/// Bound vertex/index buffers, descriptor sets, and pipeline/dynamic-state labels live per
/// command-buffer level (primary or secondary); a `vkCmdExecuteCommands` starts the secondary
/// level fresh rather than inheriting the primary's bindings.
#[derive(Debug, Clone, Default)]
pub struct CommandBufferExecutionState {
    pub vertex_buffers: HashMap<u32, BoundDataId>,
    pub index_buffer: Option<BoundDataId>,
    pub index_type: Option<ash::vk::IndexType>,
    pub descriptor_sets: HashMap<u32, BoundDescriptorSetId>,
    pub pipeline: Option<Label>,
    pub dynamic_state: Option<Label>,
}

impl CommandBufferExecutionState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Which command-buffer level a sub-command index addresses: four path components means a
/// primary-buffer command, six (the trailing `(secondary_cb, secondary_cmd)`) means secondary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CbLevel {
    Primary,
    Secondary,
}

impl CbLevel {
    pub fn of(idx: &crate::dependency::SubCmdIdx) -> Self {
        if idx.secondary.is_some() {
            CbLevel::Secondary
        } else {
            CbLevel::Primary
        }
    }
}
