//! The `ExternalMemoryData` replay hijacker: reconstructs buffer/image contents that were
//! persisted outside the trace by staging them back in at submission time. Shares the lazy
//! pool/buffer creation and submission-rewrite machinery with the rest of the Command Splitter.

use std::collections::{BTreeSet, HashMap};

use ash::vk;

use crate::resource_model::Handle;

use super::{mint_handle, CommandSplitter};

#[derive(Debug, Clone, Copy)]
pub struct BufferPatch {
    pub buffer: Handle,
    pub buffer_offset: u64,
    pub data_offset: u64,
    pub size: u64,
    pub submit_index: u32,
    pub cb_index: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct ImagePatch {
    pub image: Handle,
    pub barrier_range: vk::ImageSubresourceRange,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    pub submit_index: u32,
    pub cb_index: u32,
}

/// A persisted `{ data_id, size, buffers, images }` record describing externalized command data
/// that must be staged back in before its owning submit executes.
#[derive(Debug, Clone)]
pub struct ExternalMemoryRecord {
    pub data_id: u64,
    pub size: u64,
    pub buffers: Vec<BufferPatch>,
    pub images: Vec<ImagePatch>,
}

/// The result of rewriting a set of submissions to stage `record` back in.
#[derive(Debug, Clone)]
pub struct ExternalDataRewrite {
    pub staging_buffer: Handle,
    pub staging_memory_size: u64,
    pub global_barrier_cb: Handle,
    pub per_cb_staging: HashMap<(u32, u32), Handle>,
    pub submissions: Vec<Vec<Handle>>,
}

/// Allocate a `size`-byte staging buffer (backed by `2 * size` of memory, per the over-allocation
/// rule staging resources share with image priming), then patch `submissions` so the global
/// barrier command buffer runs first and a per-(submission, cb) staging command buffer is
/// interleaved before every command buffer the record touches.
pub fn rewrite_submit_for_external_data(
    splitter: &mut CommandSplitter,
    record: &ExternalMemoryRecord,
    submissions: &[Vec<Handle>],
) -> ExternalDataRewrite {
    let staging_buffer = mint_handle();
    let staging_memory_size = record.size * 2;

    splitter.ensure_transient_pool();
    let global_barrier_cb = splitter.alloc_insert_buffer();

    let touched: BTreeSet<(u32, u32)> = record
        .buffers
        .iter()
        .map(|b| (b.submit_index, b.cb_index))
        .chain(record.images.iter().map(|i| (i.submit_index, i.cb_index)))
        .collect();

    let per_cb_staging: HashMap<(u32, u32), Handle> = touched.into_iter().map(|key| (key, splitter.alloc_insert_buffer())).collect();

    let rewritten_submissions = submissions
        .iter()
        .enumerate()
        .map(|(submission_index, cbs)| {
            let mut out = vec![global_barrier_cb];
            for (cb_index, &cb) in cbs.iter().enumerate() {
                if let Some(&staging) = per_cb_staging.get(&(submission_index as u32, cb_index as u32)) {
                    out.push(staging);
                }
                out.push(cb);
            }
            out
        })
        .collect();

    ExternalDataRewrite {
        staging_buffer,
        staging_memory_size,
        global_barrier_cb,
        per_cb_staging,
        submissions: rewritten_submissions,
    }
}
