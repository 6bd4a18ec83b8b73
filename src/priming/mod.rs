//! The Image Priming Engine: reconstructs an image's contents during state rebuild by selecting
//! one of four strategies, then driving queue selection and staging-resource lifetime for it.
//!
//! Invoked during state rebuild, never during trace replay — unlike the rest of this crate, an
//! error here is a genuine user-facing failure rather than something to log and keep going past.

pub mod staging;
pub mod strategy;
pub mod unpack;

use ash::vk;

pub use strategy::{HostCopyPrimeable, Primeable, PreinitPrimeable, RenderPrimeable, StorePrimeable};

use crate::error::Error;
use crate::resource_model::Handle;
use crate::state::{GlobalState, ImageInfo};

use staging::{ComputeDispatch, DestroyDeferralList, HostCopyRecipe, PreinitCopy, StagingResource};
use unpack::format_block_bytes;

/// Total texel count of `image` at mip 0, across every array layer.
fn image_texel_count(image: &ImageInfo) -> u64 {
    image.extent.width as u64 * image.extent.height as u64 * image.extent.depth as u64 * image.array_layers as u64
}

/// The concrete resources and parameters built for one priming session, specific to whichever
/// [`Primeable`] strategy selected it.
#[derive(Debug, Clone)]
pub enum PrimeKit {
    HostCopy {
        recipe: HostCopyRecipe,
    },
    Render {
        staging_images: Vec<StagingResource>,
        unpacked_words: Vec<u32>,
    },
    Store {
        staging: StagingResource,
        dispatch: ComputeDispatch,
    },
    Preinitialization {
        copy: PreinitCopy,
    },
}

fn required_capabilities(strategy: &Primeable) -> vk::QueueFlags {
    match strategy {
        Primeable::HostCopy(_) | Primeable::Preinitialization(_) => {
            vk::QueueFlags::TRANSFER | vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE
        }
        Primeable::Render(_) => vk::QueueFlags::GRAPHICS,
        Primeable::Store(_) => vk::QueueFlags::COMPUTE,
    }
}

/// Pick a queue from `last_bound_queues` whose family supports `strategy`'s required capability
/// set. [`Error::QueueNotInNewState`] if a previously-bound queue no longer exists at all;
/// [`Error::NullQueue`] if every one that does exist lacks the capability.
fn select_queue(strategy: &Primeable, last_bound_queues: &[Handle], state: &GlobalState) -> Result<Handle, Error> {
    let required = required_capabilities(strategy);
    let mut saw_capable_absent_only = true;
    for &queue in last_bound_queues {
        match state.queues.get(queue) {
            Some(info) if info.queue_flags.intersects(required) => return Ok(queue),
            Some(_) => saw_capable_absent_only = false,
            None => return Err(Error::QueueNotInNewState),
        }
    }
    let _ = saw_capable_absent_only;
    Err(Error::NullQueue)
}

/// Drives strategy selection, queue selection, and staging-resource destroy-deferral for one
/// priming session. One engine is typically shared across the whole state-rebuild pass so staging
/// resources accumulate into a single deferral list drained once at the end.
#[derive(Debug)]
pub struct PrimingEngine {
    pub deferred: DestroyDeferralList,
    next_staging_id: u64,
}

impl Default for PrimingEngine {
    fn default() -> Self {
        Self {
            deferred: DestroyDeferralList::default(),
            next_staging_id: 1,
        }
    }
}

impl PrimingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint_staging_handle(&mut self) -> Handle {
        let value = self.next_staging_id;
        self.next_staging_id += 1;
        Handle::from(value)
    }

    /// Select a strategy for `image`, a queue capable of executing it, and build the concrete kit
    /// of resources that strategy needs. `host_data` carries the captured bytes for strategies
    /// that reconstruct from host data; strategies that reconstruct from an already-device-side
    /// staging image ignore it.
    pub fn prime(
        &mut self,
        image: &ImageInfo,
        from_host_data: bool,
        host_data: Option<&[u8]>,
        state: &GlobalState,
    ) -> Result<(Primeable, Handle, PrimeKit), Error> {
        let strategy = strategy::select(image, from_host_data)?;
        let queue = select_queue(&strategy, &image.last_bound_queues, state)?;
        let kit = self.build_kit(&strategy, image, host_data)?;
        Ok((strategy, queue, kit))
    }

    fn build_kit(&mut self, strategy: &Primeable, image: &ImageInfo, host_data: Option<&[u8]>) -> Result<PrimeKit, Error> {
        match strategy {
            Primeable::HostCopy(host_copy) => self.build_host_copy(host_copy, image, host_data),
            Primeable::Render(render) => self.build_render(render, image, host_data),
            Primeable::Store(store) => self.build_store(store, image),
            Primeable::Preinitialization(preinit) => self.build_preinit(preinit, host_data),
        }
    }

    fn build_host_copy(&mut self, strategy: &HostCopyPrimeable, image: &ImageInfo, host_data: Option<&[u8]>) -> Result<PrimeKit, Error> {
        let data = host_data.ok_or(Error::MissingHostData)?.to_vec();
        let recipe = HostCopyRecipe {
            subresource: vk::ImageSubresourceLayers {
                aspect_mask: strategy.aspect,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: image.array_layers,
            },
            buffer_offset: 0,
            data,
        };
        Ok(PrimeKit::HostCopy { recipe })
    }

    fn build_render(&mut self, strategy: &RenderPrimeable, image: &ImageInfo, host_data: Option<&[u8]>) -> Result<PrimeKit, Error> {
        let block_bytes = format_block_bytes(strategy.staging_format).unwrap_or(4) as u64;
        let texel_count = image_texel_count(image);
        let location = staging::choose_memory_location(&[MemoryLocation::GpuOnly]);
        let staging_images = (0..strategy.staging_count)
            .map(|_| StagingResource {
                handle: self.mint_staging_handle(),
                size: staging::staging_allocation_size(texel_count * block_bytes),
                location,
            })
            .collect();
        let unpacked_words = match host_data {
            Some(data) => unpack::unpack_to_staging_words(image.format, data)?,
            None => Vec::new(),
        };
        Ok(PrimeKit::Render { staging_images, unpacked_words })
    }

    fn build_store(&mut self, strategy: &StorePrimeable, image: &ImageInfo) -> Result<PrimeKit, Error> {
        let block_bytes = format_block_bytes(strategy.staging_format).unwrap_or(4) as u64;
        let size = staging::staging_allocation_size(image_texel_count(image) * block_bytes);
        let location = staging::choose_memory_location(&[MemoryLocation::GpuOnly]);
        let staging = StagingResource {
            handle: self.mint_staging_handle(),
            size,
            location,
        };
        self.deferred.defer(staging);
        let dispatch = ComputeDispatch::covering(image.extent);
        Ok(PrimeKit::Store { staging, dispatch })
    }

    fn build_preinit(&mut self, strategy: &PreinitPrimeable, host_data: Option<&[u8]>) -> Result<PrimeKit, Error> {
        let data = host_data.ok_or(Error::MissingHostData)?.to_vec();
        let copy = PreinitCopy {
            linear_offset: strategy.linear_offset,
            data,
        };
        Ok(PrimeKit::Preinitialization { copy })
    }
}
