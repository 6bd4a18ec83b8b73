//! Strategy selection: given an image's usage flags, format, tiling and initial layout, pick the
//! first applicable way to reconstruct its contents.

use ash::vk;

use crate::error::Error;
use crate::state::ImageInfo;

use super::unpack::format_block_bytes;

#[derive(Debug, Clone)]
pub struct HostCopyPrimeable {
    pub aspect: vk::ImageAspectFlags,
}

#[derive(Debug, Clone)]
pub struct RenderPrimeable {
    /// One staging image per 32-bit word of the destination format's texel block.
    pub staging_count: u32,
    pub staging_format: vk::Format,
}

#[derive(Debug, Clone)]
pub struct StorePrimeable {
    pub staging_format: vk::Format,
}

#[derive(Debug, Clone)]
pub struct PreinitPrimeable {
    pub linear_offset: u64,
}

/// The strategy selected to reconstruct an image's contents, plus the data the construction step
/// that strategy needs.
#[derive(Debug, Clone)]
pub enum Primeable {
    HostCopy(HostCopyPrimeable),
    Render(RenderPrimeable),
    Store(StorePrimeable),
    Preinitialization(PreinitPrimeable),
}

fn depth_stencil_aspects() -> vk::ImageAspectFlags {
    vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
}

/// Select the first applicable priming strategy for `image`. `from_host_data` distinguishes a
/// host-sourced rebuild (bytes come from the capture) from a device-sourced one (bytes come from
/// a format-compatible staging image already on the device).
pub fn select(image: &ImageInfo, from_host_data: bool) -> Result<Primeable, Error> {
    let usage = image.image_usage;

    if usage.contains(vk::ImageUsageFlags::TRANSFER_DST) && !image.aspect.intersects(depth_stencil_aspects()) {
        return Ok(Primeable::HostCopy(HostCopyPrimeable { aspect: image.aspect }));
    }

    if usage.intersects(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT) {
        let is_depth = usage.contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT);
        let staging_format = if is_depth { vk::Format::R32_UINT } else { vk::Format::R32G32B32A32_UINT };
        let block_bytes = format_block_bytes(image.format).unwrap_or(16);
        let staging_count = (block_bytes as f64 / 16.0).ceil().max(1.0) as u32;
        let _ = from_host_data;
        return Ok(Primeable::Render(RenderPrimeable { staging_count, staging_format }));
    }

    if usage.contains(vk::ImageUsageFlags::STORAGE) {
        let staging_format = if from_host_data {
            vk::Format::R32G32B32A32_UINT
        } else {
            image.format
        };
        return Ok(Primeable::Store(StorePrimeable { staging_format }));
    }

    if image.tiling == vk::ImageTiling::LINEAR && image.initial_layout == vk::ImageLayout::PREINITIALIZED {
        return Ok(Primeable::Preinitialization(PreinitPrimeable { linear_offset: 0 }));
    }

    Err(Error::NotImplemented)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(usage: vk::ImageUsageFlags, aspect: vk::ImageAspectFlags, format: vk::Format, tiling: vk::ImageTiling, initial_layout: vk::ImageLayout) -> ImageInfo {
        ImageInfo {
            format,
            image_usage: usage,
            extent: vk::Extent3D::default(),
            mip_levels: 1,
            array_layers: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            tiling,
            aspect,
            memory_requirements: vk::MemoryRequirements::default(),
            initial_layout,
            sparse_resident: false,
            last_bound_queues: vec![],
        }
    }

    #[test]
    fn transfer_dst_with_color_aspect_selects_host_copy() {
        let img = image(
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            vk::ImageAspectFlags::COLOR,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageTiling::OPTIMAL,
            vk::ImageLayout::UNDEFINED,
        );
        assert!(matches!(select(&img, true).unwrap(), Primeable::HostCopy(_)));
    }

    #[test]
    fn color_attachment_only_selects_render_with_one_staging_image_per_sixteen_bytes() {
        let img = image(
            vk::ImageUsageFlags::COLOR_ATTACHMENT,
            vk::ImageAspectFlags::COLOR,
            vk::Format::R32G32B32A32_SFLOAT,
            vk::ImageTiling::OPTIMAL,
            vk::ImageLayout::UNDEFINED,
        );
        match select(&img, true).unwrap() {
            Primeable::Render(r) => assert_eq!(r.staging_count, 1),
            _ => panic!("expected Render"),
        }
    }

    #[test]
    fn storage_only_device_sourced_selects_store_with_same_format_staging() {
        let img = image(
            vk::ImageUsageFlags::STORAGE,
            vk::ImageAspectFlags::COLOR,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageTiling::OPTIMAL,
            vk::ImageLayout::UNDEFINED,
        );
        match select(&img, false).unwrap() {
            Primeable::Store(s) => assert_eq!(s.staging_format, vk::Format::R8G8B8A8_UNORM),
            _ => panic!("expected Store"),
        }
    }

    #[test]
    fn linear_preinitialized_with_no_other_usage_selects_preinitialization() {
        let img = image(
            vk::ImageUsageFlags::empty(),
            vk::ImageAspectFlags::COLOR,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageTiling::LINEAR,
            vk::ImageLayout::PREINITIALIZED,
        );
        assert!(matches!(select(&img, true).unwrap(), Primeable::Preinitialization(_)));
    }

    #[test]
    fn no_applicable_strategy_is_not_implemented() {
        let img = image(
            vk::ImageUsageFlags::empty(),
            vk::ImageAspectFlags::COLOR,
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageTiling::OPTIMAL,
            vk::ImageLayout::UNDEFINED,
        );
        assert!(matches!(select(&img, true), Err(Error::NotImplemented)));
    }
}
