//! Pipeline re-parenting: a graphics pipeline bound inside a multi-subpass render pass must be
//! cloned against the `First` variant (subpass 0) before it can be used in a synthesized
//! single-subpass render pass.

use crate::resource_model::Handle;

/// A pipeline cloned to reference a synthesized render pass, cached by its originating pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClonedPipeline {
    pub handle: Handle,
    pub original: Handle,
    pub render_pass: Handle,
    pub subpass: u32,
}

/// Clone `original` against `first_variant_render_pass`, subpass 0. `mint` allocates the fresh
/// handle for the clone (the splitter's synthetic-handle allocator).
pub fn reparent(original: Handle, first_variant_render_pass: Handle, mint: impl FnOnce() -> Handle) -> ClonedPipeline {
    ClonedPipeline {
        handle: mint(),
        original,
        render_pass: first_variant_render_pass,
        subpass: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reparented_pipeline_targets_subpass_zero_of_the_first_variant() {
        let cloned = reparent(Handle::from(1), Handle::from(99), || Handle::from(1000));
        assert_eq!(cloned.render_pass, Handle::from(99));
        assert_eq!(cloned.subpass, 0);
        assert_eq!(cloned.original, Handle::from(1));
    }
}
