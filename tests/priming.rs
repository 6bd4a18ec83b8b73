//! Strategy selection and queue selection exercised together against a populated `GlobalState`,
//! as opposed to the strategy-only unit tests colocated with `priming::strategy`.

mod support;

use footgraph::prelude::*;

use support::state_with_one_image;

#[test]
fn color_attachment_image_primes_via_render_on_its_graphics_queue() {
    let (state, image, queue) = state_with_one_image(vk::ImageUsageFlags::COLOR_ATTACHMENT, vk::Format::R8G8B8A8_UNORM);
    let mut engine = PrimingEngine::new();
    let image_info = state.images.get(image).unwrap();

    let (strategy, selected_queue, kit) = engine.prime(image_info, true, None, &state).unwrap();
    assert!(matches!(strategy, Primeable::Render(_)));
    assert_eq!(selected_queue, queue);
    match kit {
        PrimeKit::Render { staging_images, .. } => assert!(!staging_images.is_empty()),
        other => panic!("expected Render kit, got {other:?}"),
    }
}

#[test]
fn storage_image_primes_via_store_and_deferred_staging_drains_cleanly() {
    let (state, image, _queue) = state_with_one_image(vk::ImageUsageFlags::STORAGE, vk::Format::R8G8B8A8_UNORM);
    let mut engine = PrimingEngine::new();
    let image_info = state.images.get(image).unwrap();

    let (strategy, _, _kit) = engine.prime(image_info, false, None, &state).unwrap();
    assert!(matches!(strategy, Primeable::Store(_)));

    engine.deferred.defer(footgraph::priming::staging::StagingResource {
        handle: Handle::from(99),
        size: 256,
        location: gpu_allocator::MemoryLocation::GpuOnly,
    });
    let drained = engine.deferred.drain();
    // One resource deferred by the store strategy's own kit construction, plus the one deferred
    // manually above.
    assert_eq!(drained.len(), 2);
    assert!(engine.deferred.is_empty());
}

#[test]
fn transfer_dst_image_primes_via_host_copy() {
    let (state, image, _queue) = state_with_one_image(vk::ImageUsageFlags::TRANSFER_DST, vk::Format::R8G8B8A8_UNORM);
    let mut engine = PrimingEngine::new();
    let image_info = state.images.get(image).unwrap();

    let bytes = [0u8; 4];
    let (strategy, _, kit) = engine.prime(image_info, true, Some(&bytes), &state).unwrap();
    assert!(matches!(strategy, Primeable::HostCopy(_)));
    assert!(matches!(kit, PrimeKit::HostCopy { .. }));
}
