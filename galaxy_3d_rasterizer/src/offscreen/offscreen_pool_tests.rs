/// Tests for OffscreenPool

use super::*;
use std::sync::{Arc, Mutex};
use crate::graphics_device::{FramebufferStatus, DeviceCapabilities};
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockDeviceState};
use crate::external::mock_external::MockCanvas;
use crate::offscreen::OffscreenMode;

fn manager() -> (TargetManager, Arc<Mutex<MockDeviceState>>) {
    let device = MockGraphicsDevice::new();
    let state = device.state.clone();
    (TargetManager::new(Box::new(device)), state)
}

// ============================================================================
// Tests: Slots
// ============================================================================

#[test]
fn test_slot_indices_are_distinct() {
    for (i, slot) in OffscreenSlot::ALL.iter().enumerate() {
        assert_eq!(slot.index(), i);
    }
}

#[test]
fn test_only_eye_slots_support_samples() {
    let eligible: Vec<OffscreenSlot> = OffscreenSlot::ALL
        .iter()
        .copied()
        .filter(|s| s.supports_samples())
        .collect();
    assert_eq!(eligible, vec![OffscreenSlot::LeftEye, OffscreenSlot::RightEye]);
}

#[test]
fn test_next_filter() {
    assert_eq!(OffscreenSlot::FilterA.next_filter(), OffscreenSlot::FilterB);
    assert_eq!(OffscreenSlot::FilterB.next_filter(), OffscreenSlot::FilterA);
    assert_eq!(OffscreenSlot::LeftEye.next_filter(), OffscreenSlot::FilterA);
}

#[test]
fn test_next_render() {
    assert_eq!(OffscreenSlot::LeftEye.next_render(), OffscreenSlot::LeftEyeResolve);
    assert_eq!(OffscreenSlot::LeftEyeResolve.next_render(), OffscreenSlot::LeftEye);
    assert_eq!(OffscreenSlot::RightEye.next_render(), OffscreenSlot::RightEyeResolve);
    assert_eq!(OffscreenSlot::RightEyeResolve.next_render(), OffscreenSlot::RightEye);
}

// ============================================================================
// Tests: Update
// ============================================================================

#[test]
fn test_update_same_size_is_noop() {
    let (mut tm, _state) = manager();
    let mut pool = OffscreenPool::new();

    assert!(pool.update(&mut tm, 64, 32, 0, HdrPrecision::None));
    let first = pool.get(&mut tm, OffscreenSlot::LeftEye).unwrap().target();

    // Same size, other samples/precision: nothing changes
    assert!(!pool.update(&mut tm, 64, 32, 4, HdrPrecision::FullFloat));
    assert_eq!(pool.samples(), 0);
    assert_eq!(pool.precision(), HdrPrecision::None);
    let second = pool.get(&mut tm, OffscreenSlot::LeftEye).unwrap().target();
    assert_eq!(first, second);
}

#[test]
fn test_update_resize_destroys_slots() {
    let (mut tm, state) = manager();
    let mut pool = OffscreenPool::new();
    pool.update(&mut tm, 64, 32, 0, HdrPrecision::None);
    pool.get(&mut tm, OffscreenSlot::LeftEye).unwrap();
    pool.get(&mut tm, OffscreenSlot::FilterA).unwrap();
    assert_eq!(pool.populated_count(), 2);

    assert!(pool.update(&mut tm, 128, 64, 0, HdrPrecision::HalfFloat));
    assert_eq!(pool.populated_count(), 0);
    assert_eq!(state.lock().unwrap().live_object_count(), 0);

    let surface = pool.get(&mut tm, OffscreenSlot::FilterA).unwrap();
    assert_eq!((surface.width(), surface.height()), (128, 64));
    let color = surface.color();
    assert_eq!(tm.attachable(color).unwrap().precision(), HdrPrecision::HalfFloat);
}

#[test]
fn test_update_from_canvas() {
    let (mut tm, _state) = manager();
    let mut pool = OffscreenPool::new();
    let canvas = MockCanvas::new(320, 200).with_samples(2);

    assert!(pool.update_from_canvas(&mut tm, &canvas));
    assert_eq!((pool.width(), pool.height(), pool.samples()), (320, 200, 2));
    assert!(!pool.update_from_canvas(&mut tm, &canvas));
}

// ============================================================================
// Tests: Get
// ============================================================================

#[test]
fn test_get_creates_lazily_once() {
    let (mut tm, state) = manager();
    let mut pool = OffscreenPool::new();
    pool.update(&mut tm, 16, 16, 0, HdrPrecision::None);
    assert!(pool.surface(OffscreenSlot::LeftEye).is_none());

    pool.get(&mut tm, OffscreenSlot::LeftEye).unwrap();
    pool.get(&mut tm, OffscreenSlot::LeftEye).unwrap();
    assert_eq!(state.lock().unwrap().count_commands("create_framebuffer"), 1);
    assert!(pool.surface(OffscreenSlot::LeftEye).is_some());
}

#[test]
fn test_eye_slot_uses_renderbuffers_when_multisampled() {
    let (mut tm, _state) = manager();
    let mut pool = OffscreenPool::new();
    pool.update(&mut tm, 16, 16, 4, HdrPrecision::None);

    let surface = pool.get(&mut tm, OffscreenSlot::LeftEye).unwrap();
    assert_eq!(surface.samples(), 4);
    assert_eq!(surface.color_texture(), None);
}

#[test]
fn test_eye_slot_without_device_multisample_uses_textures() {
    for capabilities in [
        DeviceCapabilities { framebuffer_multisample: false, ..Default::default() },
        DeviceCapabilities { framebuffer_blit: false, ..Default::default() },
        DeviceCapabilities { max_samples: 0, ..Default::default() },
    ] {
        let mock = MockGraphicsDevice::with_capabilities(capabilities);
        let state = mock.state.clone();
        let mut tm = TargetManager::new(Box::new(mock));
        let mut pool = OffscreenPool::new();
        pool.update(&mut tm, 16, 16, 4, HdrPrecision::None);

        let surface = pool.get(&mut tm, OffscreenSlot::LeftEye).unwrap();
        assert_eq!(surface.samples(), 0, "{:?}", capabilities);
        assert!(surface.color_texture().is_some(), "{:?}", capabilities);
        assert!(surface.depth_texture().is_some(), "{:?}", capabilities);
        assert_eq!(pool.samples(), 0);
        assert_eq!(state.lock().unwrap().count_commands("create_framebuffer"), 1);
    }
}

#[test]
fn test_non_eye_slots_are_single_sample_textures() {
    let (mut tm, _state) = manager();
    let mut pool = OffscreenPool::new();
    pool.update(&mut tm, 16, 16, 4, HdrPrecision::None);

    for slot in [OffscreenSlot::LeftEyeResolve, OffscreenSlot::FilterA, OffscreenSlot::BlitDepth] {
        let surface = pool.get(&mut tm, slot).unwrap();
        assert_eq!(surface.samples(), 0, "{:?}", slot);
        assert!(surface.color_texture().is_some(), "{:?}", slot);
    }
    assert_eq!(pool.samples(), 4);
}

#[test]
fn test_sample_count_falls_back_until_supported() {
    let (mut tm, state) = manager();
    state.lock().unwrap().max_supported_samples = 4;
    let mut pool = OffscreenPool::new();
    pool.update(&mut tm, 16, 16, 8, HdrPrecision::None);

    let left = pool.get(&mut tm, OffscreenSlot::LeftEye).unwrap();
    assert_eq!(left.samples(), 4);
    assert_eq!(pool.samples(), 4);

    // The right eye starts from the lowered baseline
    state.lock().unwrap().commands.clear();
    let right = pool.get(&mut tm, OffscreenSlot::RightEye).unwrap();
    assert_eq!(right.samples(), 4);
    assert_eq!(state.lock().unwrap().count_commands("create_framebuffer"), 1);
}

#[test]
fn test_transient_failure_lowers_samples() {
    let (mut tm, state) = manager();
    state.lock().unwrap().fail_allocation_at = Some(0);
    let mut pool = OffscreenPool::new();
    pool.update(&mut tm, 16, 16, 4, HdrPrecision::None);

    let surface = pool.get(&mut tm, OffscreenSlot::LeftEye).unwrap();
    assert_eq!(surface.samples(), 3);
    assert_eq!(pool.samples(), 3);
}

#[test]
fn test_get_reports_last_error_when_every_attempt_fails() {
    let (mut tm, state) = manager();
    state.lock().unwrap().forced_status = Some(FramebufferStatus::Unsupported);
    let mut pool = OffscreenPool::new();
    pool.update(&mut tm, 16, 16, 2, HdrPrecision::None);

    let result = pool.get(&mut tm, OffscreenSlot::LeftEye);
    assert!(matches!(result, Err(Error::IncompleteFramebuffer(_))));
    assert_eq!(pool.populated_count(), 0);

    let s = state.lock().unwrap();
    // 2, 1 then 0 samples
    assert_eq!(s.count_commands("create_framebuffer"), 3);
    assert_eq!(s.live_object_count(), 0);
}

#[test]
fn test_get_rebinds_previously_bound_target() {
    let (mut tm, _state) = manager();
    let outer = OffscreenSurface::create(&mut tm, &OffscreenDesc {
        width: 8,
        height: 8,
        samples: 0,
        precision: HdrPrecision::None,
        mode: OffscreenMode::empty(),
    })
    .unwrap();
    outer.bind_simple(&mut tm).unwrap();

    let mut pool = OffscreenPool::new();
    pool.update(&mut tm, 16, 16, 0, HdrPrecision::None);
    pool.get(&mut tm, OffscreenSlot::FilterB).unwrap();

    assert!(tm.is_bound(outer.target()));
}

#[test]
fn test_get_from_default_leaves_default_bound() {
    let (mut tm, _state) = manager();
    let mut pool = OffscreenPool::new();
    pool.update(&mut tm, 16, 16, 0, HdrPrecision::None);
    pool.get(&mut tm, OffscreenSlot::FilterA).unwrap();
    assert_eq!(tm.bound_target(), None);
}

#[test]
fn test_clear_releases_all_slots() {
    let (mut tm, state) = manager();
    let mut pool = OffscreenPool::new();
    pool.update(&mut tm, 16, 16, 0, HdrPrecision::None);
    for slot in OffscreenSlot::ALL {
        pool.get(&mut tm, slot).unwrap();
    }
    assert_eq!(pool.populated_count(), OFFSCREEN_SLOT_COUNT);

    pool.clear(&mut tm);
    assert_eq!(pool.populated_count(), 0);
    assert_eq!(state.lock().unwrap().live_object_count(), 0);
}
