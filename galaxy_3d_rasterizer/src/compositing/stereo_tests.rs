/// Tests for stereo projection and view matrices

use super::*;

const EPS: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPS
}

// ============================================================================
// Tests: Projections
// ============================================================================

#[test]
fn test_symmetric_frustum_matches_perspective() {
    let m = frustum_matrix(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0);
    let expected = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
    assert!(m.abs_diff_eq(expected, EPS));
}

#[test]
fn test_asymmetric_frustum_offsets_center() {
    let m = frustum_matrix(0.0, 2.0, -1.0, 1.0, 1.0, 10.0);
    assert!(approx(m.z_axis.x, 1.0));
    assert!(approx(m.z_axis.y, 0.0));
    assert!(approx(m.x_axis.x, 1.0));
}

#[test]
fn test_ortho_maps_bounds_to_unit_cube() {
    let m = ortho_matrix(0.0, 800.0, 0.0, 600.0, -1.0, 1.0);
    let corner = m.project_point3(Vec3::new(800.0, 600.0, 0.0));
    assert!(approx(corner.x, 1.0));
    assert!(approx(corner.y, 1.0));
}

// ============================================================================
// Tests: Stereo frustum
// ============================================================================

#[test]
fn test_mono_frustum_is_unshifted() {
    let mut camera = StereoCamera::new(0.1, None);
    let m = camera.frustum_matrix(StereoMode::NoStereo, StereoEye::Left, 1.0, -1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
    assert!(m.abs_diff_eq(frustum_matrix(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0), EPS));
    // Mono never touches the focal length
    assert_eq!(camera.focal_length(), 0.0);
}

#[test]
fn test_stereo_frustum_shifts_eyes_opposite_ways() {
    let mut camera = StereoCamera::new(0.2, None);
    // offset = 0.5 * 0.2 * 1 / 2 = 0.05
    let left = camera.frustum_matrix(StereoMode::SideBySide, StereoEye::Left, 2.0, -1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
    let right = camera.frustum_matrix(StereoMode::SideBySide, StereoEye::Right, 2.0, -1.0, 1.0, -1.0, 1.0, 1.0, 10.0);

    assert!(left.abs_diff_eq(frustum_matrix(-0.95, 1.05, -1.0, 1.0, 1.0, 10.0), EPS));
    assert!(right.abs_diff_eq(frustum_matrix(-1.05, 0.95, -1.0, 1.0, 1.0, 10.0), EPS));
    assert_eq!(camera.focal_length(), 2.0);
}

#[test]
fn test_zero_camera_focal_length_falls_back() {
    let mut camera = StereoCamera::new(0.1, None);
    camera.frustum_matrix(StereoMode::Anaglyph, StereoEye::Left, 0.0, -1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
    assert!(approx(camera.focal_length(), 3.0));
}

#[test]
fn test_zero_focal_length_leaves_frustum_unshifted() {
    let mono = frustum_matrix(-1.0, 1.0, -1.0, 1.0, 0.1, 100.0);

    // Zero separation makes the fallback focal length zero too
    let mut camera = StereoCamera::new(0.0, None);
    let m = camera.frustum_matrix(StereoMode::Interlaced, StereoEye::Left, 0.0, -1.0, 1.0, -1.0, 1.0, 0.1, 100.0);
    assert!(m.is_finite());
    assert!(m.abs_diff_eq(mono, EPS));

    let mut fixed = StereoCamera::new(0.1, None);
    fixed.set_focal_length(0.0);
    let m = fixed.frustum_matrix(StereoMode::Anaglyph, StereoEye::Right, 2.0, -1.0, 1.0, -1.0, 1.0, 0.1, 100.0);
    assert!(m.is_finite());
    assert!(m.abs_diff_eq(mono, EPS));
}

#[test]
fn test_fixed_focal_length_ignores_camera() {
    let mut camera = StereoCamera::new(0.1, None);
    camera.set_focal_length(5.0);
    camera.frustum_matrix(StereoMode::Anaglyph, StereoEye::Left, 2.0, -1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
    assert_eq!(camera.focal_length(), 5.0);

    let configured = StereoCamera::new(0.1, Some(7.0));
    assert_eq!(configured.focal_length(), 7.0);
}

#[test]
fn test_top_bottom_3dtv_doubles_vertical_bounds() {
    let mut camera = StereoCamera::new(0.0, Some(1.0));
    let m = camera.frustum_matrix(StereoMode::TopBottom3dTv, StereoEye::Left, 1.0, -1.0, 1.0, -0.5, 0.5, 1.0, 10.0);
    assert!(m.abs_diff_eq(frustum_matrix(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0), EPS));
}

// ============================================================================
// Tests: Stereo view matrix
// ============================================================================

#[test]
fn test_view_matrix_unchanged_without_stereo_or_perspective() {
    let camera = StereoCamera::new(0.1, None);
    let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

    assert_eq!(camera.view_matrix(StereoMode::NoStereo, StereoEye::Left, transform, true), transform);
    assert_eq!(camera.view_matrix(StereoMode::Anaglyph, StereoEye::Left, transform, false), transform);
}

#[test]
fn test_view_matrix_offsets_along_eye_line() {
    let camera = StereoCamera::new(0.1, None);

    // Identity camera: view dir -Y, up +Z, eye line -X
    let left = camera.view_matrix(StereoMode::Anaglyph, StereoEye::Left, Mat4::IDENTITY, true);
    let right = camera.view_matrix(StereoMode::Anaglyph, StereoEye::Right, Mat4::IDENTITY, true);

    assert!(left.w_axis.truncate().abs_diff_eq(Vec3::new(0.05, 0.0, 0.0), EPS));
    assert!(right.w_axis.truncate().abs_diff_eq(Vec3::new(-0.05, 0.0, 0.0), EPS));
}

#[test]
fn test_view_matrix_eyes_are_one_separation_apart() {
    let camera = StereoCamera::new(0.3, None);
    let transform = Mat4::from_rotation_z(0.7) * Mat4::from_translation(Vec3::new(4.0, -2.0, 1.0));

    let left = camera.view_matrix(StereoMode::SideBySide, StereoEye::Left, transform, true);
    let right = camera.view_matrix(StereoMode::SideBySide, StereoEye::Right, transform, true);
    let distance = (left.w_axis - right.w_axis).truncate().length();
    assert!(approx(distance, 0.3));
}
