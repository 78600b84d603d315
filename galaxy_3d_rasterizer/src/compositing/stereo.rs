/// Stereo modes and per-eye projection/view matrices.

use glam::{Mat3, Mat4, Vec3, Vec4};
use crate::config::RasterizerConfig;

/// Eye-separation multiple used as focal length when the camera has none
const FALLBACK_FOCAL_FACTOR: f32 = 30.0;

/// How the two eye images reach the display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StereoMode {
    #[default]
    NoStereo,
    /// Hardware quad-buffer stereo
    QuadBuffered,
    /// Left eye on top, right eye below, with a scanline band between
    AboveBelow,
    /// Row interlace
    Interlaced,
    /// Red/cyan
    Anaglyph,
    SideBySide,
    /// Column interlace
    VerticalInterlace,
    /// Top/bottom halves, stretched vertically by the display
    TopBottom3dTv,
}

impl StereoMode {
    pub fn is_stereo(self) -> bool {
        self != StereoMode::NoStereo
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StereoEye {
    #[default]
    Left,
    Right,
}

/// glFrustum-style perspective projection
pub fn frustum_matrix(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = far - near;

    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new((right + left) / width, (top + bottom) / height, -(far + near) / depth, -1.0),
        Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
    )
}

/// glOrtho-style orthographic projection
pub fn ortho_matrix(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    Mat4::orthographic_rh_gl(left, right, bottom, top, near, far)
}

/// Eye separation and focal length shared by both eyes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoCamera {
    eye_separation: f32,
    focal_length: f32,
    /// Set by `set_focal_length`; otherwise the focal length follows the camera
    focal_length_fixed: bool,
}

impl StereoCamera {
    pub fn new(eye_separation: f32, focal_length: Option<f32>) -> Self {
        Self {
            eye_separation,
            focal_length: focal_length.unwrap_or(0.0),
            focal_length_fixed: focal_length.is_some(),
        }
    }

    pub fn from_config(config: &RasterizerConfig) -> Self {
        Self::new(config.eye_separation, config.focal_length)
    }

    pub fn eye_separation(&self) -> f32 {
        self.eye_separation
    }

    pub fn set_eye_separation(&mut self, eye_separation: f32) {
        self.eye_separation = eye_separation;
    }

    /// Focal length used by the last stereo frustum (or the fixed one)
    pub fn focal_length(&self) -> f32 {
        self.focal_length
    }

    /// Fix the focal length; the camera's value is ignored from now on
    pub fn set_focal_length(&mut self, focal_length: f32) {
        self.focal_length = focal_length;
        self.focal_length_fixed = true;
    }

    /// Perspective projection for one eye
    ///
    /// With stereo on, the horizontal bounds are shifted by
    /// `0.5 * separation * near / focal` (towards +x for the left eye).
    /// `camera_focal_length` is used unless a focal length was fixed; 0 means
    /// `separation * 30`. A zero or non-finite focal length leaves the bounds
    /// unshifted. The 3DTV top/bottom mode doubles bottom and top.
    #[allow(clippy::too_many_arguments)]
    pub fn frustum_matrix(
        &mut self,
        mode: StereoMode,
        eye: StereoEye,
        camera_focal_length: f32,
        mut left: f32,
        mut right: f32,
        mut bottom: f32,
        mut top: f32,
        near: f32,
        far: f32,
    ) -> Mat4 {
        if mode.is_stereo() {
            if !self.focal_length_fixed {
                self.focal_length = if camera_focal_length == 0.0 {
                    self.eye_separation * FALLBACK_FOCAL_FACTOR
                } else {
                    camera_focal_length
                };
            }

            // No shift without a usable focal length
            let offset = if self.focal_length != 0.0 && self.focal_length.is_finite() {
                0.5 * self.eye_separation * near / self.focal_length
            } else {
                0.0
            };
            match eye {
                StereoEye::Left => {
                    left += offset;
                    right += offset;
                }
                StereoEye::Right => {
                    left -= offset;
                    right -= offset;
                }
            }

            if mode == StereoMode::TopBottom3dTv {
                bottom *= 2.0;
                top *= 2.0;
            }
        }

        frustum_matrix(left, right, bottom, top, near, far)
    }

    /// View matrix for one eye
    ///
    /// `camera_transform` is the world-to-camera transform. In stereo
    /// perspective views it is offset by half the eye separation along the
    /// eye line (view direction x up), left eye towards -eyeline.
    pub fn view_matrix(&self, mode: StereoMode, eye: StereoEye, camera_transform: Mat4, perspective: bool) -> Mat4 {
        if !mode.is_stereo() || !perspective {
            return camera_transform;
        }

        // Camera looks down -Y with +Z up
        let orientation = Mat3::from_mat4(camera_transform).transpose();
        let view_dir = orientation * Vec3::NEG_Y;
        let view_up = orientation * Vec3::Z;
        let eye_line = view_dir.cross(view_up);

        let half = eye_line * self.eye_separation / 2.0;
        let shift = match eye {
            StereoEye::Left => -half,
            StereoEye::Right => half,
        };
        camera_transform * Mat4::from_translation(shift)
    }
}

impl Default for StereoCamera {
    fn default() -> Self {
        Self::from_config(&RasterizerConfig::default())
    }
}

#[cfg(test)]
#[path = "stereo_tests.rs"]
mod tests;
