//! Compositing module
//!
//! Off-screen to screen draws, stereo composition and blur, plus the
//! per-eye math (render areas, frusta, view matrices, object transforms)
//! and the `Rasterizer` facade that drives them.

mod shader_interface;
mod compositor;
mod render_area;
mod stereo;
mod object_transform;
mod rasterizer;

pub use shader_interface::{
    ProgramInterface, program_interface, DrawFrameBufferInterface, StereoStippleInterface,
    StereoAnaglyphInterface, SeparableBlurInterface,
};
pub use compositor::{
    draw_offscreen_to_target, draw_offscreen_to_canvas, draw_stereo_to_canvas,
    separable_blur, blur_scales,
};
pub use render_area::{RenderArea, compute_render_area};
pub use stereo::{StereoMode, StereoEye, StereoCamera, frustum_matrix, ortho_matrix};
pub use object_transform::{ObjectDrawMode, ObjectCamera, object_transform, SHADOW_RAY_LENGTH};
pub use rasterizer::{Rasterizer, MOTION_BLUR_OFF, MOTION_BLUR_ENABLED};
