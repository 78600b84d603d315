/*!
# Galaxy 3D Rasterizer - OpenGL Backend

OpenGL implementation of the rasterizer's `GraphicsDevice` trait, built on
glow. The caller owns window and context creation and hands the current
context to `GlGraphicsDevice::new`.

Enable the `gl-debug` feature to check `glGetError` after every call.

```no_run
use galaxy_3d_rasterizer::galaxy3d::RasterizerConfig;
use galaxy_3d_rasterizer::galaxy3d::compositing::Rasterizer;
use galaxy_3d_rasterizer_gl::GlGraphicsDevice;

# fn run(gl: glow::Context, shaders: Box<dyn galaxy_3d_rasterizer::galaxy3d::external::ShaderLibrary>)
#     -> galaxy_3d_rasterizer::galaxy3d::Result<()> {
let device = GlGraphicsDevice::new(gl)?;
let rasterizer = Rasterizer::new(Box::new(device), shaders, RasterizerConfig::default());
# Ok(())
# }
```
*/

mod gl_format;
mod gl_graphics_device;
mod debug;

pub use gl_graphics_device::GlGraphicsDevice;
pub use gl_format::GlVersion;

// Re-export debug utilities
pub use debug::{gl_error_count, reset_gl_error_stats, print_gl_error_report};
