/*!
# Galaxy 3D Rasterizer

Off-screen render targets and frame compositing for the Galaxy 3D engine.

This crate is platform-agnostic: every GPU call goes through the
`GraphicsDevice` trait, implemented by a backend crate
(`galaxy_3d_rasterizer_gl` for OpenGL).

## Architecture

- **TargetManager**: owns the device, the render-target and attachable arenas,
  and the bound-target tracker
- **RenderTarget / Attachable**: framebuffer objects and the textures or
  renderbuffers attached to them, linked both ways by arena keys
- **OffscreenSurface**: a render target with its own color and depth storage
- **OffscreenPool**: per-eye, filter and scratch surfaces sized to the canvas
- **Compositor**: off-screen to screen draws, stereo composition, separable blur
- **Rasterizer**: facade tying the above to the canvas and shader collaborators
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod graphics_device;
pub mod external;
pub mod target;
pub mod offscreen;
pub mod compositing;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging hub
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::RasterizerConfig;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Render sub-module: device seam, targets and attachables
    pub mod render {
        pub use crate::graphics_device::*;
        pub use crate::target::*;
    }

    // Off-screen surfaces and pool
    pub mod offscreen {
        pub use crate::offscreen::*;
    }

    // Compositing, stereo and the rasterizer facade
    pub mod compositing {
        pub use crate::compositing::*;
    }

    // Collaborator interfaces (canvas, shaders, ray casting)
    pub mod external {
        pub use crate::external::*;
    }
}

// Re-export math library at crate root
pub use glam;
