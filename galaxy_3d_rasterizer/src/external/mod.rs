//! Collaborator interfaces consumed by the rasterizer
//!
//! The canvas, the shader library and the physics ray caster belong to
//! other subsystems; the rasterizer reaches them only through these traits.

mod canvas;
mod shader_library;
mod ray_cast;

pub use canvas::Canvas;
pub use shader_library::{
    ShaderLibrary, ProgramHandle, UniformLocation, UniformValue,
    BuiltinProgram, AttachedInterface,
};
pub use ray_cast::{RayCaster, RayHit};

// Mock collaborators for tests
#[cfg(test)]
pub mod mock_external;
