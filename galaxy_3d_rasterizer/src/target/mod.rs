//! Render target management module
//!
//! Framebuffer objects (`RenderTarget`), the textures and renderbuffers
//! attached to them (`Attachable`), and the `TargetManager` that owns both
//! arenas together with the bound-target tracker.

mod render_target;
mod attachable;
mod bound_target;
mod target_manager;

pub use render_target::{RenderTarget, RenderTargetKey, MAX_COLOR_SLOTS};
pub use attachable::{Attachable, AttachableKey, AttachableStorage, AttachmentRef};
pub use bound_target::BoundTarget;
pub use target_manager::TargetManager;
