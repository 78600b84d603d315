//! Off-screen rendering module
//!
//! `OffscreenSurface` bundles a render target with its own color and depth
//! storage; `OffscreenPool` keeps the named surfaces of a frame (per eye,
//! filter passes, depth scratch) in step with the canvas.

mod offscreen_surface;
mod offscreen_pool;

pub use offscreen_surface::{
    OffscreenSurface, OffscreenDesc, OffscreenMode, StoragePlan, BindMode, resolve_storage,
};
pub use offscreen_pool::{OffscreenPool, OffscreenSlot, OFFSCREEN_SLOT_COUNT};
