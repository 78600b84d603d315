/// Render target - a GPU framebuffer object and its attachment table.
///
/// The table holds arena keys of the attached resources, never the resources
/// themselves: a render target does not own what is attached to it.
/// Render targets can only be created via `TargetManager::create_render_target()`.

use slotmap::new_key_type;
use crate::graphics_device::{FramebufferHandle, AttachmentPoint};
use super::attachable::AttachableKey;

new_key_type! {
    /// Stable key of a render target in the `TargetManager` arena
    pub struct RenderTargetKey;
}

/// Number of color attachment points per render target
pub const MAX_COLOR_SLOTS: usize = 4;

#[derive(Debug)]
pub struct RenderTarget {
    handle: FramebufferHandle,
    pub(crate) color: [Option<AttachableKey>; MAX_COLOR_SLOTS],
    pub(crate) depth: Option<AttachableKey>,
    /// Read buffer last selected for this framebuffer
    pub(crate) read_buffer: Option<AttachmentPoint>,
}

impl RenderTarget {
    /// Internal only, created via TargetManager::create_render_target()
    pub(crate) fn new(handle: FramebufferHandle) -> Self {
        Self {
            handle,
            color: [None; MAX_COLOR_SLOTS],
            depth: None,
            read_buffer: None,
        }
    }

    /// GPU framebuffer object
    pub fn handle(&self) -> FramebufferHandle {
        self.handle
    }

    /// Resource attached to color slot `slot`
    pub fn attachment_at(&self, slot: usize) -> Option<AttachableKey> {
        self.color.get(slot).copied().flatten()
    }

    /// Resource attached to the depth point
    pub fn depth_attachment(&self) -> Option<AttachableKey> {
        self.depth
    }

    /// Read buffer selected by the latest bind (None = no read buffer)
    pub fn read_buffer(&self) -> Option<AttachmentPoint> {
        self.read_buffer
    }

    /// Indices of populated color slots, in ascending order
    pub fn populated_color_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.color
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|_| i))
    }

    /// True if nothing is attached
    pub fn is_empty(&self) -> bool {
        self.depth.is_none() && self.color.iter().all(|c| c.is_none())
    }
}
