/// Attachable - a texture or renderbuffer that can sit in one render target slot.
///
/// Both variants share one struct; only the storage handle differs.
/// The back-reference (`attachment`) is kept in sync with the owning render
/// target's table by `TargetManager::attach` / `detach`.

use slotmap::new_key_type;
use crate::graphics_device::{
    TextureHandle, RenderbufferHandle, StorageFormat, HdrPrecision, AttachmentPoint,
};
use super::render_target::RenderTargetKey;

new_key_type! {
    /// Stable key of an attachable in the `TargetManager` arena
    pub struct AttachableKey;
}

/// GPU storage behind an attachable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachableStorage {
    /// Can be sampled by shaders
    Texture(TextureHandle),
    /// Render-only storage
    Renderbuffer(RenderbufferHandle),
}

/// Where an attachable is currently attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentRef {
    /// Owning render target
    pub target: RenderTargetKey,
    /// Slot passed to `attach` (depth resources live on the depth point
    /// whatever the slot)
    pub slot: usize,
}

#[derive(Debug)]
pub struct Attachable {
    storage: AttachableStorage,
    width: u32,
    height: u32,
    samples: u32,
    format: StorageFormat,
    pub(crate) attachment: Option<AttachmentRef>,
    pub(crate) bound_unit: Option<u32>,
}

impl Attachable {
    pub(crate) fn new(storage: AttachableStorage, width: u32, height: u32, samples: u32, format: StorageFormat) -> Self {
        Self {
            storage,
            width,
            height,
            samples,
            format,
            attachment: None,
            bound_unit: None,
        }
    }

    pub fn storage(&self) -> AttachableStorage {
        self.storage
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sample count (0 = single-sample)
    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn is_multisample(&self) -> bool {
        self.samples > 0
    }

    pub fn format(&self) -> StorageFormat {
        self.format
    }

    pub fn is_depth(&self) -> bool {
        self.format.is_depth()
    }

    /// Color precision; depth storage reports `HdrPrecision::None`
    pub fn precision(&self) -> HdrPrecision {
        match self.format {
            StorageFormat::Color(precision) => precision,
            StorageFormat::Depth { .. } => HdrPrecision::None,
        }
    }

    pub fn is_texture(&self) -> bool {
        matches!(self.storage, AttachableStorage::Texture(_))
    }

    /// Texture handle, None for renderbuffer storage
    pub fn texture(&self) -> Option<TextureHandle> {
        match self.storage {
            AttachableStorage::Texture(texture) => Some(texture),
            AttachableStorage::Renderbuffer(_) => None,
        }
    }

    /// Render target this resource is attached to
    pub fn owning_target(&self) -> Option<RenderTargetKey> {
        self.attachment.map(|a| a.target)
    }

    /// Slot this resource is attached to
    pub fn slot(&self) -> Option<usize> {
        self.attachment.map(|a| a.slot)
    }

    /// Attachment point used for this resource at `slot`
    pub fn attachment_point(&self, slot: usize) -> AttachmentPoint {
        if self.is_depth() {
            AttachmentPoint::Depth
        } else {
            AttachmentPoint::Color(slot as u32)
        }
    }

    /// Texture unit this resource is bound to for sampling
    pub fn bound_unit(&self) -> Option<u32> {
        self.bound_unit
    }
}
