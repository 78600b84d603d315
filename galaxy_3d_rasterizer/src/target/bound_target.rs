/// Tracks which render target the GPU context has bound.
///
/// `None` means the window's default framebuffer. Saved entries are pushed
/// by the saving binds and popped by the matching unbind.

use super::render_target::RenderTargetKey;

#[derive(Debug, Default)]
pub struct BoundTarget {
    current: Option<RenderTargetKey>,
    saved: Vec<Option<RenderTargetKey>>,
}

impl BoundTarget {
    pub fn current(&self) -> Option<RenderTargetKey> {
        self.current
    }

    pub(crate) fn set(&mut self, target: Option<RenderTargetKey>) {
        self.current = target;
    }

    /// Remember the current target for a later `pop_saved`
    pub(crate) fn push_saved(&mut self) {
        self.saved.push(self.current);
    }

    /// Target current before the matching `push_saved` (None if the stack is empty)
    pub(crate) fn pop_saved(&mut self) -> Option<Option<RenderTargetKey>> {
        self.saved.pop()
    }

    /// Number of pending saving binds
    pub fn saved_depth(&self) -> usize {
        self.saved.len()
    }

    /// Forget a destroyed target wherever it is referenced
    pub(crate) fn forget(&mut self, target: RenderTargetKey) {
        if self.current == Some(target) {
            self.current = None;
        }
        for entry in self.saved.iter_mut() {
            if *entry == Some(target) {
                *entry = None;
            }
        }
    }
}
