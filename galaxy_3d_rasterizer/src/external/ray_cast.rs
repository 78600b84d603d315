/// Ray casting collaborator, used only to project shadows onto the ground

use glam::Vec3;

/// One hit reported by `RayCaster::ray_test`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space hit point
    pub point: Vec3,
    /// World-space surface normal at the hit point
    pub normal: Vec3,
    /// False when the hit polygon is invisible (collision-only geometry)
    pub polygon_visible: bool,
}

pub trait RayCaster {
    /// Cast a ray from `from` to `to`
    ///
    /// `callback` is called for hits in order of distance until it returns
    /// true (hit accepted). Returns true if a hit was accepted.
    fn ray_test(&self, from: Vec3, to: Vec3, callback: &mut dyn FnMut(&RayHit) -> bool) -> bool;
}
