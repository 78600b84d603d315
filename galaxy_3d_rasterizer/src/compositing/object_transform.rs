/// World matrix of an object for its draw mode (billboards, halos and
/// ground-projected shadows).

use glam::{Mat4, Vec3, Vec4};
use crate::external::{RayCaster, RayHit};

/// Length of the downward ray used to find the ground under a shadow
pub const SHADOW_RAY_LENGTH: f32 = 100_000.0;

/// How an object's matrix is derived from its world matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectDrawMode {
    /// World matrix as is
    #[default]
    Normal,
    /// Faces the camera around the object's Z axis
    Billboard,
    /// Faces the camera on every axis
    Halo,
    /// Flattened onto the ground found below the object
    Shadow,
}

/// Camera data needed for billboards and halos
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectCamera {
    pub position: Vec3,
    pub view_matrix: Mat4,
    pub orthographic: bool,
}

/// Matrix used to draw an object
///
/// Billboard and halo polygons face +X in object space; the result rotates
/// them towards the camera and keeps the object's axis scales. A shadow
/// casts a ray straight down through `ray_caster` and sits on the first
/// visible hit, scaled by `world_scale`; without a hit (or a ray caster) the
/// world matrix is returned unchanged.
pub fn object_transform(
    world: Mat4,
    mode: ObjectDrawMode,
    camera: &ObjectCamera,
    world_scale: Vec3,
    ray_caster: Option<&dyn RayCaster>,
) -> Mat4 {
    match mode {
        ObjectDrawMode::Normal => world,
        ObjectDrawMode::Billboard | ObjectDrawMode::Halo => facing_transform(world, mode, camera),
        ObjectDrawMode::Shadow => match ray_caster {
            Some(ray_caster) => shadow_transform(world, world_scale, ray_caster).unwrap_or(world),
            None => world,
        },
    }
}

fn facing_transform(world: Mat4, mode: ObjectDrawMode, camera: &ObjectCamera) -> Mat4 {
    let position = world.w_axis.truncate();

    let mut left = if camera.orthographic {
        camera.view_matrix.row(2).truncate().normalize_or_zero()
    } else {
        (camera.position - position).normalize_or_zero()
    };
    let mut up = world.z_axis.truncate().normalize_or_zero();

    let scale = Vec3::new(
        world.x_axis.truncate().length(),
        world.y_axis.truncate().length(),
        world.z_axis.truncate().length(),
    );

    if mode == ObjectDrawMode::Halo {
        up = (up - up.dot(left) * left).normalize_or_zero();
    } else {
        left = (left - up.dot(left) * up).normalize_or_zero();
    }
    let dir = up.cross(left).normalize_or_zero();

    Mat4::from_cols(
        (left * scale.x).extend(0.0),
        (dir * scale.y).extend(0.0),
        (up * scale.z).extend(0.0),
        position.extend(1.0),
    )
}

fn shadow_transform(world: Mat4, world_scale: Vec3, ray_caster: &dyn RayCaster) -> Option<Mat4> {
    let from = world.w_axis.truncate();
    let to = from + Vec3::NEG_Z * SHADOW_RAY_LENGTH;
    let object_left = world.x_axis.truncate();

    let mut result = None;
    let hit = ray_caster.ray_test(from, to, &mut |hit: &RayHit| {
        if !hit.polygon_visible {
            return false;
        }

        let normal = hit.normal;
        let dir = -object_left.cross(normal).normalize_or_zero();
        let left = dir.cross(normal).normalize_or_zero();

        result = Some(Mat4::from_cols(
            (left * world_scale.x).extend(0.0),
            (dir * world_scale.y).extend(0.0),
            (normal * world_scale.z).extend(0.0),
            Vec4::new(hit.point.x, hit.point.y, hit.point.z, 1.0),
        ));
        true
    });

    if hit { result } else { None }
}

#[cfg(test)]
#[path = "object_transform_tests.rs"]
mod tests;
