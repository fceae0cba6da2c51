//! Pointer unprojection onto the editor's working plane.
//!
//! Hit testing runs against a fixed plane instead of whatever mesh the pointer
//! ray happens to cross, so manipulation coordinates stay stable no matter
//! what is rendered underneath the cursor.

use glam::Vec3;

use crate::camera::{Camera, Ray};
use crate::coordinates::NdcPoint;

/// Rays closer to parallel than this never reach the plane.
const PARALLEL_EPSILON: f32 = 1.0e-6;

/// An infinite plane `normal · p = distance`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferencePlane {
    pub normal: Vec3,
    pub distance: f32,
}

impl ReferencePlane {
    /// The z = 0 plane, seen head-on by a camera looking down -Z.
    pub const XY: Self = Self {
        normal: Vec3::Z,
        distance: 0.0,
    };

    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal: normal.normalize_or_zero(),
            distance,
        }
    }

    /// The plane through the world origin whose normal is the camera's
    /// view-forward axis.
    pub fn facing(camera: &Camera) -> Self {
        Self::new(-camera.forward(), 0.0)
    }

    /// Intersects `ray` with the plane.
    ///
    /// Returns `None` when the ray runs parallel to the plane or only meets it
    /// behind its origin.
    pub fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() <= PARALLEL_EPSILON {
            return None;
        }
        let t = (self.distance - self.normal.dot(ray.origin)) / denom;
        if t < 0.0 {
            return None;
        }
        Some(ray.at(t))
    }
}

impl Default for ReferencePlane {
    fn default() -> Self {
        Self::XY
    }
}

/// Maps device positions to world points on a [`ReferencePlane`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Unprojector {
    plane: ReferencePlane,
}

impl Unprojector {
    pub fn new(plane: ReferencePlane) -> Self {
        Self { plane }
    }

    pub fn plane(&self) -> ReferencePlane {
        self.plane
    }

    /// World position under `ndc`, or `None` when no position is available.
    pub fn unproject(&self, camera: &Camera, ndc: NdcPoint) -> Option<Vec3> {
        let ray = camera.ray(ndc);
        if ray.direction == Vec3::ZERO {
            return None;
        }
        self.plane.intersect(&ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn front_camera() -> Camera {
        Camera::orthographic(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec2::new(10.0, 10.0),
            0.1,
            100.0,
        )
    }

    #[test]
    fn test_unproject_onto_xy_plane() {
        let unprojector = Unprojector::default();
        let world = unprojector
            .unproject(&front_camera(), NdcPoint::new(0.5, 0.5))
            .unwrap();

        assert!((world - Vec3::new(5.0, 5.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_unproject_with_perspective_hits_plane_depth() {
        let camera = Camera::perspective(
            Vec3::new(1.0, 2.0, 8.0),
            Vec3::new(1.0, 2.0, 0.0),
            std::f32::consts::FRAC_PI_3,
            1.5,
            0.1,
            100.0,
        );
        let world = Unprojector::default()
            .unproject(&camera, NdcPoint::new(-0.3, 0.8))
            .unwrap();
        assert!(world.z.abs() < 1e-4);

        // The point projects back onto the same device position.
        let ndc = camera.world_to_ndc(world);
        assert!((ndc.x() + 0.3).abs() < 1e-3);
        assert!((ndc.y() - 0.8).abs() < 1e-3);
    }

    #[test]
    fn test_parallel_ray_has_no_position() {
        // Looking along +X, every ray runs parallel to the z = 0 plane.
        let side = Camera::orthographic(
            Vec3::new(-5.0, 0.0, 0.0),
            Vec3::ZERO,
            Vec2::new(10.0, 10.0),
            0.1,
            100.0,
        );
        assert!(Unprojector::default()
            .unproject(&side, NdcPoint::new(0.2, 0.2))
            .is_none());
    }

    #[test]
    fn test_plane_behind_camera_has_no_position() {
        let away = Camera::orthographic(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, 10.0),
            Vec2::new(10.0, 10.0),
            0.1,
            100.0,
        );
        assert!(Unprojector::default()
            .unproject(&away, NdcPoint::new(0.0, 0.0))
            .is_none());
    }

    #[test]
    fn test_facing_plane_follows_camera() {
        let camera = front_camera();
        let plane = ReferencePlane::facing(&camera);
        assert!((plane.normal - Vec3::Z).length() < 1e-4);
        assert_eq!(plane.distance, 0.0);
    }
}
