use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::coordinates::{NdcPoint, ScreenPoint};

/// Pixel extent of the render surface the pointer moves over.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A surface with no area cannot map pointers anywhere.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// Convert a point from screen pixels to normalized device coordinates.
    pub fn screen_to_ndc(&self, screen: ScreenPoint) -> Option<NdcPoint> {
        if self.is_empty() {
            return None;
        }
        Some(NdcPoint::new(
            (screen.x() / self.width) * 2.0 - 1.0,
            1.0 - (screen.y() / self.height) * 2.0,
        ))
    }

    /// Convert a point from normalized device coordinates to screen pixels.
    pub fn ndc_to_screen(&self, ndc: NdcPoint) -> ScreenPoint {
        ScreenPoint::new(
            (ndc.x() + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y()) * 0.5 * self.height,
        )
    }
}

/// A half-line in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length, or zero for a degenerate camera
    pub direction: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// View and projection pair of the scene camera.
///
/// Uses glam's right-handed conventions with a `[0, 1]` depth range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    view: Mat4,
    projection: Mat4,
}

impl Camera {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self { view, projection }
    }

    /// An orthographic camera at `eye` looking at `target`, showing
    /// `half_extent` world units on each side of the view axis.
    pub fn orthographic(eye: Vec3, target: Vec3, half_extent: Vec2, near: f32, far: f32) -> Self {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let projection = Mat4::orthographic_rh(
            -half_extent.x,
            half_extent.x,
            -half_extent.y,
            half_extent.y,
            near,
            far,
        );
        Self { view, projection }
    }

    pub fn perspective(
        eye: Vec3,
        target: Vec3,
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        let projection = Mat4::perspective_rh(fov_y_radians, aspect, near, far);
        Self { view, projection }
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// World-space direction the camera looks along.
    pub fn forward(&self) -> Vec3 {
        self.view
            .inverse()
            .transform_vector3(Vec3::NEG_Z)
            .normalize_or_zero()
    }

    /// The ray leaving the near plane through `ndc` towards the far plane.
    pub fn ray(&self, ndc: NdcPoint) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(Vec3::new(ndc.x(), ndc.y(), 0.0));
        let far = inverse.project_point3(Vec3::new(ndc.x(), ndc.y(), 1.0));
        Ray {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }

    /// Project a world point to normalized device coordinates.
    pub fn world_to_ndc(&self, world: Vec3) -> NdcPoint {
        let projected = self.view_projection().project_point3(world);
        NdcPoint::new(projected.x, projected.y)
    }
}
