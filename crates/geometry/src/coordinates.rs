//! # Coordinate System Types
//!
//! Distinct types for the two pointer-side coordinate spaces so a pixel
//! position is never fed to camera math by accident.
//!
//! ## Coordinate Spaces
//!
//! - **Screen Coordinates**: pixels, origin at the top-left of the render
//!   surface, y grows downwards
//! - **Normalized Device Coordinates**: `[-1, 1]` on both axes, origin at the
//!   center of the surface, y grows upwards
//!
//! World coordinates are plain [`glam::Vec3`] values on the working plane.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Pixel position on the render surface, y down
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint(Vec2);

/// Position in `[-1, 1]` clip space, y up
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NdcPoint(Vec2);

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn from_vec2(vec: Vec2) -> Self {
        Self(vec)
    }

    pub fn as_vec2(&self) -> Vec2 {
        self.0
    }

    pub fn x(&self) -> f32 {
        self.0.x
    }

    pub fn y(&self) -> f32 {
        self.0.y
    }

    /// Pixel distance
    pub fn distance(&self, other: ScreenPoint) -> f32 {
        self.0.distance(other.0)
    }
}

impl NdcPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn from_vec2(vec: Vec2) -> Self {
        Self(vec)
    }

    pub fn as_vec2(&self) -> Vec2 {
        self.0
    }

    pub fn x(&self) -> f32 {
        self.0.x
    }

    pub fn y(&self) -> f32 {
        self.0.y
    }

    /// Returns true when the point lies on the visible surface
    pub fn is_on_surface(&self) -> bool {
        self.0.x.abs() <= 1.0 && self.0.y.abs() <= 1.0
    }
}

impl Add<Vec2> for ScreenPoint {
    type Output = ScreenPoint;

    fn add(self, rhs: Vec2) -> Self::Output {
        ScreenPoint(self.0 + rhs)
    }
}

impl Sub for ScreenPoint {
    type Output = Vec2;

    fn sub(self, rhs: ScreenPoint) -> Self::Output {
        self.0 - rhs.0
    }
}

impl From<Vec2> for ScreenPoint {
    fn from(vec: Vec2) -> Self {
        Self(vec)
    }
}

impl From<(f32, f32)> for ScreenPoint {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x, y)
    }
}
