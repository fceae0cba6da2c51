//! Axis-aligned world-space rectangles
//!
//! Layers are never rotated, so every extent the editor tests against is an
//! axis-aligned box on the working plane. World space is y-up: `min` is the
//! bottom-left corner and `max` the top-right one.

use glam::Vec2;

/// Rectangle on the working plane, stored as its two extreme corners
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Bottom-left corner
    pub min: Vec2,
    /// Top-right corner
    pub max: Vec2,
}

impl Bounds {
    /// `min` is expected to be component-wise below `max`; callers own that.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Box of `size` centred on `center`.
    ///
    /// This is how a layer describes itself: it is positioned by its center
    /// and scales symmetrically around it.
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        self.min.lerp(self.max, 0.5)
    }

    pub fn half_size(&self) -> Vec2 {
        self.size() * 0.5
    }

    /// Inclusive on every edge.
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Point at a normalized offset from the center.
    ///
    /// `(-1, 1)` is the top-left corner, `(0, -1)` the middle of the bottom
    /// edge and `(0, 0)` the center.
    pub fn anchor(&self, offset: Vec2) -> Vec2 {
        self.center() + self.half_size() * offset
    }
}
