//! Named anchors on a layer's outline that can be dragged to resize it.

use geometry::Bounds;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::backend::CursorStyle;

/// One of the eight resize anchors. World space is y-up, so "top" is +y.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    AsRefStr,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Grip {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Top,
    Bottom,
    Left,
    Right,
}

impl Grip {
    /// Position of the grip relative to the layer centre, in half-extents.
    pub fn offset(&self) -> Vec2 {
        match self {
            Grip::TopLeft => Vec2::new(-1.0, 1.0),
            Grip::TopRight => Vec2::new(1.0, 1.0),
            Grip::BottomLeft => Vec2::new(-1.0, -1.0),
            Grip::BottomRight => Vec2::new(1.0, -1.0),
            Grip::Top => Vec2::new(0.0, 1.0),
            Grip::Bottom => Vec2::new(0.0, -1.0),
            Grip::Left => Vec2::new(-1.0, 0.0),
            Grip::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// World position of the grip on the given bounds
    pub fn anchor(&self, bounds: &Bounds) -> Vec2 {
        bounds.anchor(self.offset())
    }

    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            Grip::TopLeft | Grip::TopRight | Grip::BottomLeft | Grip::BottomRight
        )
    }

    /// Returns the grip on the other side of the layer
    pub fn opposite(&self) -> Self {
        match self {
            Grip::TopLeft => Grip::BottomRight,
            Grip::TopRight => Grip::BottomLeft,
            Grip::BottomLeft => Grip::TopRight,
            Grip::BottomRight => Grip::TopLeft,
            Grip::Top => Grip::Bottom,
            Grip::Bottom => Grip::Top,
            Grip::Left => Grip::Right,
            Grip::Right => Grip::Left,
        }
    }

    pub fn cursor(&self) -> CursorStyle {
        match self {
            Grip::TopLeft | Grip::BottomRight => CursorStyle::NwseResize,
            Grip::TopRight | Grip::BottomLeft => CursorStyle::NeswResize,
            Grip::Top | Grip::Bottom => CursorStyle::NsResize,
            Grip::Left | Grip::Right => CursorStyle::EwResize,
        }
    }

    /// Sign applied to each drag axis when only the size changes.
    ///
    /// The vertical sign is measured against a downward-growing height, so
    /// bottom grips grow with +y and top grips shrink with it.
    pub fn size_signs(&self) -> Vec2 {
        let offset = self.offset();
        Vec2::new(offset.x, -offset.y)
    }
}

/// Which grips a resize handle shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GripSet {
    Corners,
    #[default]
    All,
}

impl GripSet {
    pub fn grips(&self) -> impl Iterator<Item = Grip> {
        let corners_only = matches!(self, GripSet::Corners);
        Grip::iter().filter(move |grip| !corners_only || grip.is_corner())
    }

    pub fn contains(&self, grip: Grip) -> bool {
        self.grips().any(|candidate| candidate == grip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchors_on_unit_square() {
        let bounds = Bounds::from_center_size(Vec2::ZERO, Vec2::splat(2.0));
        assert_eq!(Grip::TopLeft.anchor(&bounds), Vec2::new(-1.0, 1.0));
        assert_eq!(Grip::BottomRight.anchor(&bounds), Vec2::new(1.0, -1.0));
        assert_eq!(Grip::Top.anchor(&bounds), Vec2::new(0.0, 1.0));
        assert_eq!(Grip::Left.anchor(&bounds), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_size_signs_match_drag_table() {
        assert_eq!(Grip::TopLeft.size_signs(), Vec2::new(-1.0, -1.0));
        assert_eq!(Grip::TopRight.size_signs(), Vec2::new(1.0, -1.0));
        assert_eq!(Grip::BottomLeft.size_signs(), Vec2::new(-1.0, 1.0));
        assert_eq!(Grip::BottomRight.size_signs(), Vec2::new(1.0, 1.0));
        assert_eq!(Grip::Top.size_signs(), Vec2::new(0.0, -1.0));
        assert_eq!(Grip::Right.size_signs(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_opposite_is_involution() {
        for grip in Grip::iter() {
            assert_eq!(grip.opposite().opposite(), grip);
            assert_eq!(grip.opposite().offset(), -grip.offset());
        }
    }

    #[test]
    fn test_cursor_map() {
        assert_eq!(Grip::TopLeft.cursor(), CursorStyle::NwseResize);
        assert_eq!(Grip::BottomLeft.cursor(), CursorStyle::NeswResize);
        assert_eq!(Grip::Bottom.cursor(), CursorStyle::NsResize);
        assert_eq!(Grip::Left.cursor(), CursorStyle::EwResize);
    }

    #[test]
    fn test_grip_sets() {
        assert_eq!(GripSet::All.grips().count(), 8);
        assert_eq!(GripSet::Corners.grips().count(), 4);
        assert!(!GripSet::Corners.contains(Grip::Top));
        assert_eq!(Grip::TopLeft.to_string(), "top-left");
    }
}
