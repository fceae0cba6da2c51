//! # Geometry for the layer editor
//!
//! World-space bounds, typed screen/device coordinates, and the camera math
//! used to turn a pointer position into a point on the editor's working plane.

pub mod bounds;
pub mod camera;
pub mod coordinates;
pub mod unproject;

pub use bounds::Bounds;
pub use camera::{Camera, Ray, Viewport};
pub use coordinates::{NdcPoint, ScreenPoint};
pub use unproject::{ReferencePlane, Unprojector};
