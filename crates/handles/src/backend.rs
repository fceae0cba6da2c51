//! The rendering backend contract.
//!
//! Handles only ever add, remove, move and recolor simple primitives, and set
//! the cursor of the render surface. Everything else about the renderer stays
//! on the other side of [`RenderBackend`].

use glam::Vec3;
use palette::Srgb;
use slotmap::SlotMap;
use std::cell::RefCell;
use std::rc::Rc;
use strum_macros::{AsRefStr, Display};

slotmap::new_key_type! {
    /// A mesh living in the backend's scene.
    pub struct MeshId;
}

/// Geometry a handle can ask the backend for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    /// Edges of a unit cube, scaled per draw.
    WireframeBox,
    /// A solid box with the given extents.
    Box { size: Vec3 },
}

/// Flat color material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: Srgb,
    pub opacity: f32,
}

impl Material {
    pub fn new(color: Srgb, opacity: f32) -> Self {
        Self { color, opacity }
    }
}

/// Cursor shown over the render surface. Strings are CSS cursor names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, AsRefStr, Display)]
pub enum CursorStyle {
    #[default]
    #[strum(serialize = "default")]
    Default,
    #[strum(serialize = "nwse-resize")]
    NwseResize,
    #[strum(serialize = "nesw-resize")]
    NeswResize,
    #[strum(serialize = "ns-resize")]
    NsResize,
    #[strum(serialize = "ew-resize")]
    EwResize,
}

pub trait RenderBackend {
    fn add_mesh(&mut self, primitive: Primitive, material: Material) -> MeshId;

    /// Removes the mesh from the scene and releases its geometry and material.
    fn remove_mesh(&mut self, mesh: MeshId);

    fn set_transform(&mut self, mesh: MeshId, translation: Vec3, scale: Vec3);

    fn set_material(&mut self, mesh: MeshId, material: Material);

    fn set_cursor(&mut self, cursor: CursorStyle);
}

/// One mesh as recorded by [`HeadlessBackend`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshRecord {
    pub primitive: Primitive,
    pub material: Material,
    pub translation: Vec3,
    pub scale: Vec3,
}

#[derive(Debug, Default)]
struct HeadlessScene {
    meshes: SlotMap<MeshId, MeshRecord>,
    cursor: CursorStyle,
    created: usize,
    released: usize,
}

/// In-memory backend with no GPU behind it.
///
/// Clones share one scene, so a caller can keep a clone for inspection while
/// the layer owns another.
#[derive(Clone, Debug, Default)]
pub struct HeadlessBackend {
    scene: Rc<RefCell<HeadlessScene>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(&self, mesh: MeshId) -> Option<MeshRecord> {
        self.scene.borrow().meshes.get(mesh).copied()
    }

    pub fn meshes(&self) -> Vec<(MeshId, MeshRecord)> {
        self.scene
            .borrow()
            .meshes
            .iter()
            .map(|(id, record)| (id, *record))
            .collect()
    }

    /// Meshes currently in the scene.
    pub fn live_meshes(&self) -> usize {
        self.scene.borrow().meshes.len()
    }

    /// Meshes ever added.
    pub fn created_meshes(&self) -> usize {
        self.scene.borrow().created
    }

    /// Meshes removed and released.
    pub fn released_meshes(&self) -> usize {
        self.scene.borrow().released
    }

    pub fn cursor(&self) -> CursorStyle {
        self.scene.borrow().cursor
    }
}

impl RenderBackend for HeadlessBackend {
    fn add_mesh(&mut self, primitive: Primitive, material: Material) -> MeshId {
        let mut scene = self.scene.borrow_mut();
        scene.created += 1;
        scene.meshes.insert(MeshRecord {
            primitive,
            material,
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
        })
    }

    fn remove_mesh(&mut self, mesh: MeshId) {
        let mut scene = self.scene.borrow_mut();
        if scene.meshes.remove(mesh).is_some() {
            scene.released += 1;
        }
    }

    fn set_transform(&mut self, mesh: MeshId, translation: Vec3, scale: Vec3) {
        if let Some(record) = self.scene.borrow_mut().meshes.get_mut(mesh) {
            record.translation = translation;
            record.scale = scale;
        }
    }

    fn set_material(&mut self, mesh: MeshId, material: Material) {
        if let Some(record) = self.scene.borrow_mut().meshes.get_mut(mesh) {
            record.material = material;
        }
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.scene.borrow_mut().cursor = cursor;
    }
}
