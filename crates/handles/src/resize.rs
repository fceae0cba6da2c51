//! Resize grips around a layer: hover feedback, hit testing and drag sessions.

use geometry::Bounds;
use glam::{Vec2, Vec3};
use palette::Srgb;
use smallvec::SmallVec;

use crate::backend::{CursorStyle, Material, MeshId, Primitive};
use crate::config::HandleConfig;
use crate::grip::{Grip, GripSet};
use crate::handle::{Handle, HandleContext, HandleState};
use crate::policy::{ResizeOperation, ResizePolicy, ResizeResult};

/// Markers sit just in front of the layer plane.
const MARKER_DEPTH: f32 = 0.01;
const MARKER_THICKNESS: f32 = 0.1;

/// Look of the grip markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GripStyle {
    /// Edge length in world units
    pub size: f32,
    pub hit_padding: f32,
    pub color: Srgb,
    pub hover_color: Srgb,
    /// Color of the grip being dragged
    pub active_color: Srgb,
    pub opacity: f32,
}

impl Default for GripStyle {
    fn default() -> Self {
        Self {
            size: 0.15,
            hit_padding: 0.05,
            color: Srgb::new(1.0, 1.0, 1.0),
            hover_color: Srgb::new(0.0, 170.0 / 255.0, 1.0),
            active_color: Srgb::new(1.0, 1.0, 0.0),
            opacity: 0.8,
        }
    }
}

impl GripStyle {
    /// Distance from a grip anchor within which the pointer hits it.
    pub fn hit_radius(&self) -> f32 {
        self.size * 0.5 + self.hit_padding
    }
}

#[derive(Debug, Clone)]
struct DragSession {
    operation: ResizeOperation,
    /// World position of the pointer at drag start
    start: Vec2,
}

/// Grips on a layer's corners and edges that resize it when dragged.
#[derive(Debug)]
pub struct ResizeHandle {
    state: HandleState,
    grips: GripSet,
    policy: ResizePolicy,
    min_size: f32,
    style: GripStyle,
    markers: SmallVec<[(Grip, MeshId); 8]>,
    hovered: Option<Grip>,
    drag: Option<DragSession>,
}

impl Default for ResizeHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizeHandle {
    pub fn new() -> Self {
        let policy = ResizePolicy::default();
        Self {
            state: HandleState::Default,
            grips: GripSet::default(),
            policy,
            min_size: policy.default_min_size(),
            style: GripStyle::default(),
            markers: SmallVec::new(),
            hovered: None,
            drag: None,
        }
    }

    pub fn from_config(config: &HandleConfig) -> Self {
        let grips = &config.grips;
        Self::new()
            .with_grips(grips.set)
            .with_policy(config.resize.policy)
            .with_min_size(config.resize.min_size())
            .with_style(GripStyle {
                size: grips.size,
                hit_padding: grips.hit_padding,
                color: grips.color.into_format(),
                hover_color: grips.hover_color.into_format(),
                active_color: grips.active_color.into_format(),
                opacity: grips.opacity,
            })
    }

    pub fn with_grips(mut self, grips: GripSet) -> Self {
        self.grips = grips;
        self
    }

    /// Sets the policy and its default minimum size.
    pub fn with_policy(mut self, policy: ResizePolicy) -> Self {
        self.policy = policy;
        self.min_size = policy.default_min_size();
        self
    }

    pub fn with_min_size(mut self, min_size: f32) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn with_style(mut self, style: GripStyle) -> Self {
        self.style = style;
        self
    }

    pub fn policy(&self) -> ResizePolicy {
        self.policy
    }

    pub fn min_size(&self) -> f32 {
        self.min_size
    }

    pub fn style(&self) -> &GripStyle {
        &self.style
    }

    pub fn grips(&self) -> GripSet {
        self.grips
    }

    pub fn hovered(&self) -> Option<Grip> {
        self.hovered
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The grip being dragged, if any.
    pub fn active_grip(&self) -> Option<Grip> {
        self.drag.as_ref().map(|session| session.operation.grip)
    }

    pub fn marker(&self, grip: Grip) -> Option<MeshId> {
        self.markers
            .iter()
            .find(|(candidate, _)| *candidate == grip)
            .map(|(_, mesh)| *mesh)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// The grip nearest to `world` within the hit radius, edge included.
    pub fn hit_test(&self, bounds: &Bounds, world: Vec2) -> Option<Grip> {
        let radius = self.style.hit_radius();
        self.grips
            .grips()
            .map(|grip| (grip, grip.anchor(bounds).distance(world)))
            .filter(|(_, distance)| *distance <= radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(grip, _)| grip)
    }

    /// Tracks which grip is under the pointer. Frozen while a drag is active.
    pub fn update_hover(&mut self, cx: &mut HandleContext<'_>, world: Vec2) {
        if self.drag.is_some() {
            return;
        }
        let hit = self.hit_test(&cx.bounds(), world);
        if hit == self.hovered {
            return;
        }

        tracing::trace!(from = ?self.hovered, to = ?hit, "grip hover changed");
        self.hovered = hit;
        self.recolor(cx);
        self.apply_cursor(cx);
    }

    /// Starts a drag if `world` hits a grip. Returns false, changing nothing,
    /// on a miss.
    pub fn start_drag(&mut self, cx: &mut HandleContext<'_>, world: Vec2) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let Some(grip) = self.hit_test(&cx.bounds(), world) else {
            return false;
        };

        let operation = ResizeOperation::new(grip, cx.position, cx.size)
            .with_policy(self.policy)
            .with_min_size(self.min_size);
        self.drag = Some(DragSession {
            operation,
            start: world,
        });
        self.hovered = Some(grip);
        self.recolor(cx);
        self.apply_cursor(cx);

        tracing::debug!(%grip, policy = ?self.policy, "resize drag started");
        true
    }

    /// The size and position for the pointer at `world`, relative to the
    /// snapshot taken at drag start.
    pub fn on_drag(&self, world: Vec2) -> Option<ResizeResult> {
        let session = self.drag.as_ref()?;
        Some(session.operation.apply(world - session.start))
    }

    /// Ends the drag. Hover is re-evaluated at `world` when the pointer
    /// position is known, otherwise cleared.
    pub fn end_drag(&mut self, cx: &mut HandleContext<'_>, world: Option<Vec2>) -> bool {
        let Some(session) = self.drag.take() else {
            return false;
        };

        let bounds = cx.bounds();
        self.hovered = world.and_then(|world| self.hit_test(&bounds, world));
        self.recolor(cx);
        self.apply_cursor(cx);

        tracing::debug!(grip = %session.operation.grip, "resize drag ended");
        true
    }

    fn color_for(&self, grip: Grip) -> Srgb {
        if self.active_grip() == Some(grip) {
            self.style.active_color
        } else if self.hovered == Some(grip) {
            self.style.hover_color
        } else {
            self.style.color
        }
    }

    fn recolor(&mut self, cx: &mut HandleContext<'_>) {
        let materials: SmallVec<[(MeshId, Material); 8]> = self
            .markers
            .iter()
            .map(|(grip, mesh)| (*mesh, Material::new(self.color_for(*grip), self.style.opacity)))
            .collect();
        let Some(renderer) = cx.renderer() else {
            return;
        };
        for (mesh, material) in materials {
            renderer.set_material(mesh, material);
        }
    }

    fn apply_cursor(&self, cx: &mut HandleContext<'_>) {
        let cursor = self
            .hovered
            .map(|grip| grip.cursor())
            .unwrap_or(CursorStyle::Default);
        if let Some(backend) = cx.backend() {
            backend.set_cursor(cursor);
        }
    }
}

impl Handle for ResizeHandle {
    fn state(&self) -> HandleState {
        self.state
    }

    fn set_state(&mut self, state: HandleState) {
        self.state = state;
    }

    fn draw(&mut self, cx: &mut HandleContext<'_>) {
        let bounds = cx.bounds();
        let placements: SmallVec<[(Grip, Vec2, Material); 8]> = self
            .grips
            .grips()
            .map(|grip| {
                let material = Material::new(self.color_for(grip), self.style.opacity);
                (grip, grip.anchor(&bounds), material)
            })
            .collect();
        let marker_size = Vec3::new(self.style.size, self.style.size, MARKER_THICKNESS);

        let Some(renderer) = cx.renderer() else {
            return;
        };
        for (grip, anchor, material) in placements {
            let mesh = match self.marker(grip) {
                Some(mesh) => mesh,
                None => {
                    let mesh = renderer.add_mesh(Primitive::Box { size: marker_size }, material);
                    self.markers.push((grip, mesh));
                    mesh
                }
            };
            renderer.set_transform(mesh, anchor.extend(MARKER_DEPTH), Vec3::ONE);
            renderer.set_material(mesh, material);
        }
    }

    fn dispose(&mut self, cx: &mut HandleContext<'_>) {
        self.drag = None;
        self.hovered = None;
        if self.markers.is_empty() {
            return;
        }
        if let Some(backend) = cx.backend() {
            for (_, mesh) in &self.markers {
                backend.remove_mesh(*mesh);
            }
        }
        tracing::debug!(markers = self.markers.len(), "resize handle disposed");
        self.markers.clear();
    }
}
