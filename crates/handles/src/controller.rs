//! Routes raw pointer input to a layer and its handles.
//!
//! The controller is the only component that decides when handles enter or
//! exit and when a resize drag begins or ends. It holds the cancellation
//! tokens of the transitions it started, so a fast in/out/in sequence always
//! cancels the previous transition before issuing the next.

use geometry::{ScreenPoint, Unprojector, Viewport};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cancel::CancellationToken;
use crate::grip::Grip;
use crate::handle::HandleId;
use crate::layer::Layer;
use crate::policy::ResizeResult;

pub type PointerId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

/// One pointer sample in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub screen: ScreenPoint,
    /// Button that changed, for down and up events
    #[serde(default)]
    pub button: Option<PointerButton>,
    #[serde(default)]
    pub pointer_id: PointerId,
}

impl PointerEvent {
    pub fn new(screen: impl Into<ScreenPoint>) -> Self {
        Self {
            screen: screen.into(),
            button: None,
            pointer_id: 0,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_pointer(mut self, pointer_id: PointerId) -> Self {
        self.pointer_id = pointer_id;
        self
    }
}

/// The kind of pointer input being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerAction {
    Move,
    Down,
    Up,
    Cancel,
    Leave,
}

/// What a controller call did to the layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerEvent {
    BoundsEntered,
    BoundsExited,
    DragStarted { handle: HandleId, grip: Grip },
    Resized(ResizeResult),
    DragEnded { handle: HandleId },
}

pub type ControllerEvents = SmallVec<[ControllerEvent; 2]>;

#[derive(Debug, Default)]
pub struct PointerController {
    viewport: Viewport,
    unprojector: Unprojector,
    over_layer: bool,
    /// Resize handle owning the current drag
    drag: Option<HandleId>,
    captured: Option<PointerId>,
    entered_token: Option<CancellationToken>,
    exited_token: Option<CancellationToken>,
    last_world: Option<Vec2>,
}

impl PointerController {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn with_unprojector(mut self, unprojector: Unprojector) -> Self {
        self.unprojector = unprojector;
        self
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Call when the render surface changes size.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn is_over_layer(&self) -> bool {
        self.over_layer
    }

    pub fn dragging(&self) -> Option<HandleId> {
        self.drag
    }

    pub fn captured_pointer(&self) -> Option<PointerId> {
        self.captured
    }

    /// World position of the most recent accepted move.
    pub fn last_world(&self) -> Option<Vec2> {
        self.last_world
    }

    /// Maps a surface position onto the layer plane.
    ///
    /// `None` when the layer has no camera, the viewport is empty or the ray
    /// misses the plane.
    pub fn world_position(&self, layer: &Layer, screen: ScreenPoint) -> Option<Vec2> {
        let camera = layer.camera()?;
        let ndc = self.viewport.screen_to_ndc(screen)?;
        self.unprojector
            .unproject(camera, ndc)
            .map(|world| world.truncate())
    }

    pub fn dispatch(&mut self, layer: &mut Layer, action: PointerAction, event: PointerEvent) -> ControllerEvents {
        match action {
            PointerAction::Move => self.pointer_move(layer, event),
            PointerAction::Down => self.pointer_down(layer, event),
            PointerAction::Up => self.pointer_up(layer, event),
            PointerAction::Cancel => self.pointer_cancel(layer, event),
            PointerAction::Leave => self.pointer_leave(layer, event),
        }
    }

    pub fn pointer_move(&mut self, layer: &mut Layer, event: PointerEvent) -> ControllerEvents {
        let mut events = ControllerEvents::new();
        if !self.accepts(&event) {
            return events;
        }
        let Some(world) = self.world_position(layer, event.screen) else {
            tracing::trace!(screen = ?event.screen, "pointer move skipped, no world position");
            return events;
        };
        self.last_world = Some(world);

        if let Some(handle) = self.drag {
            events.extend(layer.drag_to(handle, world).map(ControllerEvent::Resized));
            return events;
        }

        layer.update_hover(world);
        let inside = layer.bounds().contains_point(world);
        if inside && !self.over_layer {
            self.over_layer = true;
            self.enter(layer);
            events.push(ControllerEvent::BoundsEntered);
        } else if !inside && self.over_layer {
            self.over_layer = false;
            self.exit(layer);
            events.push(ControllerEvent::BoundsExited);
        }
        events
    }

    pub fn pointer_down(&mut self, layer: &mut Layer, event: PointerEvent) -> ControllerEvents {
        let mut events = ControllerEvents::new();
        if !self.accepts(&event) || self.drag.is_some() {
            return events;
        }
        if !matches!(event.button, None | Some(PointerButton::Primary)) {
            return events;
        }
        let Some(world) = self.world_position(layer, event.screen) else {
            return events;
        };

        if let Some((handle, grip)) = layer.begin_drag(world) {
            self.drag = Some(handle);
            self.captured = Some(event.pointer_id);
            tracing::debug!(?handle, %grip, pointer = event.pointer_id, "pointer captured");
            events.push(ControllerEvent::DragStarted { handle, grip });
        }
        events
    }

    pub fn pointer_up(&mut self, layer: &mut Layer, event: PointerEvent) -> ControllerEvents {
        let world = self.world_position(layer, event.screen);
        self.release(layer, &event, world)
    }

    pub fn pointer_cancel(&mut self, layer: &mut Layer, event: PointerEvent) -> ControllerEvents {
        self.release(layer, &event, None)
    }

    /// Pointer left the surface. Only ends a drag; a hover stays as it was.
    pub fn pointer_leave(&mut self, layer: &mut Layer, event: PointerEvent) -> ControllerEvents {
        self.release(layer, &event, None)
    }

    /// Cancels outstanding transitions and releases everything the layer
    /// holds in the backend. Call once when the layer goes away.
    pub fn teardown(&mut self, layer: &mut Layer) {
        for token in [self.entered_token.take(), self.exited_token.take()]
            .into_iter()
            .flatten()
        {
            token.cancel();
        }
        layer.settle_cancelled();

        if let Some(handle) = self.drag.take() {
            layer.end_drag(handle, None);
        }
        self.captured = None;
        self.over_layer = false;

        layer.dispose_handles();
        layer.release_backend();
        tracing::debug!(layer = %layer.id(), "controller torn down");
    }

    fn accepts(&self, event: &PointerEvent) -> bool {
        let accepted = self.captured.map_or(true, |pointer| pointer == event.pointer_id);
        if !accepted {
            tracing::trace!(pointer = event.pointer_id, "event from uncaptured pointer ignored");
        }
        accepted
    }

    fn release(&mut self, layer: &mut Layer, event: &PointerEvent, world: Option<Vec2>) -> ControllerEvents {
        let mut events = ControllerEvents::new();
        if !self.accepts(event) {
            return events;
        }
        let Some(handle) = self.drag.take() else {
            return events;
        };

        layer.end_drag(handle, world);
        self.captured = None;
        tracing::debug!(?handle, "pointer released");
        events.push(ControllerEvent::DragEnded { handle });
        events
    }

    fn enter(&mut self, layer: &mut Layer) {
        if let Some(token) = self.exited_token.take() {
            token.cancel();
        }
        let token = CancellationToken::new();
        layer.trigger_entered(&token);
        self.entered_token = Some(token);
        layer.draw_resize_handles();
    }

    fn exit(&mut self, layer: &mut Layer) {
        if let Some(token) = self.entered_token.take() {
            token.cancel();
        }
        let token = CancellationToken::new();
        layer.trigger_exited(&token);
        self.exited_token = Some(token);
    }
}
