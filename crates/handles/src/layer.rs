//! A layer owns its handles, their rendering context and the frame clock that
//! drives their transitions.

use geometry::{Bounds, Camera};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use smallvec::SmallVec;
use std::fmt;
use std::time::Duration;

use crate::backend::RenderBackend;
use crate::cancel::CancellationToken;
use crate::config::HandleConfig;
use crate::frame::FrameHandle;
use crate::grip::Grip;
use crate::handle::{AnyHandle, Handle, HandleContext, HandleId, Progress};
use crate::policy::ResizeResult;
use crate::resize::ResizeHandle;
use crate::scheduler::FrameScheduler;

/// Unique identifier for a layer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(uuid::Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create a LayerId from a u128 (useful for tests).
    pub fn from_u128(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LayerId({})", &self.0.to_string()[..8])
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Who writes the layer position when a resize moves it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionOwner {
    /// Drags update the stored position directly.
    #[default]
    Layer,
    /// Drags only report the new position; the integration calls
    /// [`Layer::set_position`] itself.
    External,
}

/// A handle transition that ended during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEnd {
    pub handle: HandleId,
    pub progress: Progress,
}

pub struct Layer {
    id: LayerId,
    size: Vec2,
    /// World-space centre
    position: Vec2,
    position_owner: PositionOwner,
    handles: SlotMap<HandleId, AnyHandle>,
    /// Insertion order, which is also draw and hit-test order
    draw_order: SmallVec<[HandleId; 4]>,
    backend: Option<Box<dyn RenderBackend>>,
    camera: Option<Camera>,
    scheduler: FrameScheduler,
    /// Timestamp of the latest tick
    now: Duration,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("position", &self.position)
            .field("handles", &self.draw_order.len())
            .field("has_backend", &self.backend.is_some())
            .field("has_camera", &self.camera.is_some())
            .finish_non_exhaustive()
    }
}

impl Layer {
    pub fn new(size: Vec2) -> Self {
        Self {
            id: LayerId::new(),
            size,
            position: Vec2::ZERO,
            position_owner: PositionOwner::default(),
            handles: SlotMap::with_key(),
            draw_order: SmallVec::new(),
            backend: None,
            camera: None,
            scheduler: FrameScheduler::new(),
            now: Duration::ZERO,
        }
    }

    /// A layer with the standard frame and resize handles attached.
    pub fn from_config(size: Vec2, config: &HandleConfig) -> Self {
        let mut layer = Self::new(size).with_position_owner(config.position_owner);
        layer.add_handle(FrameHandle::from_config(&config.frame));
        layer.add_handle(ResizeHandle::from_config(config));
        layer
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_position_owner(mut self, owner: PositionOwner) -> Self {
        self.position_owner = owner;
        self
    }

    pub fn with_backend(mut self, backend: impl RenderBackend + 'static) -> Self {
        self.set_backend(Box::new(backend));
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn position_owner(&self) -> PositionOwner {
        self.position_owner
    }

    /// World-space extent of the layer.
    pub fn bounds(&self) -> Bounds {
        Bounds::from_center_size(self.position, self.size)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Moves the layer and redraws its handles.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.draw();
    }

    pub fn set_backend(&mut self, backend: Box<dyn RenderBackend>) {
        self.backend = Some(backend);
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// Detaches the backend. Handles stop drawing until a new one is set.
    pub fn release_backend(&mut self) -> Option<Box<dyn RenderBackend>> {
        self.backend.take()
    }

    pub fn set_camera(&mut self, camera: Option<Camera>) {
        self.camera = camera;
    }

    pub fn add_handle(&mut self, handle: impl Into<AnyHandle>) -> HandleId {
        let id = self.handles.insert(handle.into());
        self.draw_order.push(id);
        self.draw_handle(id);
        id
    }

    /// Detaches a handle after releasing its meshes.
    pub fn remove_handle(&mut self, id: HandleId) -> Option<AnyHandle> {
        self.with_handle(id, |handle, cx| handle.dispose(cx))?;
        self.draw_order.retain(|candidate| *candidate != id);
        self.handles.remove(id)
    }

    pub fn handle(&self, id: HandleId) -> Option<&AnyHandle> {
        self.handles.get(id)
    }

    pub fn handle_ids(&self) -> impl Iterator<Item = HandleId> + '_ {
        self.draw_order.iter().copied()
    }

    /// Resize handles in draw order.
    pub fn resize_handles(&self) -> SmallVec<[HandleId; 4]> {
        self.draw_order
            .iter()
            .copied()
            .filter(|id| self.handles.get(*id).is_some_and(AnyHandle::is_resize))
            .collect()
    }

    pub fn frame_handles(&self) -> SmallVec<[HandleId; 4]> {
        self.draw_order
            .iter()
            .copied()
            .filter(|id| self.handles.get(*id).is_some_and(|handle| handle.as_frame().is_some()))
            .collect()
    }

    /// Redraws every handle in draw order.
    pub fn draw(&mut self) {
        for id in self.draw_order.clone() {
            self.draw_handle(id);
        }
    }

    pub fn draw_handle(&mut self, id: HandleId) {
        self.with_handle(id, |handle, cx| handle.draw(cx));
    }

    pub fn draw_resize_handles(&mut self) {
        for id in self.resize_handles() {
            self.draw_handle(id);
        }
    }

    /// Starts the entry behaviour of every handle.
    pub fn trigger_entered(&mut self, token: &CancellationToken) -> Progress {
        self.settle_cancelled();
        tracing::debug!(layer = %self.id, "handles entering");
        let mut progress = Progress::Finished;
        for id in self.draw_order.clone() {
            let token = token.clone();
            if let Some(step) = self.with_handle(id, |handle, cx| handle.trigger_entered(cx, token)) {
                progress = progress.merge(step);
            }
        }
        progress
    }

    /// Starts the exit behaviour of every handle.
    pub fn trigger_exited(&mut self, token: &CancellationToken) -> Progress {
        self.settle_cancelled();
        tracing::debug!(layer = %self.id, "handles exiting");
        let mut progress = Progress::Finished;
        for id in self.draw_order.clone() {
            let token = token.clone();
            if let Some(step) = self.with_handle(id, |handle, cx| handle.trigger_exited(cx, token)) {
                progress = progress.merge(step);
            }
        }
        progress
    }

    /// Applies terminal cleanup for transitions whose token was cancelled.
    pub fn settle_cancelled(&mut self) -> SmallVec<[TransitionEnd; 4]> {
        let mut ended = SmallVec::new();
        for id in self.draw_order.clone() {
            if let Some(Some(progress)) = self.with_handle(id, |handle, cx| handle.reconcile(cx)) {
                ended.push(TransitionEnd { handle: id, progress });
            }
        }
        ended
    }

    /// Advances the layer clock to `now` and runs every frame request that is due.
    ///
    /// Returns the transitions that finished or were cancelled on this tick.
    pub fn tick(&mut self, now: Duration) -> Vec<TransitionEnd> {
        self.now = self.now.max(now);
        let mut ended: Vec<TransitionEnd> = self.settle_cancelled().into_vec();

        for id in self.scheduler.take_due() {
            match self.with_handle(id, |handle, cx| handle.advance(cx)) {
                Some(Some(progress)) if progress.is_done() => {
                    ended.push(TransitionEnd { handle: id, progress });
                }
                Some(_) => {}
                None => tracing::trace!(?id, "frame for removed handle dropped"),
            }
        }
        ended
    }

    /// Whether any handle still has a frame pending.
    pub fn is_animating(&self) -> bool {
        self.scheduler.pending_len() > 0
    }

    pub fn update_hover(&mut self, world: Vec2) {
        for id in self.resize_handles() {
            self.with_handle(id, |handle, cx| {
                if let Some(resize) = handle.as_resize_mut() {
                    resize.update_hover(cx, world);
                }
            });
        }
    }

    /// Starts a drag on the first resize handle, in draw order, with a grip
    /// under `world`.
    pub fn begin_drag(&mut self, world: Vec2) -> Option<(HandleId, Grip)> {
        for id in self.resize_handles() {
            let grip = self.with_handle(id, |handle, cx| {
                let resize = handle.as_resize_mut()?;
                if resize.start_drag(cx, world) {
                    resize.active_grip()
                } else {
                    None
                }
            });
            if let Some(Some(grip)) = grip {
                return Some((id, grip));
            }
        }
        None
    }

    /// Applies the drag position to the layer and redraws every handle.
    pub fn drag_to(&mut self, id: HandleId, world: Vec2) -> Option<ResizeResult> {
        let result = match self.handles.get(id)? {
            AnyHandle::Resize(resize) => resize.on_drag(world)?,
            _ => {
                tracing::warn!(?id, "drag forwarded to a handle that cannot resize");
                return None;
            }
        };

        self.size = result.size;
        if self.position_owner == PositionOwner::Layer {
            self.position = result.position;
        }
        tracing::trace!(size = ?result.size, position = ?result.position, "layer resized");
        self.draw();
        Some(result)
    }

    pub fn end_drag(&mut self, id: HandleId, world: Option<Vec2>) -> bool {
        self.with_handle(id, |handle, cx| {
            handle
                .as_resize_mut()
                .is_some_and(|resize| resize.end_drag(cx, world))
        })
        .unwrap_or(false)
    }

    /// Releases every handle's meshes. The handles stay attached.
    pub fn dispose_handles(&mut self) {
        for id in self.draw_order.clone() {
            self.with_handle(id, |handle, cx| handle.dispose(cx));
        }
    }

    fn with_handle<R>(
        &mut self,
        id: HandleId,
        f: impl FnOnce(&mut AnyHandle, &mut HandleContext<'_>) -> R,
    ) -> Option<R> {
        let handle = self.handles.get_mut(id)?;
        let mut cx = HandleContext::new(
            id,
            self.position,
            self.size,
            self.now,
            &self.scheduler,
            self.backend.as_deref_mut(),
            self.camera.is_some(),
        );
        Some(f(handle, &mut cx))
    }
}

impl Drop for Layer {
    fn drop(&mut self) {
        self.dispose_handles();
    }
}
