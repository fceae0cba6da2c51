//! The handle abstraction: an interactive affordance bound to one layer.
//!
//! Every handle runs the same lifecycle. A trigger synchronously moves the
//! handle into [`HandleState::Entering`] or [`HandleState::Exiting`], draws it
//! once, then hands over to the variant. Variants that animate keep running
//! through [`Handle::on_frame`] until they finish or their token is cancelled;
//! either way the handle ends up back in [`HandleState::Default`].

use geometry::Bounds;
use glam::Vec2;
use std::time::Duration;

use crate::backend::RenderBackend;
use crate::cancel::CancellationToken;
use crate::frame::FrameHandle;
use crate::resize::ResizeHandle;
use crate::scheduler::FrameScheduler;

slotmap::new_key_type! {
    /// Identifies a handle within its layer.
    pub struct HandleId;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HandleState {
    #[default]
    Default,
    Entering,
    Exiting,
}

/// Outcome of one step of a handle transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Waiting for a future frame.
    Running,
    Finished,
    Cancelled,
}

impl Progress {
    pub fn is_done(&self) -> bool {
        !matches!(self, Progress::Running)
    }

    /// Combines the outcomes of several handles triggered together.
    pub fn merge(self, other: Progress) -> Progress {
        match (self, other) {
            (Progress::Running, _) | (_, Progress::Running) => Progress::Running,
            (Progress::Cancelled, _) | (_, Progress::Cancelled) => Progress::Cancelled,
            _ => Progress::Finished,
        }
    }
}

/// What a handle can see of its layer while it runs.
pub struct HandleContext<'a> {
    /// The handle being driven, for frame requests targeting itself
    pub id: HandleId,
    /// World-space centre of the layer
    pub position: Vec2,
    pub size: Vec2,
    /// Layer clock
    pub now: Duration,
    pub scheduler: &'a FrameScheduler,
    backend: Option<&'a mut (dyn RenderBackend + 'static)>,
    camera_ready: bool,
}

impl<'a> HandleContext<'a> {
    pub fn new(
        id: HandleId,
        position: Vec2,
        size: Vec2,
        now: Duration,
        scheduler: &'a FrameScheduler,
        backend: Option<&'a mut (dyn RenderBackend + 'static)>,
        camera_ready: bool,
    ) -> Self {
        Self {
            id,
            position,
            size,
            now,
            scheduler,
            backend,
            camera_ready,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_center_size(self.position, self.size)
    }

    /// The backend, but only once the scene can actually be drawn.
    pub fn renderer(&mut self) -> Option<&mut (dyn RenderBackend + 'static)> {
        if self.camera_ready {
            self.backend.as_deref_mut()
        } else {
            None
        }
    }

    /// The backend regardless of camera, for releasing resources and
    /// surface state such as the cursor.
    pub fn backend(&mut self) -> Option<&mut (dyn RenderBackend + 'static)> {
        self.backend.as_deref_mut()
    }
}

/// Capabilities shared by every handle variant.
pub trait Handle {
    fn state(&self) -> HandleState;

    fn set_state(&mut self, state: HandleState);

    /// Re-renders the handle. Idempotent, and a no-op while the layer has no
    /// renderer or camera.
    fn draw(&mut self, cx: &mut HandleContext<'_>);

    /// Variant behavior after the entry draw.
    fn on_entered(&mut self, _cx: &mut HandleContext<'_>, _token: CancellationToken) -> Progress {
        Progress::Finished
    }

    /// Variant behavior after the exit draw.
    fn on_exited(&mut self, _cx: &mut HandleContext<'_>, _token: CancellationToken) -> Progress {
        Progress::Finished
    }

    /// A frame requested by this handle is due. `None` when nothing was in flight.
    fn on_frame(&mut self, _cx: &mut HandleContext<'_>) -> Option<Progress> {
        None
    }

    /// Finishes a transition whose token was cancelled while it waited for a
    /// frame. `None` when there was nothing to settle.
    fn settle(&mut self, _cx: &mut HandleContext<'_>) -> Option<Progress> {
        None
    }

    /// Releases every backend resource. Safe to call repeatedly.
    fn dispose(&mut self, cx: &mut HandleContext<'_>);

    fn trigger_entered(&mut self, cx: &mut HandleContext<'_>, token: CancellationToken) -> Progress {
        self.set_state(HandleState::Entering);
        self.draw(cx);
        let progress = self.on_entered(cx, token);
        if progress.is_done() {
            self.set_state(HandleState::Default);
        }
        progress
    }

    fn trigger_exited(&mut self, cx: &mut HandleContext<'_>, token: CancellationToken) -> Progress {
        self.set_state(HandleState::Exiting);
        self.draw(cx);
        let progress = self.on_exited(cx, token);
        if progress.is_done() {
            self.set_state(HandleState::Default);
        }
        progress
    }

    /// Runs a due frame and returns to the default state once done.
    fn advance(&mut self, cx: &mut HandleContext<'_>) -> Option<Progress> {
        let progress = self.on_frame(cx)?;
        if progress.is_done() {
            self.set_state(HandleState::Default);
        }
        Some(progress)
    }

    /// Settles a cancelled transition and returns to the default state.
    fn reconcile(&mut self, cx: &mut HandleContext<'_>) -> Option<Progress> {
        let progress = self.settle(cx)?;
        self.set_state(HandleState::Default);
        Some(progress)
    }
}

/// The closed set of handle variants a layer can hold.
#[derive(Debug)]
pub enum AnyHandle {
    Frame(FrameHandle),
    Resize(ResizeHandle),
}

impl AnyHandle {
    pub fn as_frame(&self) -> Option<&FrameHandle> {
        match self {
            AnyHandle::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_resize(&self) -> Option<&ResizeHandle> {
        match self {
            AnyHandle::Resize(resize) => Some(resize),
            _ => None,
        }
    }

    pub fn as_resize_mut(&mut self) -> Option<&mut ResizeHandle> {
        match self {
            AnyHandle::Resize(resize) => Some(resize),
            _ => None,
        }
    }

    pub fn is_resize(&self) -> bool {
        matches!(self, AnyHandle::Resize(_))
    }

    fn inner_mut(&mut self) -> &mut dyn Handle {
        match self {
            AnyHandle::Frame(frame) => frame,
            AnyHandle::Resize(resize) => resize,
        }
    }

    fn inner(&self) -> &dyn Handle {
        match self {
            AnyHandle::Frame(frame) => frame,
            AnyHandle::Resize(resize) => resize,
        }
    }
}

impl Handle for AnyHandle {
    fn state(&self) -> HandleState {
        self.inner().state()
    }

    fn set_state(&mut self, state: HandleState) {
        self.inner_mut().set_state(state)
    }

    fn draw(&mut self, cx: &mut HandleContext<'_>) {
        self.inner_mut().draw(cx)
    }

    fn on_entered(&mut self, cx: &mut HandleContext<'_>, token: CancellationToken) -> Progress {
        self.inner_mut().on_entered(cx, token)
    }

    fn on_exited(&mut self, cx: &mut HandleContext<'_>, token: CancellationToken) -> Progress {
        self.inner_mut().on_exited(cx, token)
    }

    fn on_frame(&mut self, cx: &mut HandleContext<'_>) -> Option<Progress> {
        self.inner_mut().on_frame(cx)
    }

    fn settle(&mut self, cx: &mut HandleContext<'_>) -> Option<Progress> {
        self.inner_mut().settle(cx)
    }

    fn dispose(&mut self, cx: &mut HandleContext<'_>) {
        self.inner_mut().dispose(cx)
    }
}

impl From<FrameHandle> for AnyHandle {
    fn from(handle: FrameHandle) -> Self {
        AnyHandle::Frame(handle)
    }
}

impl From<ResizeHandle> for AnyHandle {
    fn from(handle: ResizeHandle) -> Self {
        AnyHandle::Resize(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_merge() {
        use Progress::*;
        assert_eq!(Finished.merge(Finished), Finished);
        assert_eq!(Finished.merge(Running), Running);
        assert_eq!(Cancelled.merge(Finished), Cancelled);
        assert_eq!(Cancelled.merge(Running), Running);
        assert!(Cancelled.is_done());
        assert!(!Running.is_done());
    }
}
