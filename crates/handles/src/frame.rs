//! Highlight frame drawn around a layer while the pointer is over it.

use palette::Srgb;
use std::time::Duration;

use crate::animation::{OpacityAnimation, DEFAULT_TRANSITION};
use crate::backend::{Material, MeshId, Primitive};
use crate::cancel::CancellationToken;
use crate::config::FrameConfig;
use crate::handle::{Handle, HandleContext, HandleState, Progress};
use crate::scheduler::FrameRequestId;

pub const DEFAULT_FRAME_COLOR: Srgb = Srgb::new(0.0, 1.0, 0.0);

#[derive(Debug)]
struct Transition {
    animation: OpacityAnimation,
    token: CancellationToken,
    exiting: bool,
    pending: Option<FrameRequestId>,
}

/// A wireframe box matching the layer extent that fades in on entry and out
/// on exit.
#[derive(Debug)]
pub struct FrameHandle {
    state: HandleState,
    opacity: f32,
    color: Srgb,
    duration: Duration,
    wireframe: Option<MeshId>,
    transition: Option<Transition>,
}

impl Default for FrameHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHandle {
    pub fn new() -> Self {
        Self {
            state: HandleState::Default,
            opacity: 0.0,
            color: DEFAULT_FRAME_COLOR,
            duration: DEFAULT_TRANSITION,
            wireframe: None,
            transition: None,
        }
    }

    pub fn from_config(config: &FrameConfig) -> Self {
        Self::new()
            .with_duration(config.duration())
            .with_color(config.color.into_format())
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_color(mut self, color: Srgb) -> Self {
        self.color = color;
        self
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn color(&self) -> Srgb {
        self.color
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn wireframe(&self) -> Option<MeshId> {
        self.wireframe
    }

    /// Starts a fade toward `target` from whatever opacity is showing now.
    fn begin(
        &mut self,
        cx: &mut HandleContext<'_>,
        token: CancellationToken,
        target: f32,
        exiting: bool,
    ) -> Progress {
        if let Some(previous) = self.transition.take() {
            if let Some(request) = previous.pending {
                cx.scheduler.revoke(request);
            }
        }

        tracing::debug!(from = self.opacity, to = target, exiting, "frame transition started");
        self.transition = Some(Transition {
            animation: OpacityAnimation::new(cx.now, self.opacity, target, self.duration),
            token,
            exiting,
            pending: None,
        });
        self.step(cx)
    }

    fn step(&mut self, cx: &mut HandleContext<'_>) -> Progress {
        let (opacity, complete, cancelled) = match &self.transition {
            Some(transition) => (
                transition.animation.sample(cx.now),
                transition.animation.is_complete(cx.now),
                transition.token.is_cancelled(),
            ),
            None => return Progress::Finished,
        };

        if cancelled {
            return self.finish_cancelled(cx);
        }

        self.opacity = opacity;
        self.draw(cx);
        tracing::trace!(opacity, "frame opacity step");

        if complete {
            self.transition = None;
            return Progress::Finished;
        }

        if let Some(transition) = self.transition.as_mut() {
            transition.pending = Some(cx.scheduler.request_frame(&transition.token, cx.id));
        }
        Progress::Running
    }

    /// Abandons the running transition. An abandoned exit still ends fully
    /// hidden: the material is zeroed without redrawing geometry.
    fn finish_cancelled(&mut self, cx: &mut HandleContext<'_>) -> Progress {
        let Some(transition) = self.transition.take() else {
            return Progress::Finished;
        };
        if let Some(request) = transition.pending {
            cx.scheduler.revoke(request);
        }

        if transition.exiting {
            self.opacity = 0.0;
            let color = self.color;
            if let (Some(mesh), Some(renderer)) = (self.wireframe, cx.renderer()) {
                renderer.set_material(mesh, Material::new(color, 0.0));
            }
        }
        tracing::debug!(exiting = transition.exiting, opacity = self.opacity, "frame transition cancelled");
        Progress::Cancelled
    }
}

impl Handle for FrameHandle {
    fn state(&self) -> HandleState {
        self.state
    }

    fn set_state(&mut self, state: HandleState) {
        self.state = state;
    }

    fn draw(&mut self, cx: &mut HandleContext<'_>) {
        let (position, size) = (cx.position, cx.size);
        let material = Material::new(self.color, self.opacity);
        let Some(renderer) = cx.renderer() else {
            return;
        };

        let mesh = *self
            .wireframe
            .get_or_insert_with(|| renderer.add_mesh(Primitive::WireframeBox, material));
        renderer.set_transform(mesh, position.extend(0.0), size.extend(1.0));
        renderer.set_material(mesh, material);
    }

    fn on_entered(&mut self, cx: &mut HandleContext<'_>, token: CancellationToken) -> Progress {
        self.begin(cx, token, 1.0, false)
    }

    fn on_exited(&mut self, cx: &mut HandleContext<'_>, token: CancellationToken) -> Progress {
        self.begin(cx, token, 0.0, true)
    }

    fn on_frame(&mut self, cx: &mut HandleContext<'_>) -> Option<Progress> {
        self.transition.as_ref()?;
        Some(self.step(cx))
    }

    fn settle(&mut self, cx: &mut HandleContext<'_>) -> Option<Progress> {
        let cancelled = self
            .transition
            .as_ref()
            .is_some_and(|transition| transition.token.is_cancelled());
        cancelled.then(|| self.finish_cancelled(cx))
    }

    fn dispose(&mut self, cx: &mut HandleContext<'_>) {
        if let Some(transition) = self.transition.take() {
            if let Some(request) = transition.pending {
                cx.scheduler.revoke(request);
            }
        }
        if let Some(mesh) = self.wireframe.take() {
            if let Some(backend) = cx.backend() {
                backend.remove_mesh(mesh);
            }
            tracing::debug!("frame handle disposed");
        }
    }
}
