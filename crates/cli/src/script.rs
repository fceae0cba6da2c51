//! Scripted pointer sessions replayed against a headless layer.

use anyhow::{bail, Result};
use geometry::{Camera, ScreenPoint, Viewport};
use glam::{Vec2, Vec3};
use handles::{
    AnyHandle, ControllerEvent, HandleConfig, HeadlessBackend, Layer, PointerAction,
    PointerButton, PointerController, PointerEvent, Progress, TransitionEnd,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for `settle` steps, in frames.
const MAX_SETTLE_FRAMES: u32 = 1_000;
const FRAME: Duration = Duration::from_millis(16);

/// A replay script.
///
/// ```json
/// {
///   "size": [2.0, 2.0],
///   "steps": [
///     { "step": "pointer", "action": "move", "screen": [100, 100] },
///     { "step": "tick", "ms": 16 },
///     { "step": "settle" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Script {
    pub size: Vec2,
    pub position: Vec2,
    pub viewport: Viewport,
    /// World units visible on each side of the orthographic camera
    pub half_extent: Vec2,
    pub steps: Vec<Step>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            size: Vec2::splat(2.0),
            position: Vec2::ZERO,
            viewport: Viewport::new(200.0, 200.0),
            half_extent: Vec2::splat(10.0),
            steps: Vec::new(),
        }
    }
}

impl Script {
    /// Orthographic camera looking down at the layer from +z.
    pub fn camera(&self) -> Camera {
        Camera::orthographic(
            self.position.extend(5.0),
            self.position.extend(0.0),
            self.half_extent,
            0.1,
            100.0,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Pointer {
        action: PointerAction,
        screen: ScreenPoint,
        #[serde(default)]
        button: Option<PointerButton>,
        #[serde(default)]
        pointer_id: u32,
    },
    /// Advance the layer clock by `ms` and run one frame.
    Tick { ms: u64 },
    /// Run frames until no transition is in flight.
    Settle,
}

/// Something observable that happened during a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Record {
    BoundsEntered,
    BoundsExited,
    DragStarted { grip: String },
    Resized { size: Vec2, position: Vec2 },
    DragEnded,
    TransitionFinished { handle: String },
    TransitionCancelled { handle: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalState {
    pub size: Vec2,
    pub position: Vec2,
    pub frame_opacity: Option<f32>,
    pub hovered_grip: Option<String>,
    pub cursor: String,
    pub live_meshes: usize,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub steps: Vec<StepReport>,
    #[serde(rename = "final")]
    pub final_state: FinalState,
}

pub fn replay(script: &Script, config: &HandleConfig) -> Result<Report> {
    if script.viewport.is_empty() {
        bail!("viewport must have a positive width and height");
    }

    let backend = HeadlessBackend::new();
    let camera = script.camera();
    let mut layer = Layer::from_config(script.size, config)
        .with_position(script.position)
        .with_backend(backend.clone())
        .with_camera(camera);
    layer.draw();
    let mut controller = PointerController::new(script.viewport);

    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let records = match step {
            Step::Pointer {
                action,
                screen,
                button,
                pointer_id,
            } => {
                let event = PointerEvent {
                    screen: *screen,
                    button: *button,
                    pointer_id: *pointer_id,
                };
                controller
                    .dispatch(&mut layer, *action, event)
                    .iter()
                    .map(|event| record_event(&layer, event))
                    .collect()
            }
            Step::Tick { ms } => {
                let now = layer.now() + Duration::from_millis(*ms);
                let ended = layer.tick(now);
                record_transitions(&layer, ended)
            }
            Step::Settle => {
                let mut ended = Vec::new();
                for _ in 0..MAX_SETTLE_FRAMES {
                    if !layer.is_animating() {
                        break;
                    }
                    let now = layer.now() + FRAME;
                    ended.extend(layer.tick(now));
                }
                record_transitions(&layer, ended)
            }
        };
        tracing::debug!(index, ?records, "step replayed");
        steps.push(StepReport { index, records });
    }

    let final_state = final_state(&layer, &backend);
    controller.teardown(&mut layer);
    Ok(Report { steps, final_state })
}

fn record_event(layer: &Layer, event: &ControllerEvent) -> Record {
    match event {
        ControllerEvent::BoundsEntered => Record::BoundsEntered,
        ControllerEvent::BoundsExited => Record::BoundsExited,
        ControllerEvent::DragStarted { grip, .. } => Record::DragStarted {
            grip: grip.to_string(),
        },
        ControllerEvent::Resized(_) => Record::Resized {
            size: layer.size(),
            position: layer.position(),
        },
        ControllerEvent::DragEnded { .. } => Record::DragEnded,
    }
}

fn record_transitions(layer: &Layer, ended: Vec<TransitionEnd>) -> Vec<Record> {
    ended
        .into_iter()
        .map(|end| {
            let handle = match layer.handle(end.handle) {
                Some(AnyHandle::Frame(_)) => "frame",
                Some(AnyHandle::Resize(_)) => "resize",
                None => "removed",
            }
            .to_string();
            match end.progress {
                Progress::Cancelled => Record::TransitionCancelled { handle },
                _ => Record::TransitionFinished { handle },
            }
        })
        .collect()
}

fn final_state(layer: &Layer, backend: &HeadlessBackend) -> FinalState {
    let frame_opacity = layer
        .frame_handles()
        .first()
        .and_then(|id| layer.handle(*id))
        .and_then(AnyHandle::as_frame)
        .map(|frame| frame.opacity());
    let hovered_grip = layer
        .resize_handles()
        .first()
        .and_then(|id| layer.handle(*id))
        .and_then(AnyHandle::as_resize)
        .and_then(|resize| resize.hovered())
        .map(|grip| grip.to_string());

    FinalState {
        size: layer.size(),
        position: layer.position(),
        frame_opacity,
        hovered_grip,
        cursor: backend.cursor().to_string(),
        live_meshes: backend.live_meshes(),
        elapsed_ms: layer.now().as_millis(),
    }
}

/// Surface position of a world point on the layer plane.
pub fn world_to_screen(script: &Script, world: Vec2) -> ScreenPoint {
    let ndc = script.camera().world_to_ndc(Vec3::new(world.x, world.y, 0.0));
    script.viewport.ndc_to_screen(ndc)
}
