use std::time::Duration;

use geometry::{Camera, Viewport};
use glam::{Vec2, Vec3};
use handles::{
    AnyHandle, CancellationToken, ControllerEvent, CursorStyle, FrameHandle, Grip, Handle,
    HandleId, HandleState, HeadlessBackend, Layer, PointerAction, PointerButton,
    PointerController, PointerEvent, PositionOwner, ResizeHandle, ResizePolicy,
};

const FRAME: Duration = Duration::from_millis(16);

struct Scene {
    layer: Layer,
    controller: PointerController,
    backend: HeadlessBackend,
    camera: Camera,
    frame: HandleId,
    resize: HandleId,
}

impl Scene {
    fn new(policy: ResizePolicy) -> Self {
        let backend = HeadlessBackend::new();
        let camera = Camera::orthographic(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec2::splat(10.0),
            0.1,
            100.0,
        );
        let mut layer = Layer::new(Vec2::splat(2.0))
            .with_backend(backend.clone())
            .with_camera(camera);
        let frame = layer.add_handle(FrameHandle::new());
        let resize = layer.add_handle(ResizeHandle::new().with_policy(policy));

        Self {
            layer,
            controller: PointerController::new(Viewport::new(200.0, 200.0)),
            backend,
            camera,
            frame,
            resize,
        }
    }

    fn event(&self, world: Vec2) -> PointerEvent {
        let ndc = self.camera.world_to_ndc(world.extend(0.0));
        PointerEvent::new(self.controller.viewport().ndc_to_screen(ndc))
    }

    fn send(&mut self, action: PointerAction, event: PointerEvent) -> Vec<ControllerEvent> {
        self.controller
            .dispatch(&mut self.layer, action, event)
            .into_vec()
    }

    fn move_to(&mut self, world: Vec2) -> Vec<ControllerEvent> {
        let event = self.event(world);
        self.send(PointerAction::Move, event)
    }

    fn down_at(&mut self, world: Vec2) -> Vec<ControllerEvent> {
        let event = self.event(world).with_button(PointerButton::Primary);
        self.send(PointerAction::Down, event)
    }

    fn up_at(&mut self, world: Vec2) -> Vec<ControllerEvent> {
        let event = self.event(world).with_button(PointerButton::Primary);
        self.send(PointerAction::Up, event)
    }

    fn tick(&mut self) {
        let now = self.layer.now() + FRAME;
        self.layer.tick(now);
    }

    fn run_until_idle(&mut self) {
        for _ in 0..100 {
            if !self.layer.is_animating() {
                return;
            }
            self.tick();
        }
        panic!("layer never went idle");
    }

    fn frame_handle(&self) -> &FrameHandle {
        self.layer
            .handle(self.frame)
            .and_then(AnyHandle::as_frame)
            .unwrap()
    }

    fn resize_handle(&self) -> &ResizeHandle {
        self.layer
            .handle(self.resize)
            .and_then(AnyHandle::as_resize)
            .unwrap()
    }
}

fn assert_vec_close(actual: Vec2, expected: Vec2) {
    assert!(
        actual.abs_diff_eq(expected, 1e-3),
        "expected {expected:?}, got {actual:?}"
    );
}

fn resized(events: &[ControllerEvent]) -> handles::ResizeResult {
    match events {
        [ControllerEvent::Resized(result)] => *result,
        other => panic!("expected a single resize, got {other:?}"),
    }
}

#[test]
fn test_entering_and_leaving_bounds_triggers_each_once() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);

    assert!(scene.move_to(Vec2::new(5.0, 5.0)).is_empty());
    assert_eq!(
        scene.move_to(Vec2::new(0.0, 0.5)),
        vec![ControllerEvent::BoundsEntered]
    );
    assert!(scene.move_to(Vec2::new(0.3, 0.2)).is_empty());
    assert!(scene.controller.is_over_layer());
    assert_eq!(
        scene.layer.handle(scene.frame).unwrap().state(),
        HandleState::Entering
    );

    scene.tick();
    let partial = scene.frame_handle().opacity();
    assert!(partial > 0.0);

    assert_eq!(
        scene.move_to(Vec2::new(5.0, 5.0)),
        vec![ControllerEvent::BoundsExited]
    );
    assert!(scene.move_to(Vec2::new(6.0, 5.0)).is_empty());
    assert_eq!(
        scene.layer.handle(scene.frame).unwrap().state(),
        HandleState::Exiting
    );
    // The cancelled entry left its opacity in place; the exit fades from there.
    assert_eq!(scene.frame_handle().opacity(), partial);

    scene.run_until_idle();
    assert_eq!(scene.frame_handle().opacity(), 0.0);
    assert_eq!(
        scene.layer.handle(scene.frame).unwrap().state(),
        HandleState::Default
    );
}

#[test]
fn test_full_entry_reaches_opaque_frame() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);
    scene.move_to(Vec2::ZERO);
    scene.run_until_idle();

    assert_eq!(scene.frame_handle().opacity(), 1.0);
    let wireframe = scene.frame_handle().wireframe().unwrap();
    assert_eq!(scene.backend.mesh(wireframe).unwrap().material.opacity, 1.0);
}

#[test]
fn test_reentering_mid_exit_cancels_exit_and_hides_frame() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);
    scene.move_to(Vec2::ZERO);
    scene.run_until_idle();

    scene.move_to(Vec2::new(5.0, 5.0));
    scene.tick();
    scene.tick();
    assert!(scene.frame_handle().opacity() > 0.0);

    assert_eq!(scene.move_to(Vec2::ZERO), vec![ControllerEvent::BoundsEntered]);
    // The abandoned exit still ends fully hidden before the entry starts.
    assert_eq!(scene.frame_handle().opacity(), 0.0);
    assert_eq!(
        scene.layer.handle(scene.frame).unwrap().state(),
        HandleState::Entering
    );

    scene.run_until_idle();
    assert_eq!(scene.frame_handle().opacity(), 1.0);
}

#[test]
fn test_size_only_drag_grows_without_moving() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);

    let events = scene.down_at(Vec2::new(1.0, -1.0));
    assert_eq!(
        events,
        vec![ControllerEvent::DragStarted {
            handle: scene.resize,
            grip: Grip::BottomRight
        }]
    );
    assert_eq!(scene.controller.captured_pointer(), Some(0));

    let result = resized(&scene.move_to(Vec2::new(2.0, 0.0)));
    assert_eq!(result.grip, Grip::BottomRight);
    assert_vec_close(result.size, Vec2::splat(3.0));
    assert_vec_close(scene.layer.size(), Vec2::splat(3.0));
    assert_eq!(scene.layer.position(), Vec2::ZERO);

    assert_eq!(
        scene.up_at(Vec2::new(2.0, 0.0)),
        vec![ControllerEvent::DragEnded {
            handle: scene.resize
        }]
    );
    assert_eq!(scene.controller.dragging(), None);
    assert_eq!(scene.controller.captured_pointer(), None);
    assert!(!scene.resize_handle().is_dragging());
}

#[test]
fn test_corner_anchored_drag_keeps_opposite_corner() {
    let mut scene = Scene::new(ResizePolicy::CornerAnchored);

    scene.down_at(Vec2::new(1.0, -1.0));
    let result = resized(&scene.move_to(Vec2::new(2.0, -2.0)));
    assert_vec_close(result.size, Vec2::splat(3.0));
    assert_vec_close(result.position, Vec2::new(0.5, -0.5));
    assert_vec_close(scene.layer.position(), Vec2::new(0.5, -0.5));

    let top_left = scene.layer.bounds().anchor(Grip::TopLeft.offset());
    assert_vec_close(top_left, Vec2::new(-1.0, 1.0));
}

#[test]
fn test_external_position_owner_reports_but_keeps_position() {
    let mut scene = Scene::new(ResizePolicy::CornerAnchored);
    scene.layer = Layer::new(Vec2::splat(2.0))
        .with_position_owner(PositionOwner::External)
        .with_backend(scene.backend.clone())
        .with_camera(scene.camera);
    scene.resize = scene
        .layer
        .add_handle(ResizeHandle::new().with_policy(ResizePolicy::CornerAnchored));

    scene.down_at(Vec2::new(1.0, -1.0));
    let result = resized(&scene.move_to(Vec2::new(2.0, -2.0)));
    assert_vec_close(result.position, Vec2::new(0.5, -0.5));
    assert_eq!(scene.layer.position(), Vec2::ZERO);
}

#[test]
fn test_minimum_size_survives_extreme_drag() {
    for policy in [ResizePolicy::SizeOnly, ResizePolicy::CornerAnchored] {
        let mut scene = Scene::new(policy);
        scene.down_at(Vec2::new(1.0, -1.0));
        scene.move_to(Vec2::new(-9.0, 9.0));
        scene.move_to(Vec2::new(-9.0, -9.0));

        let size = scene.layer.size();
        assert!(size.x >= policy.default_min_size() - 1e-6, "{policy:?} {size:?}");
        assert!(size.y >= policy.default_min_size() - 1e-6, "{policy:?} {size:?}");
    }
}

#[test]
fn test_moves_while_dragging_skip_bounds_and_hover() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);
    scene.down_at(Vec2::new(-1.0, 1.0));
    assert!(!scene.controller.is_over_layer());

    let events = scene.move_to(Vec2::new(-0.5, 0.5));
    assert!(matches!(events.as_slice(), [ControllerEvent::Resized(_)]));
    assert!(!scene.controller.is_over_layer());
    assert_eq!(scene.resize_handle().hovered(), Some(Grip::TopLeft));
    assert_eq!(scene.backend.cursor(), CursorStyle::NwseResize);
}

#[test]
fn test_uncaptured_pointer_is_ignored_during_drag() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);
    scene.down_at(Vec2::new(1.0, 1.0));
    let size = scene.layer.size();

    let stray = scene.event(Vec2::new(4.0, 4.0)).with_pointer(7);
    assert!(scene.send(PointerAction::Move, stray).is_empty());
    assert!(scene.send(PointerAction::Up, stray).is_empty());
    assert_eq!(scene.layer.size(), size);
    assert_eq!(scene.controller.dragging(), Some(scene.resize));
}

#[test]
fn test_down_misses_and_secondary_buttons_do_not_drag() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);
    assert!(scene.down_at(Vec2::ZERO).is_empty());

    let secondary = scene
        .event(Vec2::new(1.0, 1.0))
        .with_button(PointerButton::Secondary);
    assert!(scene.send(PointerAction::Down, secondary).is_empty());
    assert_eq!(scene.controller.dragging(), None);
    assert!(scene.up_at(Vec2::ZERO).is_empty());
}

#[test]
fn test_leave_ends_drag_only() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);
    scene.move_to(Vec2::ZERO);
    let leave = scene.event(Vec2::new(5.0, 5.0));
    assert!(scene.send(PointerAction::Leave, leave).is_empty());
    assert!(scene.controller.is_over_layer());

    scene.down_at(Vec2::new(1.0, 0.0));
    assert_eq!(
        scene.send(PointerAction::Leave, leave),
        vec![ControllerEvent::DragEnded {
            handle: scene.resize
        }]
    );
    assert_eq!(scene.backend.cursor(), CursorStyle::Default);
}

#[test]
fn test_hover_sets_cursor_from_grip() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);
    scene.move_to(Vec2::new(-0.98, 0.97));
    assert_eq!(scene.resize_handle().hovered(), Some(Grip::TopLeft));
    assert_eq!(scene.backend.cursor(), CursorStyle::NwseResize);

    scene.move_to(Vec2::new(1.02, 0.0));
    assert_eq!(scene.backend.cursor(), CursorStyle::EwResize);

    scene.move_to(Vec2::ZERO);
    assert_eq!(scene.resize_handle().hovered(), None);
    assert_eq!(scene.backend.cursor(), CursorStyle::Default);
}

#[test]
fn test_events_without_camera_are_skipped() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);
    scene.layer.set_camera(None);
    assert!(scene.move_to(Vec2::ZERO).is_empty());
    assert!(scene.down_at(Vec2::new(1.0, 1.0)).is_empty());
    assert!(!scene.controller.is_over_layer());
}

#[test]
fn test_degenerate_unprojection_mid_drag_keeps_the_drag() {
    let mut scene = Scene::new(ResizePolicy::CornerAnchored);
    scene.down_at(Vec2::new(1.0, -1.0));
    assert_eq!(scene.controller.dragging(), Some(scene.resize));

    // Viewing the layer plane edge-on: every ray runs parallel to it.
    let side_on = Camera::orthographic(
        Vec3::new(5.0, 0.0, 0.0),
        Vec3::ZERO,
        Vec2::splat(10.0),
        0.1,
        100.0,
    );
    scene.layer.set_camera(Some(side_on));
    assert!(scene.move_to(Vec2::new(5.0, -5.0)).is_empty());
    assert_eq!(scene.controller.dragging(), Some(scene.resize));
    assert!(scene.resize_handle().is_dragging());
    assert_eq!(scene.layer.size(), Vec2::splat(2.0));
    assert_eq!(scene.layer.position(), Vec2::ZERO);

    let camera = scene.camera;
    scene.layer.set_camera(Some(camera));
    let result = resized(&scene.move_to(Vec2::new(2.0, -2.0)));
    assert_vec_close(result.size, Vec2::splat(3.0));
    assert_vec_close(result.position, Vec2::new(0.5, -0.5));
}

#[test]
fn test_teardown_mid_exit_hides_and_releases_everything() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);
    scene.move_to(Vec2::ZERO);
    scene.run_until_idle();
    scene.move_to(Vec2::new(5.0, 5.0));
    scene.tick();
    assert!(scene.layer.is_animating());

    scene.controller.teardown(&mut scene.layer);
    assert_eq!(scene.frame_handle().opacity(), 0.0);
    assert!(!scene.layer.is_animating());
    assert!(!scene.layer.has_backend());
    assert_eq!(scene.backend.live_meshes(), 0);
    assert_eq!(scene.backend.released_meshes(), 9);

    // A second teardown and a drop have nothing left to release.
    scene.controller.teardown(&mut scene.layer);
    let Scene { layer, backend, .. } = scene;
    drop(layer);
    assert_eq!(backend.released_meshes(), 9);
}

#[test]
fn test_fresh_tokens_are_issued_per_crossing() {
    let mut scene = Scene::new(ResizePolicy::SizeOnly);
    for _ in 0..5 {
        scene.move_to(Vec2::ZERO);
        scene.tick();
        scene.move_to(Vec2::new(5.0, 5.0));
        scene.tick();
    }
    // Only the latest exit is still in flight.
    assert_eq!(scene.layer.scheduler().pending_len(), 1);
    scene.run_until_idle();
    assert_eq!(scene.frame_handle().opacity(), 0.0);

    // A token cancelled before the trigger runs never schedules a frame.
    let token = CancellationToken::cancelled();
    scene.layer.trigger_entered(&token);
    assert!(!scene.layer.is_animating());
}
