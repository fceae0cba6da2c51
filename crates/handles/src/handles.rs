//! # Layer handles
//!
//! Interactive affordances drawn over an editable layer: a highlight frame
//! that fades in and out as the pointer crosses the layer, and resize grips
//! that can be hovered and dragged.
//!
//! A [`Layer`] owns its handles and a [`FrameScheduler`]; a
//! [`PointerController`] turns pointer events into handle transitions and
//! resize drags. Rendering goes through the [`RenderBackend`] trait, with
//! [`HeadlessBackend`] as an in-memory implementation.

pub mod animation;
pub mod backend;
pub mod cancel;
pub mod config;
pub mod controller;
pub mod error;
pub mod frame;
pub mod grip;
pub mod handle;
pub mod layer;
pub mod policy;
pub mod resize;
pub mod scheduler;

pub use animation::{ease_in_out_quad, OpacityAnimation};
pub use backend::{CursorStyle, HeadlessBackend, Material, MeshId, MeshRecord, Primitive, RenderBackend};
pub use cancel::{CancellationToken, ListenerId};
pub use config::HandleConfig;
pub use controller::{
    ControllerEvent, ControllerEvents, PointerAction, PointerButton, PointerController, PointerEvent,
    PointerId,
};
pub use error::ConfigError;
pub use frame::FrameHandle;
pub use grip::{Grip, GripSet};
pub use handle::{AnyHandle, Handle, HandleContext, HandleId, HandleState, Progress};
pub use layer::{Layer, LayerId, PositionOwner, TransitionEnd};
pub use policy::{ResizeOperation, ResizePolicy, ResizeResult};
pub use resize::{GripStyle, ResizeHandle};
pub use scheduler::{FrameRequestId, FrameScheduler};
