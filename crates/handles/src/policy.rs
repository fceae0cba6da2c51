//! Drag-to-resize math.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::grip::Grip;

/// How a drag delta on a grip turns into a new size and position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizePolicy {
    /// Only the size changes; the layer keeps its centre.
    #[default]
    SizeOnly,
    /// The grip follows the pointer and the opposite edge or corner stays put.
    CornerAnchored,
}

impl ResizePolicy {
    /// Smallest width and height a drag may produce.
    pub fn default_min_size(&self) -> f32 {
        match self {
            ResizePolicy::SizeOnly => 0.5,
            ResizePolicy::CornerAnchored => 0.05,
        }
    }
}

/// The outcome of applying one drag position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeResult {
    pub grip: Grip,
    pub size: Vec2,
    pub position: Vec2,
}

/// Snapshot of a layer at drag start, plus the rules to resize it by.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeOperation {
    pub grip: Grip,
    pub policy: ResizePolicy,
    /// Per-axis floor for the resulting size
    pub min_size: f32,
    original_position: Vec2,
    original_size: Vec2,
}

impl ResizeOperation {
    pub fn new(grip: Grip, position: Vec2, size: Vec2) -> Self {
        let policy = ResizePolicy::default();
        Self {
            grip,
            policy,
            min_size: policy.default_min_size(),
            original_position: position,
            original_size: size,
        }
    }

    /// Switches policy and resets the floor to that policy's default.
    pub fn with_policy(mut self, policy: ResizePolicy) -> Self {
        self.policy = policy;
        self.min_size = policy.default_min_size();
        self
    }

    pub fn with_min_size(mut self, min_size: f32) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn original_position(&self) -> Vec2 {
        self.original_position
    }

    pub fn original_size(&self) -> Vec2 {
        self.original_size
    }

    /// Calculate new (position, size) for a drag delta measured from the start
    pub fn calculate_new_bounds(&self, delta: Vec2) -> (Vec2, Vec2) {
        let min = Vec2::splat(self.min_size);
        match self.policy {
            ResizePolicy::SizeOnly => {
                let size = (self.original_size + delta * self.grip.size_signs()).max(min);
                (self.original_position, size)
            }
            ResizePolicy::CornerAnchored => {
                let direction = self.grip.offset();
                let size = (self.original_size + delta * direction).max(min);
                // Shift by half the growth toward the grip so the opposite
                // side does not move, even when the floor kicked in.
                let position = self.original_position + direction * (size - self.original_size) * 0.5;
                (position, size)
            }
        }
    }

    pub fn apply(&self, delta: Vec2) -> ResizeResult {
        let (position, size) = self.calculate_new_bounds(delta);
        ResizeResult {
            grip: self.grip,
            size,
            position,
        }
    }
}
