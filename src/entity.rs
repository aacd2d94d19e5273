//! Interfaces to the surrounding entity framework.
//!
//! A particle component never owns its entity. The host hands it an
//! [`EmitterEntity`] on attach and a [`FrameContext`] every tick.

use glam::{Mat3, Mat4, Vec3};

/// World transform of the entity carrying an emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub translation: Vec3,
    pub rotation: Mat3,
    pub scale: Vec3,
}

impl WorldTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Mat3::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation(mut self, rotation: Mat3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Translation * rotation * scale.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_mat3(self.rotation) * Mat4::from_scale(self.scale)
    }

    /// Local point to world space (full transform).
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.matrix().transform_point3(point)
    }

    /// Local direction to world space (rotation only).
    pub fn rotate_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    /// World direction into the local frame (inverse rotation).
    pub fn inverse_rotate_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation.inverse() * vector
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An entity that can host a particle component.
pub trait EmitterEntity {
    /// Current world transform, or `None` if the entity has no transform.
    fn world_transform(&self) -> Option<WorldTransform>;
}

impl EmitterEntity for WorldTransform {
    fn world_transform(&self) -> Option<WorldTransform> {
        Some(*self)
    }
}

/// Source of the view direction used for camera-distance sorting.
pub trait CameraView {
    /// Unit vector the camera looks along, in world space.
    fn view_direction(&self) -> Vec3;
}

impl CameraView for Vec3 {
    fn view_direction(&self) -> Vec3 {
        *self
    }
}

/// Per-tick inputs from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Emitter world transform this frame.
    pub transform: WorldTransform,
    /// Camera view direction this frame.
    pub view_direction: Vec3,
}

impl FrameContext {
    pub fn new(transform: WorldTransform, view_direction: Vec3) -> Self {
        Self {
            transform,
            view_direction,
        }
    }

    /// Capture the entity and camera state for one tick.
    ///
    /// Returns `None` when the entity has lost its transform.
    pub fn capture(entity: &dyn EmitterEntity, camera: &dyn CameraView) -> Option<Self> {
        Some(Self::new(entity.world_transform()?, camera.view_direction()))
    }
}

impl Default for FrameContext {
    fn default() -> Self {
        Self::new(WorldTransform::IDENTITY, Vec3::NEG_Z)
    }
}
