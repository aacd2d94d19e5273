//! Orbit camera used to drive camera-distance sorting.

use glam::{Mat4, Vec3};

use crate::entity::CameraView;

/// Spherical-coordinate camera circling `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Angle around the Y axis; zero sits on +Z.
    pub yaw: f32,
    /// Elevation above the XZ plane.
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Camera {
    /// Slightly raised, three units out on +Z.
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.3,
            distance: 3.0,
            target: Vec3::ZERO,
            fov_y: 45.0_f32.to_radians(),
        }
    }

    /// Offset from the target to the eye.
    pub fn offset(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.distance * Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn position(&self) -> Vec3 {
        self.target + self.offset()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, 0.1, 100.0)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraView for Camera {
    fn view_direction(&self) -> Vec3 {
        (-self.offset()).try_normalize().unwrap_or(Vec3::NEG_Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_looks_at_target() {
        let camera = Camera::new();
        let dir = camera.view_direction();
        assert!((dir.length() - 1.0).abs() < 1e-5);
        let to_target = (camera.target - camera.position()).normalize();
        assert!(dir.dot(to_target) > 0.9999);
    }

    #[test]
    fn test_yaw_orbits_around_target() {
        let mut camera = Camera::new();
        camera.pitch = 0.0;
        camera.yaw = std::f32::consts::FRAC_PI_2;
        assert!((camera.position() - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-5);
        assert!((camera.view_direction() - Vec3::NEG_X).length() < 1e-5);
    }
}
