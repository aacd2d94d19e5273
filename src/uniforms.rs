//! Uniform blocks bound before drawing a pool.
//!
//! [`ParticleUniforms`] carries the values the vertex shader needs to finish
//! the simulation (clock, gravity, tint, texture sheet layout, alpha kill).
//! [`ViewUniforms`] carries the camera and emitter matrices. Both are `Pod`
//! so they upload with `bytemuck::bytes_of`.
//!
//! Layouts match the WGSL structs in [`crate::shader`]:
//!
//! ```text
//! struct ParticleUniforms {      // 64 bytes
//!     gravity: vec3<f32>,        // 0
//!     time: f32,                 // 12
//!     color: vec4<f32>,          // 16
//!     texture_tile_info: vec4<f32>, // 32
//!     alphakill: f32,            // 48
//! }
//! ```

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Per-pool values consumed by the particle shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleUniforms {
    /// Gravity in the frame the pool is drawn in.
    pub gravity: [f32; 3],
    /// Current simulation time.
    pub time: f32,
    /// RGBA tint.
    pub color: [f32; 4],
    /// `(tiles_x, tiles_y, cycles, unused)`.
    pub texture_tile_info: [f32; 4],
    pub alphakill: f32,
    pub _padding: [f32; 3],
}

impl ParticleUniforms {
    pub fn new(gravity: Vec3, time: f32, color: Vec4, texture_tile_info: [f32; 4], alphakill: f32) -> Self {
        Self {
            gravity: gravity.to_array(),
            time,
            color: color.to_array(),
            texture_tile_info,
            alphakill,
            _padding: [0.0; 3],
        }
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::from_array(self.gravity)
    }

    pub fn color(&self) -> Vec4 {
        Vec4::from_array(self.color)
    }
}

impl Default for ParticleUniforms {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 0.0, Vec4::ONE, [1.0, 1.0, 1.0, 0.0], 0.0)
    }
}

/// Camera and emitter matrices for one draw.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ViewUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
}

impl ViewUniforms {
    pub fn new(view: Mat4, projection: Mat4, world: Mat4) -> Self {
        Self {
            view_proj: (projection * view).to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            world: world.to_cols_array_2d(),
        }
    }
}

impl Default for ViewUniforms {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY)
    }
}
