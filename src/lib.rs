//! # particle-pool
//!
//! Fixed-capacity particle emitters whose simulation runs in the vertex shader.
//!
//! The CPU side only decides *when* a particle slot is recycled and *where*
//! it starts. Each emission is packed once into flat per-vertex arrays
//! (`TIME_INFO`, `START_POS`, `START_DIR` next to the mesh template's
//! `POSITION` and `TEXCOORD0`), and the generated WGSL reconstructs position,
//! spin, scale and visibility from those values and the emitter clock. A whole
//! pool draws with one indexed call.
//!
//! ## Quick Start
//!
//! ```
//! use particle_pool::prelude::*;
//!
//! let config = ParticleConfig::default()
//!     .with_shape(ShapeKind::Cone)
//!     .with_local_space(false)
//!     .with_emission_rate(20.0)
//!     .with_max_particles(128)
//!     .with_sort_mode(SortMode::CameraDistance)
//!     .with_seed(1);
//!
//! let mut emitter = ParticleComponent::new(config);
//! let entity = WorldTransform::from_translation(Vec3::new(0.0, 1.0, 0.0));
//! let camera = Camera::new();
//!
//! emitter.attached(&entity)?;
//! for _ in 0..60 {
//!     emitter.process(1.0 / 60.0, &entity, &camera)?;
//! }
//! assert!(emitter.stats().total_emitted > 0);
//!
//! // Shader source is handed out once per variant change.
//! let shader = emitter.relink_shader().expect("first relink yields the shader");
//! assert!(shader.wgsl.contains("fn vs_main"));
//! # Ok::<(), ParticleError>(())
//! ```
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`particle`] | Per-particle emission record |
//! | [`shape`] | Cube, sphere and cone emission sampling |
//! | [`buffers`] | Packed per-vertex attribute arrays |
//! | [`pool`] | Particle storage with allocation and draw orders |
//! | [`clock`] | Looping emitter clock and emission counting |
//! | [`component`] | The pool controller |
//! | [`shader`] | WGSL variant generation and material state |
//! | [`gpu`] | wgpu buffers, layouts and pipeline |

pub mod buffers;
pub mod camera;
pub mod clock;
pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod gpu;
pub mod mesh;
pub mod particle;
pub mod pool;
pub mod shader;
pub mod shape;
pub mod uniforms;

pub use bytemuck;
pub use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

pub use buffers::{Attribute, VertexBuffers};
pub use camera::Camera;
pub use clock::{EmitterClock, Tick};
pub use component::{FrameReport, ParticleComponent, PoolStats};
pub use config::{ParticleConfig, SortMode};
pub use entity::{CameraView, EmitterEntity, FrameContext, WorldTransform};
pub use error::{ParticleError, Result};
pub use mesh::MeshTemplate;
pub use particle::Particle;
pub use pool::ParticlePool;
pub use shader::{Material, MaterialState, ShaderSource, ShaderVariant};
pub use shape::{ShapeKind, ShapeParams};
pub use uniforms::{ParticleUniforms, ViewUniforms};

/// Convenient re-exports for common usage.
///
/// ```
/// use particle_pool::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::Camera;
    pub use crate::component::{FrameReport, ParticleComponent, PoolStats};
    pub use crate::config::{ParticleConfig, SortMode};
    pub use crate::entity::{CameraView, EmitterEntity, FrameContext, WorldTransform};
    pub use crate::error::ParticleError;
    pub use crate::mesh::MeshTemplate;
    pub use crate::shape::ShapeKind;
    pub use crate::{Mat3, Mat4, Vec2, Vec3, Vec4};
}
