//! Particle emitter configuration.
//!
//! [`ParticleConfig`] holds every static or tunable emitter parameter. It is
//! plain data: values are only checked by [`ParticleConfig::validate`], which
//! runs when a component is attached or resized.
//!
//! Configurations serialize to JSON; missing fields take their defaults.
//!
//! ```
//! use particle_pool::{ParticleConfig, ShapeKind, SortMode};
//!
//! let config = ParticleConfig::default()
//!     .with_shape(ShapeKind::Cone)
//!     .with_emission_rate(40.0)
//!     .with_max_particles(256)
//!     .with_local_space(false)
//!     .with_sort_mode(SortMode::CameraDistance);
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::Path;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{ParticleError, Result};
use crate::mesh::MeshTemplate;
use crate::shape::{ShapeKind, ShapeParams};

/// Per-frame ordering of the pool's draw slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Keep allocation order (default, cheapest).
    #[default]
    None,
    /// Back-to-front along the camera view direction, for alpha blending.
    CameraDistance,
}

/// Emitter parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParticleConfig {
    /// Emission geometry.
    pub shape: ShapeKind,
    /// Sphere shape radius.
    pub emitter_radius: f32,
    /// Cone shape radius at unit height.
    pub shape_radius: f32,
    /// Loop length in seconds.
    pub duration: f32,
    /// Wrap the simulation clock at `duration`.
    pub looping: bool,
    /// Start a local-space pool as if it had already been running.
    pub pre_warm: bool,
    /// Simulate in the emitter's frame and pre-populate the pool at attach.
    ///
    /// When false, particles are emitted into world space over time.
    pub local_space: bool,
    /// Initial speed of emitted particles.
    pub start_speed: f32,
    /// Particle scale at birth.
    pub start_size: f32,
    /// Seconds each particle stays visible.
    pub start_life_time: f32,
    /// RGBA tint.
    pub start_color: Vec4,
    /// World-space acceleration.
    pub gravity: Vec3,
    /// Particles per second.
    pub emission_rate: f32,
    /// Pool capacity.
    pub max_particles: usize,
    pub sort_mode: SortMode,
    /// Camera-facing quads instead of tumbling meshes.
    pub billboard: bool,
    /// Alpha blending on.
    pub blending: bool,
    pub depth_write: bool,
    pub depth_test: bool,
    /// Fragments with alpha at or below this are discarded.
    pub alphakill: f32,
    /// Columns of the texture sheet.
    pub texture_tiles_x: f32,
    /// Rows of the texture sheet.
    pub texture_tiles_y: f32,
    /// Sample a particle texture.
    pub textured: bool,
    /// Draw ordering hint for the renderer.
    pub render_queue: i32,
    /// Per-particle geometry.
    pub mesh: MeshTemplate,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Sphere,
            emitter_radius: 1.0,
            shape_radius: 1.0,
            duration: 10.0,
            looping: true,
            pre_warm: true,
            local_space: true,
            start_speed: 5.0,
            start_size: 1.0,
            start_life_time: 5.0,
            start_color: Vec4::ONE,
            gravity: Vec3::ZERO,
            emission_rate: 10.0,
            max_particles: 1000,
            sort_mode: SortMode::None,
            billboard: true,
            blending: true,
            depth_write: true,
            depth_test: true,
            alphakill: 0.0,
            texture_tiles_x: 1.0,
            texture_tiles_y: 1.0,
            textured: false,
            render_queue: 3010,
            mesh: MeshTemplate::default(),
            seed: None,
        }
    }
}

impl ParticleConfig {
    pub fn with_shape(mut self, shape: ShapeKind) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_emitter_radius(mut self, radius: f32) -> Self {
        self.emitter_radius = radius;
        self
    }

    pub fn with_shape_radius(mut self, radius: f32) -> Self {
        self.shape_radius = radius;
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_pre_warm(mut self, pre_warm: bool) -> Self {
        self.pre_warm = pre_warm;
        self
    }

    pub fn with_local_space(mut self, local_space: bool) -> Self {
        self.local_space = local_space;
        self
    }

    pub fn with_start_speed(mut self, speed: f32) -> Self {
        self.start_speed = speed;
        self
    }

    pub fn with_start_size(mut self, size: f32) -> Self {
        self.start_size = size;
        self
    }

    pub fn with_start_life_time(mut self, seconds: f32) -> Self {
        self.start_life_time = seconds;
        self
    }

    pub fn with_start_color(mut self, color: Vec4) -> Self {
        self.start_color = color;
        self
    }

    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_emission_rate(mut self, rate: f32) -> Self {
        self.emission_rate = rate;
        self
    }

    pub fn with_max_particles(mut self, max: usize) -> Self {
        self.max_particles = max;
        self
    }

    pub fn with_sort_mode(mut self, mode: SortMode) -> Self {
        self.sort_mode = mode;
        self
    }

    pub fn with_billboard(mut self, billboard: bool) -> Self {
        self.billboard = billboard;
        self
    }

    pub fn with_texture_tiles(mut self, x: f32, y: f32) -> Self {
        self.texture_tiles_x = x;
        self.texture_tiles_y = y;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshTemplate) -> Self {
        self.mesh = mesh;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Shape dimensions for the generator.
    pub fn shape_params(&self) -> ShapeParams {
        ShapeParams {
            emitter_radius: self.emitter_radius,
            shape_radius: self.shape_radius,
            start_speed: self.start_speed,
        }
    }

    /// `(tiles_x, tiles_y, cycles over lifetime, unused)` for the shader.
    pub fn texture_tile_info(&self) -> [f32; 4] {
        [self.texture_tiles_x, self.texture_tiles_y, 1.0, 0.0]
    }

    /// Check the values a pool needs to be built.
    pub fn validate(&self) -> Result<()> {
        validate_capacity(self.max_particles)?;
        validate_emission_rate(self.emission_rate)?;
        if !(self.start_life_time.is_finite() && self.start_life_time > 0.0) {
            return Err(ParticleError::invalid(format!(
                "start life time must be positive, got {}",
                self.start_life_time
            )));
        }
        if self.looping && !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ParticleError::invalid(format!(
                "looping emitter needs a positive duration, got {}",
                self.duration
            )));
        }
        if !(self.start_size.is_finite() && self.start_size >= 0.0) {
            return Err(ParticleError::invalid(format!(
                "start size must be finite and non-negative, got {}",
                self.start_size
            )));
        }
        if self.texture_tiles_x < 1.0 || self.texture_tiles_y < 1.0 {
            return Err(ParticleError::invalid(format!(
                "texture tiles must be at least 1x1, got {}x{}",
                self.texture_tiles_x, self.texture_tiles_y
            )));
        }
        self.mesh.validate()
    }

    /// Parse from JSON. Unknown values (e.g. a shape name) are configuration errors.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            if e.is_data() {
                ParticleError::InvalidConfiguration(e.to_string())
            } else {
                ParticleError::Json(e)
            }
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

pub(crate) fn validate_capacity(max_particles: usize) -> Result<()> {
    if max_particles == 0 {
        return Err(ParticleError::invalid("max particles must be at least 1"));
    }
    Ok(())
}

pub(crate) fn validate_emission_rate(rate: f32) -> Result<()> {
    if !(rate.is_finite() && rate > 0.0) {
        return Err(ParticleError::invalid(format!("emission rate must be positive, got {rate}")));
    }
    Ok(())
}
