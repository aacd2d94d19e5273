//! Emission shapes.
//!
//! Each shape produces a randomized local start position and start velocity
//! for one emission. Generation is pure apart from consuming the RNG it is
//! handed.
//!
//! | Shape | Position | Direction |
//! |-------|----------|-----------|
//! | [`ShapeKind::Cube`] | uniform in the unit cube `[-0.5, 0.5]³` | straight up |
//! | [`ShapeKind::Sphere`] | uniform on a sphere surface | outward radial |
//! | [`ShapeKind::Cone`] | disk slices biased toward the apex | away from the apex |
//!
//! All directions are scaled by the configured start speed.

use std::f32::consts::TAU;
use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ParticleError;

/// Emission geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ShapeKind {
    /// Unit cube centered on the emitter.
    Cube,
    /// Sphere surface of radius `emitter_radius` (default).
    #[default]
    Sphere,
    /// Upward cone spray with its apex at the emitter origin.
    Cone,
}

impl ShapeKind {
    /// Name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Cube => "cube",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cone => "cone",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = ParticleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cube" => Ok(ShapeKind::Cube),
            "sphere" => Ok(ShapeKind::Sphere),
            "cone" => Ok(ShapeKind::Cone),
            other => Err(ParticleError::invalid(format!(
                "unknown shape type '{other}' (expected cube, sphere or cone)"
            ))),
        }
    }
}

impl TryFrom<String> for ShapeKind {
    type Error = ParticleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ShapeKind> for String {
    fn from(kind: ShapeKind) -> Self {
        kind.name().to_string()
    }
}

/// Shape dimensions and speed used by [`generate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    /// Sphere radius.
    pub emitter_radius: f32,
    /// Cone base radius at unit height.
    pub shape_radius: f32,
    /// Length of the generated direction vector.
    pub start_speed: f32,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            emitter_radius: 1.0,
            shape_radius: 1.0,
            start_speed: 5.0,
        }
    }
}

/// Generate a local `(position, direction)` pair for one emission.
pub fn generate<R: Rng + ?Sized>(kind: ShapeKind, params: &ShapeParams, rng: &mut R) -> (Vec3, Vec3) {
    let speed = params.start_speed;

    match kind {
        ShapeKind::Cube => {
            let position = Vec3::new(
                rng.gen::<f32>() - 0.5,
                rng.gen::<f32>() - 0.5,
                rng.gen::<f32>() - 0.5,
            );
            (position, Vec3::new(0.0, speed, 0.0))
        }

        ShapeKind::Sphere => {
            // Inverse-CDF on the polar angle gives a uniform surface density
            let theta = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
            let phi = TAU * rng.gen::<f32>();
            let normal = Vec3::new(phi.cos() * theta.sin(), theta.cos(), phi.sin() * theta.sin());
            let normal = normal.try_normalize().unwrap_or(Vec3::Y);
            (normal * params.emitter_radius, normal * speed)
        }

        ShapeKind::Cone => {
            let phi = TAU * rng.gen::<f32>();
            let y = rng.gen::<f32>();
            let rad = params.shape_radius * rng.gen::<f32>() * y;
            let mut position = Vec3::new(rad * phi.cos(), y, rad * phi.sin());
            let direction = position.try_normalize().unwrap_or(Vec3::Y) * speed;
            position.y -= 0.5;
            (position, direction)
        }
    }
}
