//! Particle shader generation and material state.
//!
//! Particles are never integrated on the CPU between emissions. The vertex
//! shader evaluates each particle's closed-form trajectory from the packed
//! attributes and the current clock, so the WGSL is specialised per
//! [`ShaderVariant`] and regenerated only when the variant changes.

use std::fmt;

use crate::config::ParticleConfig;

/// Vertex entry point of every generated module.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment entry point of every generated module.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Compile-time switches baked into the particle shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderVariant {
    /// Camera-facing quads instead of tumbling meshes.
    pub billboard: bool,
    /// Wrap particle age by its lifetime.
    pub looping: bool,
    /// Sample the particle texture at group 1.
    pub textured: bool,
    /// Scale at birth; shrinks linearly to zero at end of life.
    pub start_scale: f32,
}

impl ShaderVariant {
    pub fn from_config(config: &ParticleConfig) -> Self {
        Self {
            billboard: config.billboard,
            looping: config.looping,
            textured: config.textured,
            start_scale: config.start_size,
        }
    }

    /// Generate the WGSL module for this variant.
    pub fn generate(&self) -> ShaderSource {
        let start_scale = if self.start_scale.is_finite() {
            self.start_scale
        } else {
            0.0
        };

        let texture_bindings = if self.textured {
            r#"
@group(1) @binding(0)
var particle_texture: texture_2d<f32>;

@group(1) @binding(1)
var particle_sampler: sampler;
"#
        } else {
            ""
        };

        let age = if self.looping {
            "let age = wrap_mod(age_raw, life_time);"
        } else {
            "let age = age_raw;"
        };

        let placement = if self.billboard {
            r#"    let quad_offset = (spin * input.position).xy * scale;
    let center = camera.world * vec4<f32>(particle_pos, 1.0);
    output.clip_position = camera.view_proj * center
        + camera.projection * vec4<f32>(quad_offset, 0.0, 0.0);"#
        } else {
            r#"    let axis = vec3<f32>(sin(emit_time * 5.0), cos(emit_time * 1234.0), sin(emit_time));
    let tumble = rotation_matrix(axis, rotation);
    let mesh_pos = tumble * (input.position * scale) + particle_pos;
    output.clip_position = camera.view_proj * camera.world * vec4<f32>(mesh_pos, 1.0);"#
        };

        let sample = if self.textured {
            "let col = input.color * textureSample(particle_texture, particle_sampler, input.uv);"
        } else {
            "let col = input.color;"
        };

        let wgsl = format!(
            r#"struct ParticleUniforms {{
    gravity: vec3<f32>,
    time: f32,
    color: vec4<f32>,
    texture_tile_info: vec4<f32>,
    alphakill: f32,
}};

struct ViewUniforms {{
    view_proj: mat4x4<f32>,
    projection: mat4x4<f32>,
    world: mat4x4<f32>,
}};

@group(0) @binding(0)
var<uniform> params: ParticleUniforms;

@group(0) @binding(1)
var<uniform> camera: ViewUniforms;
{texture_bindings}
struct VertexInput {{
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) time_info: vec4<f32>,
    @location(3) start_pos: vec3<f32>,
    @location(4) start_dir: vec3<f32>,
}};

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
}};

// GLSL-style mod: result takes the sign of y.
fn wrap_mod(x: f32, y: f32) -> f32 {{
    return x - y * floor(x / y);
}}

fn rotation_matrix(axis_in: vec3<f32>, angle: f32) -> mat3x3<f32> {{
    let axis = normalize(axis_in);
    let s = sin(angle);
    let c = cos(angle);
    let oc = 1.0 - c;
    return mat3x3<f32>(
        vec3<f32>(oc * axis.x * axis.x + c, oc * axis.x * axis.y - axis.z * s, oc * axis.z * axis.x + axis.y * s),
        vec3<f32>(oc * axis.x * axis.y + axis.z * s, oc * axis.y * axis.y + c, oc * axis.y * axis.z - axis.x * s),
        vec3<f32>(oc * axis.z * axis.x - axis.y * s, oc * axis.y * axis.z + axis.x * s, oc * axis.z * axis.z + c),
    );
}}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {{
    var output: VertexOutput;
    output.color = params.color;

    let life_time = input.time_info.x;
    var visible = input.time_info.y;
    let emit_time = input.time_info.w;

    let age_raw = params.time * visible - emit_time;
    {age}
    let unit_age = age / life_time;

    // Texture sheet frame
    let tiles = params.texture_tile_info.xy;
    let tile_x = floor(wrap_mod(tiles.x * tiles.y * unit_age, tiles.x));
    let tile_y = floor(wrap_mod(tiles.y * unit_age, tiles.y));
    output.uv = input.uv / tiles + vec2<f32>(tile_x, tile_y) / tiles;

    let rotation = age;
    let c = cos(rotation);
    let s = sin(rotation);
    let spin = mat3x3<f32>(
        vec3<f32>(c, s, 0.0),
        vec3<f32>(-s, c, 0.0),
        vec3<f32>(0.0, 0.0, 1.0),
    );

    // Only draw once born and until the end of its life
    visible *= step(0.0, age_raw) * step(0.0, age) * step(-life_time, -age);

    let particle_pos = input.start_pos + input.start_dir * age + 0.5 * age * age * params.gravity;
    let scale = clamp(1.0 - unit_age, 0.0, 1.0) * {start_scale:?} * visible;

{placement}

    return output;
}}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {{
    {sample}
    if col.a <= params.alphakill {{
        discard;
    }}
    return col;
}}
"#
        );

        ShaderSource {
            variant: *self,
            wgsl,
        }
    }
}

impl Default for ShaderVariant {
    fn default() -> Self {
        Self::from_config(&ParticleConfig::default())
    }
}

/// A generated shader module.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSource {
    pub variant: ShaderVariant,
    pub wgsl: String,
}

impl fmt::Display for ShaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wgsl)
    }
}

/// Fixed-function state for drawing a pool. Face culling is always off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialState {
    pub blending: bool,
    pub depth_test: bool,
    pub depth_write: bool,
    pub render_queue: i32,
}

impl MaterialState {
    pub fn from_config(config: &ParticleConfig) -> Self {
        Self {
            blending: config.blending,
            depth_test: config.depth_test,
            depth_write: config.depth_write,
            render_queue: config.render_queue,
        }
    }
}

/// Shader variant plus render state, with a pending-relink flag.
///
/// Variant changes do not regenerate WGSL immediately. The renderer calls
/// [`Material::relink`] and gets a new module at most once per change.
#[derive(Debug, Clone)]
pub struct Material {
    variant: ShaderVariant,
    state: MaterialState,
    needs_relink: bool,
}

impl Material {
    /// New material; the first [`relink`](Self::relink) yields its shader.
    pub fn new(variant: ShaderVariant, state: MaterialState) -> Self {
        Self {
            variant,
            state,
            needs_relink: true,
        }
    }

    pub fn from_config(config: &ParticleConfig) -> Self {
        Self::new(ShaderVariant::from_config(config), MaterialState::from_config(config))
    }

    pub fn variant(&self) -> &ShaderVariant {
        &self.variant
    }

    pub fn state(&self) -> &MaterialState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MaterialState {
        &mut self.state
    }

    pub fn needs_relink(&self) -> bool {
        self.needs_relink
    }

    /// Replace the variant, flagging a relink if anything changed.
    pub fn set_variant(&mut self, variant: ShaderVariant) {
        if variant != self.variant {
            self.variant = variant;
            self.needs_relink = true;
        }
    }

    /// Take the pending shader, if the variant changed since the last call.
    pub fn relink(&mut self) -> Option<ShaderSource> {
        if !self.needs_relink {
            return None;
        }
        self.needs_relink = false;
        tracing::debug!(target: "particles", variant = ?self.variant, "Regenerating particle shader");
        Some(self.variant.generate())
    }
}
