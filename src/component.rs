//! The particle pool controller.
//!
//! [`ParticleComponent`] owns a pool, its packed vertex buffers and the
//! emitter clock. The host drives it through the entity lifecycle:
//!
//! ```
//! use glam::Vec3;
//! use particle_pool::{FrameContext, ParticleComponent, ParticleConfig, WorldTransform};
//!
//! let config = ParticleConfig::default()
//!     .with_local_space(false)
//!     .with_max_particles(64)
//!     .with_seed(7);
//! let mut emitter = ParticleComponent::new(config);
//!
//! emitter.attached(&WorldTransform::IDENTITY)?;
//! let report = emitter.advance(0.5, &FrameContext::default())?;
//! assert_eq!(report.emitted, 5);
//!
//! emitter.detached();
//! # Ok::<(), particle_pool::ParticleError>(())
//! ```
//!
//! Particle motion is never integrated here. Every slot carries its emission
//! record and the vertex shader evaluates the trajectory, so a frame only
//! touches the buffers on emission, sorting or a rebuild.

use glam::{Mat4, Vec3, Vec4};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::buffers::VertexBuffers;
use crate::clock::EmitterClock;
use crate::config::{self, ParticleConfig, SortMode};
use crate::entity::{CameraView, EmitterEntity, FrameContext, WorldTransform};
use crate::error::{ParticleError, Result};
use crate::particle::Particle;
use crate::pool::ParticlePool;
use crate::shader::{Material, ShaderSource, ShaderVariant};
use crate::shape::{self, ShapeKind};
use crate::uniforms::{ParticleUniforms, ViewUniforms};

/// Running counters for one component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Ticks since attach.
    pub frames: u64,
    /// Emissions since attach.
    pub total_emitted: u64,
    /// Emissions that recycled a particle still within its life span.
    pub overwritten_live: u64,
    /// Ticks that ran the camera-distance sort.
    pub sorts: u64,
}

/// What one [`ParticleComponent::advance`] call did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Simulation time after the tick.
    pub time: f32,
    /// Times the clock wrapped during the tick.
    pub wraps: u32,
    /// Particles emitted during the tick.
    pub emitted: u32,
    /// Draw-order moves made by the sort, if it ran.
    pub sort_moves: Option<usize>,
}

/// State that only exists while attached to an entity.
#[derive(Debug)]
struct Attachment {
    buffers: VertexBuffers,
    transform: WorldTransform,
}

/// Particle emitter component.
#[derive(Debug)]
pub struct ParticleComponent {
    config: ParticleConfig,
    material: Material,
    clock: EmitterClock,
    pool: ParticlePool,
    attachment: Option<Attachment>,
    uniforms: ParticleUniforms,
    next_emit: usize,
    rng: SmallRng,
    stats: PoolStats,
}

impl ParticleComponent {
    /// Create a detached component.
    ///
    /// The configuration is not checked until [`attached`](Self::attached).
    pub fn new(config: ParticleConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            material: Material::from_config(&config),
            clock: EmitterClock::new(config.duration, config.looping),
            uniforms: Self::uniforms_for(&config, config.gravity, 0.0),
            pool: ParticlePool::new(),
            attachment: None,
            next_emit: 0,
            rng,
            stats: PoolStats::default(),
            config,
        }
    }

    /// Attach to `entity`: allocate the pool and buffers, initialize every
    /// slot and pack them.
    pub fn attached(&mut self, entity: &dyn EmitterEntity) -> Result<()> {
        if self.attachment.is_some() {
            return Err(ParticleError::Attachment("component is already attached".into()));
        }
        self.config.validate()?;
        let transform = entity
            .world_transform()
            .ok_or_else(|| ParticleError::Attachment("entity has no world transform".into()))?;

        let max = self.config.max_particles;
        let sustained = self.config.emission_rate * self.config.start_life_time;
        if !self.config.local_space && sustained > max as f32 {
            tracing::warn!(
                target: "particles",
                max_particles = max,
                needed = sustained,
                "Pool too small for emission rate; live particles will be recycled"
            );
        }

        self.pool = ParticlePool::with_len(max, self.config.start_life_time);
        self.attachment = Some(Attachment {
            buffers: VertexBuffers::new(max, &self.config.mesh),
            transform,
        });
        self.clock = EmitterClock::new(self.config.duration, self.config.looping);
        self.next_emit = 0;
        self.stats = PoolStats::default();
        self.refresh_uniforms(&transform);
        self.rebuild();

        tracing::debug!(
            target: "particles",
            max_particles = max,
            local_space = self.config.local_space,
            shape = %self.config.shape,
            "Particle component attached"
        );
        Ok(())
    }

    /// Release buffers and empty the pool. Safe to call when detached.
    pub fn detached(&mut self) {
        if self.attachment.take().is_some() {
            tracing::debug!(target: "particles", emitted = self.stats.total_emitted, "Particle component detached");
        }
        self.pool.clear();
        self.next_emit = 0;
    }

    /// Change the pool capacity, regenerating every slot.
    ///
    /// Works detached as well; the new capacity then applies on attach.
    /// A rejected capacity or configuration leaves the pool untouched.
    pub fn resize(&mut self, new_max: usize) -> Result<()> {
        config::validate_capacity(new_max)?;
        if new_max == self.config.max_particles {
            return Ok(());
        }
        ParticleConfig {
            max_particles: new_max,
            ..self.config.clone()
        }
        .validate()?;
        let old = self.config.max_particles;
        self.config.max_particles = new_max;

        if let Some(attachment) = self.attachment.as_mut() {
            self.pool.resize(new_max, self.config.start_life_time);
            attachment.buffers.resize(new_max, &self.config.mesh);
            self.next_emit %= new_max;
            self.rebuild();
        }

        tracing::debug!(target: "particles", from = old, to = new_max, "Particle pool resized");
        Ok(())
    }

    /// Per-frame tick.
    ///
    /// Advances the clock, refreshes uniforms, sorts when enabled, then emits
    /// the particles due this tick in world-space mode.
    pub fn advance(&mut self, dt: f32, frame: &FrameContext) -> Result<FrameReport> {
        let Some(attachment) = self.attachment.as_mut() else {
            return Err(ParticleError::NotAttached);
        };
        attachment.transform = frame.transform;

        let tick = self.clock.advance(dt);
        self.stats.frames += 1;
        self.refresh_uniforms(&frame.transform);

        let sort_moves = match self.config.sort_mode {
            SortMode::CameraDistance => Some(self.sort_by_camera(frame)),
            SortMode::None => None,
        };

        let mut emitted = 0;
        if !self.config.local_space {
            emitted = tick.emission_count(self.config.emission_rate);
            let params = self.config.shape_params();
            for _ in 0..emitted {
                let (position, direction) = shape::generate(self.config.shape, &params, &mut self.rng);
                let world_position = frame.transform.transform_point(position);
                let world_direction = frame.transform.rotate_vector(direction);
                self.emit_one(world_position, world_direction)?;
            }
        }

        Ok(FrameReport {
            time: tick.time,
            wraps: tick.wraps,
            emitted,
            sort_moves,
        })
    }

    /// [`advance`](Self::advance) with the entity and camera queried directly.
    pub fn process(&mut self, dt: f32, entity: &dyn EmitterEntity, camera: &dyn CameraView) -> Result<FrameReport> {
        if self.attachment.is_none() {
            return Err(ParticleError::NotAttached);
        }
        let frame = FrameContext::capture(entity, camera)
            .ok_or_else(|| ParticleError::Attachment("entity lost its world transform".into()))?;
        self.advance(dt, &frame)
    }

    /// Emit one particle now, recycling the next slot in ring order.
    ///
    /// The previous occupant is overwritten even if it is still alive.
    /// Returns the allocation index of the claimed particle.
    pub fn emit_one(&mut self, world_position: Vec3, world_direction: Vec3) -> Result<usize> {
        let Some(attachment) = self.attachment.as_mut() else {
            return Err(ParticleError::NotAttached);
        };

        let index = self.next_emit;
        self.next_emit = (self.next_emit + 1) % self.pool.len();

        let time = self.clock.time();
        let particle = &mut self.pool.particles_mut()[index];
        if particle.is_alive_at(time) {
            self.stats.overwritten_live += 1;
            tracing::trace!(target: "particles", index, "Recycling live particle");
        }
        particle.emit_time = time;
        particle.start_position = world_position;
        particle.start_direction = world_direction;
        particle.active = 1.0;

        let particle = *particle;
        attachment.buffers.pack_one(self.pool.slot_of(index), &particle);
        self.stats.total_emitted += 1;
        Ok(index)
    }

    /// Take the regenerated shader if a variant setting changed.
    pub fn relink_shader(&mut self) -> Option<ShaderSource> {
        self.material.relink()
    }

    // Setters

    /// Change the start speed; regenerates every slot when attached.
    pub fn set_start_speed(&mut self, speed: f32) {
        if self.config.start_speed != speed {
            self.config.start_speed = speed;
            if self.attachment.is_some() {
                self.rebuild();
            }
        }
    }

    pub fn set_max_particles(&mut self, max: usize) -> Result<()> {
        self.resize(max)
    }

    pub fn set_billboard(&mut self, billboard: bool) {
        self.config.billboard = billboard;
        self.sync_variant();
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.config.looping = looping;
        self.clock.set_looping(looping);
        self.sync_variant();
    }

    pub fn set_textured(&mut self, textured: bool) {
        self.config.textured = textured;
        self.sync_variant();
    }

    pub fn set_start_size(&mut self, size: f32) {
        self.config.start_size = size;
        self.sync_variant();
    }

    pub fn set_duration(&mut self, duration: f32) {
        self.config.duration = duration;
        self.clock.set_duration(duration);
    }

    pub fn set_blending(&mut self, blending: bool) {
        self.config.blending = blending;
        self.material.state_mut().blending = blending;
    }

    pub fn set_depth_test(&mut self, depth_test: bool) {
        self.config.depth_test = depth_test;
        self.material.state_mut().depth_test = depth_test;
    }

    pub fn set_depth_write(&mut self, depth_write: bool) {
        self.config.depth_write = depth_write;
        self.material.state_mut().depth_write = depth_write;
    }

    pub fn set_render_queue(&mut self, render_queue: i32) {
        self.config.render_queue = render_queue;
        self.material.state_mut().render_queue = render_queue;
    }

    pub fn set_alphakill(&mut self, alphakill: f32) {
        self.config.alphakill = alphakill;
        self.uniforms.alphakill = alphakill;
    }

    pub fn set_texture_tiles(&mut self, x: f32, y: f32) {
        self.config.texture_tiles_x = x;
        self.config.texture_tiles_y = y;
        self.uniforms.texture_tile_info = self.config.texture_tile_info();
    }

    /// Takes effect on the next tick.
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
    }

    /// Takes effect on the next tick.
    pub fn set_start_color(&mut self, color: Vec4) {
        self.config.start_color = color;
    }

    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.config.sort_mode = mode;
    }

    /// Rejects a non-positive or non-finite rate, keeping the current one.
    pub fn set_emission_rate(&mut self, rate: f32) -> Result<()> {
        config::validate_emission_rate(rate)?;
        self.config.emission_rate = rate;
        Ok(())
    }

    /// Applies to subsequent emissions and rebuilds.
    pub fn set_shape(&mut self, shape: ShapeKind) {
        self.config.shape = shape;
    }

    // Accessors

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Configured capacity (the pool length while attached).
    pub fn max_particles(&self) -> usize {
        self.config.max_particles
    }

    /// Particles in allocation (ring) order.
    pub fn particles(&self) -> &[Particle] {
        self.pool.particles()
    }

    /// Allocation indices in buffer slot order.
    pub fn draw_order(&self) -> &[usize] {
        self.pool.draw_order()
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    /// Packed buffers, while attached.
    pub fn buffers(&self) -> Option<&VertexBuffers> {
        self.attachment.as_ref().map(|a| &a.buffers)
    }

    /// Mutable buffers, for the renderer to clear dirty flags after upload.
    pub fn buffers_mut(&mut self) -> Option<&mut VertexBuffers> {
        self.attachment.as_mut().map(|a| &mut a.buffers)
    }

    pub fn uniforms(&self) -> &ParticleUniforms {
        &self.uniforms
    }

    /// Matrix the pool is drawn with: the emitter's in local space, identity in world space.
    pub fn render_world_matrix(&self) -> Mat4 {
        match &self.attachment {
            Some(attachment) if self.config.local_space => attachment.transform.matrix(),
            _ => Mat4::IDENTITY,
        }
    }

    /// View block for drawing this pool with the given camera matrices.
    pub fn view_uniforms(&self, view: Mat4, projection: Mat4) -> ViewUniforms {
        ViewUniforms::new(view, projection, self.render_world_matrix())
    }

    /// Current simulation time.
    pub fn time(&self) -> f32 {
        self.clock.time()
    }

    pub fn clock(&self) -> &EmitterClock {
        &self.clock
    }

    /// Allocation index the next emission will claim.
    pub fn next_emit_index(&self) -> usize {
        self.next_emit
    }

    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    // Internals

    /// Reinitialize every particle for the current mode and pack the full buffers.
    fn rebuild(&mut self) {
        let Some(attachment) = self.attachment.as_mut() else {
            return;
        };
        let config = &self.config;
        let params = config.shape_params();
        let rate = config.emission_rate;
        let cycle = config.duration * rate;

        for (i, particle) in self.pool.particles_mut().iter_mut().enumerate() {
            particle.life_time = config.start_life_time;
            particle.active = 1.0;

            if config.local_space {
                let offset = i as f32 / rate;
                particle.emit_time = if config.pre_warm { -offset } else { offset };
                // At most one loop cycle's worth of particles starts visible
                if config.looping && i as f32 >= cycle {
                    particle.active = 0.0;
                }
            } else {
                // Long expired, ready to be claimed
                particle.emit_time = -2.0 * particle.life_time;
            }

            let (position, direction) = shape::generate(config.shape, &params, &mut self.rng);
            particle.start_position = position;
            particle.start_direction = direction;
        }

        attachment.buffers.pack_all(self.pool.iter_draw_order(), &config.mesh);
    }

    /// Recompute sort keys, reorder the draw view and repack moved slots.
    fn sort_by_camera(&mut self, frame: &FrameContext) -> usize {
        let time = self.clock.time();
        let looping = self.config.looping;
        let local_space = self.config.local_space;
        let gravity = self.uniforms.gravity();
        let view_direction = frame.view_direction;

        for particle in self.pool.particles_mut() {
            let position = particle.position_after(particle.draw_age(time, looping), gravity);
            let world = if local_space {
                frame.transform.transform_point(position)
            } else {
                position
            };
            particle.sort_value = -world.dot(view_direction);
        }

        let moves = self.pool.sort_by_value();
        self.stats.sorts += 1;

        if moves > 0 {
            if let Some(attachment) = self.attachment.as_mut() {
                for (slot, particle) in self.pool.iter_draw_order().enumerate() {
                    attachment.buffers.pack_one(slot, particle);
                }
            }
        }
        moves
    }

    fn refresh_uniforms(&mut self, transform: &WorldTransform) {
        // Only local space rotates gravity into the emitter frame; world space draws with identity
        let gravity = if self.config.local_space {
            transform.inverse_rotate_vector(self.config.gravity)
        } else {
            self.config.gravity
        };
        self.uniforms = Self::uniforms_for(&self.config, gravity, self.clock.time());
    }

    fn uniforms_for(config: &ParticleConfig, gravity: Vec3, time: f32) -> ParticleUniforms {
        ParticleUniforms::new(
            gravity,
            time,
            config.start_color,
            config.texture_tile_info(),
            config.alphakill,
        )
    }

    fn sync_variant(&mut self) {
        self.material.set_variant(ShaderVariant::from_config(&self.config));
    }
}

/// Copies the configuration only. The clone starts detached with a fresh pool.
impl Clone for ParticleComponent {
    fn clone(&self) -> Self {
        Self::new(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::Attribute;
    use crate::camera::Camera;
    use glam::Mat3;

    fn world_space(max: usize, rate: f32) -> ParticleConfig {
        ParticleConfig::default()
            .with_local_space(false)
            .with_max_particles(max)
            .with_emission_rate(rate)
            .with_seed(42)
    }

    fn attached(config: ParticleConfig) -> ParticleComponent {
        let mut component = ParticleComponent::new(config);
        component.attached(&WorldTransform::IDENTITY).unwrap();
        component
    }

    struct NoTransform;

    impl EmitterEntity for NoTransform {
        fn world_transform(&self) -> Option<WorldTransform> {
            None
        }
    }

    #[test]
    fn test_attach_allocates_pool_and_buffers() {
        let component = attached(ParticleConfig::default().with_max_particles(16).with_seed(1));
        assert!(component.is_attached());
        assert_eq!(component.particles().len(), 16);

        let buffers = component.buffers().unwrap();
        for attribute in Attribute::ALL {
            assert_eq!(buffers.data(attribute).len(), 16 * 4 * attribute.components());
        }
        assert_eq!(buffers.indices().len(), 16 * 6);
    }

    #[test]
    fn test_attach_failures() {
        let mut component = ParticleComponent::new(ParticleConfig::default());
        let err = component.attached(&NoTransform).unwrap_err();
        assert!(matches!(err, ParticleError::Attachment(_)));
        assert!(!component.is_attached());

        let mut zero = ParticleComponent::new(ParticleConfig::default().with_max_particles(0));
        let err = zero.attached(&WorldTransform::IDENTITY).unwrap_err();
        assert!(matches!(err, ParticleError::InvalidConfiguration(_)));

        component.attached(&WorldTransform::IDENTITY).unwrap();
        let err = component.attached(&WorldTransform::IDENTITY).unwrap_err();
        assert!(matches!(err, ParticleError::Attachment(_)));
    }

    #[test]
    fn test_local_space_prewarm_init() {
        let config = ParticleConfig::default()
            .with_max_particles(8)
            .with_emission_rate(2.0)
            .with_duration(2.0)
            .with_seed(3);
        let component = attached(config);

        for (i, p) in component.particles().iter().enumerate() {
            assert_eq!(p.emit_time, -(i as f32) / 2.0);
            assert_eq!(p.life_time, 5.0);
            // One cycle is 4 particles
            let expected = if i < 4 { 1.0 } else { 0.0 };
            assert_eq!(p.active, expected, "slot {i}");
        }
    }

    #[test]
    fn test_local_space_without_prewarm_or_loop() {
        let config = ParticleConfig::default()
            .with_max_particles(6)
            .with_emission_rate(3.0)
            .with_pre_warm(false)
            .with_looping(false)
            .with_seed(3);
        let component = attached(config);
        for (i, p) in component.particles().iter().enumerate() {
            assert_eq!(p.emit_time, i as f32 / 3.0);
            assert_eq!(p.active, 1.0);
        }
    }

    #[test]
    fn test_world_space_init_is_expired() {
        let component = attached(world_space(5, 2.0));
        for p in component.particles() {
            assert_eq!(p.active, 1.0);
            assert_eq!(p.emit_time, -10.0);
            assert!(!p.is_alive_at(0.0));
        }
    }

    #[test]
    fn test_end_to_end_two_emissions() {
        let config = world_space(4, 2.0).with_duration(100.0).with_looping(false);
        let mut component = attached(config);
        let frame = FrameContext::default();

        let first = component.advance(0.5, &frame).unwrap();
        let second = component.advance(0.5, &frame).unwrap();
        assert_eq!(first.emitted + second.emitted, 2);

        let particles = component.particles();
        assert_eq!(particles[0].emit_time, 0.5);
        assert_eq!(particles[1].emit_time, 1.0);
        assert_eq!(component.next_emit_index(), 2);
        assert_eq!(component.stats().total_emitted, 2);

        // Slot 0's TIME_INFO carries the emission time on every vertex
        let buffers = component.buffers().unwrap();
        for vertex in buffers.slot_data(Attribute::TimeInfo, 0).chunks_exact(4) {
            assert_eq!(vertex, &[5.0, 1.0, 5.0, 0.5]);
        }
    }

    #[test]
    fn test_local_space_never_emits() {
        let mut component = attached(ParticleConfig::default().with_max_particles(8).with_seed(1));
        let report = component.advance(1.0, &FrameContext::default()).unwrap();
        assert_eq!(report.emitted, 0);
        assert_eq!(component.stats().total_emitted, 0);
    }

    #[test]
    fn test_emission_uses_entity_transform() {
        let config = world_space(4, 1.0).with_shape(ShapeKind::Cube).with_start_speed(2.0);
        let mut component = attached(config);
        let transform =
            WorldTransform::from_translation(Vec3::new(100.0, 0.0, 0.0)).with_rotation(Mat3::from_rotation_x(std::f32::consts::PI));
        let frame = FrameContext::new(transform, Vec3::NEG_Z);

        component.advance(1.0, &frame).unwrap();
        let p = component.particles()[0];
        assert!((p.start_position.x - 100.0).abs() <= 0.5 + 1e-4);
        // Cube emits straight up, flipped by the rotation
        assert!((p.start_direction - Vec3::new(0.0, -2.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_ring_wraps_and_counts_live_overwrites() {
        let mut component = attached(world_space(3, 1.0));
        for _ in 0..3 {
            component.emit_one(Vec3::ZERO, Vec3::Y).unwrap();
        }
        assert_eq!(component.next_emit_index(), 0);
        assert_eq!(component.stats().overwritten_live, 0);

        // All three are alive at t = 0 with a 5 s lifetime
        assert_eq!(component.emit_one(Vec3::ONE, Vec3::Y).unwrap(), 0);
        assert_eq!(component.stats().overwritten_live, 1);
    }

    #[test]
    fn test_detached_operations() {
        let mut component = attached(world_space(4, 1.0));
        component.detached();
        component.detached();
        assert!(!component.is_attached());
        assert!(component.particles().is_empty());
        assert!(component.buffers().is_none());

        assert!(matches!(
            component.advance(0.1, &FrameContext::default()),
            Err(ParticleError::NotAttached)
        ));
        assert!(matches!(
            component.emit_one(Vec3::ZERO, Vec3::Y),
            Err(ParticleError::NotAttached)
        ));
        assert!(matches!(
            component.process(0.1, &WorldTransform::IDENTITY, &Vec3::NEG_Z),
            Err(ParticleError::NotAttached)
        ));

        // Reattach starts over
        component.attached(&WorldTransform::IDENTITY).unwrap();
        assert_eq!(component.particles().len(), 4);
        assert_eq!(component.time(), 0.0);
    }

    #[test]
    fn test_process_requires_transform() {
        let mut component = attached(world_space(4, 1.0));
        let err = component.process(0.1, &NoTransform, &Vec3::NEG_Z).unwrap_err();
        assert!(matches!(err, ParticleError::Attachment(_)));
        assert!(component.process(0.1, &WorldTransform::IDENTITY, &Camera::new()).is_ok());
    }

    #[test]
    fn test_resize() {
        let mut component = attached(world_space(8, 1.0));
        for _ in 0..6 {
            component.emit_one(Vec3::ZERO, Vec3::Y).unwrap();
        }

        component.resize(8).unwrap();
        assert_eq!(component.next_emit_index(), 6);

        component.resize(4).unwrap();
        assert_eq!(component.particles().len(), 4);
        assert_eq!(component.buffers().unwrap().capacity(), 4);
        assert!(component.next_emit_index() < 4);

        let err = component.resize(0).unwrap_err();
        assert!(matches!(err, ParticleError::InvalidConfiguration(_)));
        assert_eq!(component.max_particles(), 4);

        component.set_max_particles(8).unwrap();
        let buffers = component.buffers().unwrap();
        assert_eq!(buffers.data(Attribute::StartPos).len(), 8 * 4 * 3);
    }

    #[test]
    fn test_resize_while_detached_applies_on_attach() {
        let mut component = ParticleComponent::new(world_space(8, 1.0));
        component.resize(3).unwrap();
        component.attached(&WorldTransform::IDENTITY).unwrap();
        assert_eq!(component.particles().len(), 3);
    }

    #[test]
    fn test_rejected_rate_keeps_rebuilds_finite() {
        let mut component = attached(ParticleConfig::default().with_max_particles(4).with_seed(42));

        for rate in [0.0, -2.0, f32::NAN, f32::INFINITY] {
            let err = component.set_emission_rate(rate).unwrap_err();
            assert!(matches!(err, ParticleError::InvalidConfiguration(_)));
        }
        assert_eq!(component.config().emission_rate, 10.0);

        component.resize(6).unwrap();
        component.set_start_speed(2.0);
        assert!(component.particles().iter().all(|p| p.emit_time.is_finite()));
        let time_info = component.buffers().unwrap().data(Attribute::TimeInfo);
        assert!(time_info.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_resize_rejects_invalid_config_untouched() {
        let mut component = attached(world_space(4, 2.0));
        component.emit_one(Vec3::ONE, Vec3::Y).unwrap();
        let before = component.particles().to_vec();
        component.set_duration(0.0);

        let err = component.resize(6).unwrap_err();
        assert!(matches!(err, ParticleError::InvalidConfiguration(_)));
        assert_eq!(component.max_particles(), 4);
        assert_eq!(component.particles(), before.as_slice());
        assert_eq!(component.buffers().unwrap().capacity(), 4);
        assert_eq!(component.next_emit_index(), 1);
    }

    #[test]
    fn test_sort_orders_back_to_front() {
        let config = world_space(6, 1.0).with_sort_mode(SortMode::CameraDistance);
        let mut component = attached(config);
        for z in [3.0, -1.0, 5.0, 0.0, -4.0, 2.0] {
            component.emit_one(Vec3::new(0.0, 0.0, z), Vec3::ZERO).unwrap();
        }

        let report = component.advance(0.0, &FrameContext::new(WorldTransform::IDENTITY, Vec3::NEG_Z)).unwrap();
        assert!(report.sort_moves.unwrap() > 0);

        // Looking down -Z, the farthest particle (most negative z) draws first
        let keys: Vec<f32> = component.pool().iter_draw_order().map(|p| p.sort_value).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]), "{keys:?}");
        let first = component.pool().in_slot(0);
        assert_eq!(first.start_position.z, -4.0);
        assert_eq!(component.stats().sorts, 1);
    }

    #[test]
    fn test_sort_repack_matches_full_pack() {
        let config = world_space(5, 1.0).with_sort_mode(SortMode::CameraDistance);
        let mut component = attached(config.clone());
        for x in [2.0, -3.0, 1.0, 4.0, -1.0] {
            component.emit_one(Vec3::new(x, 0.0, 0.0), Vec3::X).unwrap();
        }
        component.advance(0.1, &FrameContext::new(WorldTransform::IDENTITY, Vec3::X)).unwrap();

        let mut expected = VertexBuffers::new(5, &config.mesh);
        expected.pack_all(component.pool().iter_draw_order(), &config.mesh);

        let buffers = component.buffers().unwrap();
        for attribute in Attribute::ALL {
            assert_eq!(buffers.data(attribute), expected.data(attribute), "{}", attribute.name());
        }
        assert_eq!(buffers.indices(), expected.indices());
    }

    #[test]
    fn test_emission_after_sort_packs_current_slot() {
        let config = world_space(4, 1.0).with_sort_mode(SortMode::CameraDistance);
        let mut component = attached(config);
        for z in [1.0, 2.0, 3.0, 4.0] {
            component.emit_one(Vec3::new(0.0, 0.0, z), Vec3::ZERO).unwrap();
        }
        component.advance(0.0, &FrameContext::new(WorldTransform::IDENTITY, Vec3::Z)).unwrap();

        let index = component.emit_one(Vec3::new(9.0, 9.0, 9.0), Vec3::ZERO).unwrap();
        let slot = component.pool().slot_of(index);
        let start_pos = component.buffers().unwrap().slot_data(Attribute::StartPos, slot);
        assert_eq!(&start_pos[..3], &[9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_gravity_uniform_frame() {
        let rotation = Mat3::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let transform = WorldTransform::IDENTITY.with_rotation(rotation);
        let frame = FrameContext::new(transform, Vec3::NEG_Z);
        let gravity = Vec3::new(0.0, -10.0, 0.0);

        let mut local = ParticleComponent::new(ParticleConfig::default().with_gravity(gravity).with_seed(1));
        local.attached(&transform).unwrap();
        local.advance(0.1, &frame).unwrap();
        assert!((local.uniforms().gravity() - Vec3::new(-10.0, 0.0, 0.0)).length() < 1e-4);
        assert_eq!(local.render_world_matrix(), transform.matrix());

        let mut world = ParticleComponent::new(world_space(4, 1.0).with_gravity(gravity));
        world.attached(&transform).unwrap();
        world.advance(0.1, &frame).unwrap();
        assert_eq!(world.uniforms().gravity(), gravity);
        assert_eq!(world.render_world_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_uniforms_track_clock_and_color() {
        let mut component = attached(ParticleConfig::default().with_seed(1));
        component.set_start_color(Vec4::new(1.0, 0.0, 0.0, 0.5));
        component.set_alphakill(0.2);
        component.advance(0.25, &FrameContext::default()).unwrap();

        let uniforms = component.uniforms();
        assert_eq!(uniforms.time, 0.25);
        assert_eq!(uniforms.color(), Vec4::new(1.0, 0.0, 0.0, 0.5));
        assert_eq!(uniforms.alphakill, 0.2);
    }

    #[test]
    fn test_variant_setters_relink_once() {
        let mut component = ParticleComponent::new(ParticleConfig::default());
        assert!(component.relink_shader().is_some());
        assert!(component.relink_shader().is_none());

        component.set_billboard(false);
        component.set_start_size(2.0);
        let source = component.relink_shader().unwrap();
        assert!(!source.variant.billboard);
        assert_eq!(source.variant.start_scale, 2.0);
        assert!(component.relink_shader().is_none());

        // Render state changes never need a relink
        component.set_blending(false);
        component.set_depth_write(false);
        assert!(component.relink_shader().is_none());
        assert!(!component.material().state().blending);
    }

    #[test]
    fn test_start_speed_rebuilds() {
        let config = ParticleConfig::default()
            .with_shape(ShapeKind::Cube)
            .with_max_particles(4)
            .with_seed(5);
        let mut component = attached(config);
        component.set_start_speed(5.0);

        component.set_start_speed(9.0);
        for p in component.particles() {
            assert_eq!(p.start_direction, Vec3::new(0.0, 9.0, 0.0));
        }
        let dir = component.buffers().unwrap().slot_data(Attribute::StartDir, 2);
        assert_eq!(&dir[..3], &[0.0, 9.0, 0.0]);
    }

    #[test]
    fn test_clone_copies_config_only() {
        let mut original = attached(world_space(4, 2.0));
        original.advance(1.0, &FrameContext::default()).unwrap();

        let copy = original.clone();
        assert!(!copy.is_attached());
        assert!(copy.particles().is_empty());
        assert_eq!(copy.time(), 0.0);
        assert_eq!(copy.config(), original.config());
    }

    #[test]
    fn test_looping_wrap_keeps_emitting() {
        let config = world_space(64, 4.0).with_duration(2.0).with_looping(true);
        let mut component = attached(config);
        let mut total = 0;
        for _ in 0..32 {
            total += component.advance(0.125, &FrameContext::default()).unwrap().emitted;
        }
        // 4 s is two full cycles of 8
        assert_eq!(total, 16);
        assert_eq!(component.time(), 2.0);
        assert_eq!(component.clock().cycles(), 1);
    }
}
