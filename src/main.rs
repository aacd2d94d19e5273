//! Headless emitter demo.
//!
//! ```text
//! particle-pool [config.json] [frames]
//! ```
//!
//! Runs a world-space emitter on an entity circling the origin, with an orbit
//! camera sorting the pool, and logs statistics once per simulated second.
//! Set `RUST_LOG=particles=debug` for lifecycle logs.

use std::env;
use std::process::ExitCode;

use particle_pool::prelude::*;
use particle_pool::Result;
use tracing_subscriber::EnvFilter;

const FRAME_TIME: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: usize = 600;

fn main() -> ExitCode {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(target: "particles", "{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            tracing::info!(target: "particles", %path, "Loading emitter config");
            ParticleConfig::load(path)?
        }
        None => demo_config(),
    };
    let frames = match args.next() {
        Some(arg) => arg
            .parse::<usize>()
            .map_err(|_| ParticleError::InvalidConfiguration(format!("frame count must be an integer, got '{arg}'")))?,
        None => DEFAULT_FRAMES,
    };

    let mut emitter = ParticleComponent::new(config);
    let mut entity = WorldTransform::IDENTITY;
    let mut camera = Camera::new();
    camera.distance = 12.0;

    emitter.attached(&entity)?;
    if let Some(shader) = emitter.relink_shader() {
        tracing::info!(
            target: "particles",
            lines = shader.wgsl.lines().count(),
            billboard = shader.variant.billboard,
            "Generated particle shader"
        );
    }

    let mut uploads = 0;
    for frame in 1..=frames {
        let t = frame as f32 * FRAME_TIME;
        entity.translation = Vec3::new(3.0 * t.cos(), 0.0, 3.0 * t.sin());
        entity.rotation = Mat3::from_rotation_y(-t);
        camera.yaw = 0.2 * t;

        emitter.process(FRAME_TIME, &entity, &camera)?;

        // Stand-in for the renderer's upload pass
        if let Some(buffers) = emitter.buffers_mut() {
            uploads += buffers.dirty_attributes().count();
            buffers.clear_all_dirty();
        }

        if frame % 60 == 0 {
            let time = emitter.time();
            let alive = emitter.particles().iter().filter(|p| p.is_alive_at(time)).count();
            let stats = emitter.stats();
            tracing::info!(
                target: "particles",
                frame,
                time,
                alive,
                emitted = stats.total_emitted,
                overwritten = stats.overwritten_live,
                sorts = stats.sorts,
                uploads,
                "Emitter status"
            );
        }
    }

    let stats = *emitter.stats();
    emitter.detached();
    tracing::info!(
        target: "particles",
        frames = stats.frames,
        emitted = stats.total_emitted,
        "Done"
    );
    Ok(())
}

fn demo_config() -> ParticleConfig {
    ParticleConfig::default()
        .with_shape(ShapeKind::Cone)
        .with_local_space(false)
        .with_emission_rate(50.0)
        .with_start_life_time(2.0)
        .with_max_particles(128)
        .with_gravity(Vec3::new(0.0, -4.0, 0.0))
        .with_sort_mode(SortMode::CameraDistance)
}
