mod cli;
mod entities;
mod sway;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use meadow_engine::device::{Gpu, GpuInit};
use meadow_engine::logging::{init_logging, LoggingConfig};
use meadow_engine::scene::{Arena, Scene, SceneConfig, StalenessPolicy, TimeBlockConfig};

use cli::Cli;
use entities::{BladeField, Model};
use sway::BladeSway;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LoggingConfig {
        env_filter: cli.log.clone(),
        ..LoggingConfig::default()
    });

    let gpu = pollster::block_on(Gpu::new(GpuInit::default())).context("GPU bring-up failed")?;
    let memory = gpu.memory();

    // Entities are owned here; the scene only keeps handles.
    let mut models = Arena::new();
    let mut blades = Arena::new();

    let staleness = match cli.frames_in_flight {
        Some(frames_in_flight) => StalenessPolicy::Ring { frames_in_flight },
        None => StalenessPolicy::TolerateStale,
    };

    let config = SceneConfig {
        time_block: TimeBlockConfig {
            pad_to_alignment: cli.pad,
            staleness,
            offset_alignment: memory.uniform_offset_alignment(),
            ..TimeBlockConfig::default()
        },
        ..SceneConfig::default()
    };

    let mut scene: Scene<_, Model, BladeField> =
        Scene::new(memory, config).context("failed to create scene")?;

    for i in 0..cli.models {
        let model = Model::ground(gpu.device(), format!("ground {i}"), 8.0);
        scene.add_model(models.insert(model));
    }
    for i in 0..cli.blades {
        let origin = [i as f32 * 8.0, 0.0];
        let name = format!("blades {i}");
        let field = BladeField::patch(gpu.device(), name, origin, cli.blades_per_field);
        scene.add_blades(blades.insert(field));
    }

    for (_, model) in scene.resolve_models(&models) {
        log::info!(
            "model `{}` ({} vertices, {} bytes)",
            model.name,
            model.vertex_count,
            model.vertices.size()
        );
    }
    for (_, field) in scene.resolve_blades(&blades) {
        log::info!("blade field `{}` ({} blades)", field.name, field.count);
    }

    let mut sway = BladeSway::new(gpu.device());
    sway.prepare(gpu.device(), &scene, &blades);

    let frame_budget = Duration::from_secs_f32(1.0 / cli.fps.max(1.0));
    let mut worst_delta = 0.0f32;

    for frame in 0..cli.frames {
        let frame_start = Instant::now();

        let time = scene.update_time();
        worst_delta = worst_delta.max(time.delta_time);

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("meadow frame encoder"),
            });
        sway.record(&mut encoder, scene.time_binding(), &scene, &blades)?;
        gpu.submit(encoder);

        if frame % 60 == 0 {
            log::info!(
                "frame {frame}: dt {:.4}s, t {:.3}s, slot +{}",
                time.delta_time,
                time.total_time,
                scene.time_binding().offset
            );
        }

        if let Some(rest) = frame_budget.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    // The time block must not be released while submitted work can still read it.
    gpu.device()
        .poll(wgpu::PollType::wait_indefinitely())
        .context("failed waiting for GPU idle")?;

    log::info!(
        "ran {} frame(s) in {:.3}s, worst dt {:.4}s",
        scene.frame_count(),
        scene.time().total_time,
        worst_delta
    );

    drop(scene);
    drop(blades);
    drop(models);

    Ok(())
}
