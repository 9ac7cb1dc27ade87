//! Headless driver for the demo scene

use anyhow::{Context, Result};
use clap::Parser;
use critter_rig::config::SceneConfig;
use critter_rig::demo::{self, DemoScene};
use critter_rig::settings::Settings;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "critter-rig")]
#[command(about = "Run the procedural creature demo scene without a window", long_about = None)]
#[command(version)]
struct Cli {
    /// Frames to simulate (overrides stored settings)
    #[arg(short, long)]
    frames: Option<u32>,

    /// Simulation rate in frames per second (overrides stored settings)
    #[arg(long)]
    fps: Option<f32>,

    /// JSON scene configuration; missing fields keep their defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write final world transforms and colors as JSON
    #[arg(short, long)]
    dump: Option<PathBuf>,

    /// Persist the effective frame settings for later runs
    #[arg(long)]
    save_settings: bool,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Serialize)]
struct NodeDump {
    id: usize,
    name: Option<String>,
    world: Vec<f32>, // Column-major 4x4
    color: Option<[f32; 3]>,
}

fn dump_scene(scene: &DemoScene, pretty: bool) -> Result<String> {
    let mut nodes = Vec::with_capacity(scene.system.graph().len());
    scene.system.graph().visit_world(|id, node, world| {
        nodes.push(NodeDump {
            id: id.index(),
            name: node.name.clone(),
            world: world.as_slice().to_vec(),
            color: node.color.map(|c| [c.x, c.y, c.z]),
        });
    });
    nodes.sort_by_key(|n| n.id);
    let text = if pretty {
        serde_json::to_string_pretty(&nodes)?
    } else {
        serde_json::to_string(&nodes)?
    };
    Ok(text)
}

fn log_states(scene: &DemoScene) {
    for (_, controller) in scene.system.controllers() {
        match controller.as_controller() {
            Some(c) => log::info!(
                "{:>10}: {:<10} state_time={:.2} total={:.2}",
                controller.label(),
                c.current_state_name(),
                c.state_time(),
                c.total_time()
            ),
            None => log::info!(
                "{:>10}: {}",
                controller.label(),
                if controller.is_finished() { "finished" } else { "running" }
            ),
        }
    }
}

/// Log filter used when `RUST_LOG` is unset; `-v` shows state transitions
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter(cli.verbose)),
    )
    .init();

    let mut settings = Settings::load();
    if let Some(frames) = cli.frames {
        settings.driver.frames = frames;
    }
    if let Some(fps) = cli.fps {
        settings.driver.fps = fps;
    }
    if cli.save_settings {
        settings.save();
    }

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("Failed to load scene config '{}'", path.display()))?,
        None => SceneConfig::default(),
    };

    let mut scene = demo::build_scene(&config).context("Failed to build demo scene")?;
    let dt = settings.driver.frame_time();
    let interval = settings.driver.log_interval;
    log::info!(
        "simulating {} frames at {:.1} fps ({} nodes, {} controllers)",
        settings.driver.frames,
        1.0 / dt,
        scene.system.graph().len(),
        scene.system.len()
    );

    for frame in 0..settings.driver.frames {
        scene.system.update(dt);
        if interval > 0 && frame % interval == 0 {
            log::info!("frame {frame} t={:.2}", scene.system.elapsed());
            log_states(&scene);
        }
    }
    log_states(&scene);

    if let Some(path) = &cli.dump {
        let text = dump_scene(&scene, settings.output.dump_pretty)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        log::info!("world transforms written to {}", path.display());
    } else if settings.output.dump_world_transforms {
        println!("{}", dump_scene(&scene, settings.output.dump_pretty)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_selects_logger_filter() {
        let cli = Cli::try_parse_from(["critter-rig", "-v", "--frames", "2"]).unwrap();
        assert_eq!(default_filter(cli.verbose), "debug");
        let cli = Cli::try_parse_from(["critter-rig", "-vv"]).unwrap();
        assert_eq!(default_filter(cli.verbose), "trace");
        let cli = Cli::try_parse_from(["critter-rig"]).unwrap();
        assert_eq!(default_filter(cli.verbose), "info");
    }
}
