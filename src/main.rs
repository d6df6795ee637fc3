use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::Receiver;
use tracing_subscriber::EnvFilter;

use tag_slam::config::TagSlamConfig;
use tag_slam::io::FrameStream;
use tag_slam::system::{Broadcast, ChannelBroadcaster, RunMode, TagSlamSystem};
use tag_slam::world::WorldModel;

/// Map fiducial tags and localize a camera against them.
#[derive(Parser, Debug)]
#[command(name = "tag-slam", version)]
struct Cli {
    /// Observation CSV (frame, tag_id, tx, ty, tz, qx, qy, qz, qw); tag_id `cam`
    /// marks an external camera estimate.
    frames: PathBuf,

    /// `setup` learns and saves the map; `navigation` localizes against it.
    #[arg(long, default_value_t = RunMode::Navigation)]
    mode: RunMode,

    /// World Model document: written in setup mode, read in navigation mode.
    #[arg(long, default_value = "tag_map.yml")]
    map: PathBuf,

    /// Optional YAML config overriding the defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TagSlamConfig::load_yaml(path)?,
        None => TagSlamConfig::default(),
    };

    let (broadcaster, receiver) = ChannelBroadcaster::bounded(config.broadcast_capacity);
    let mut system = match cli.mode {
        RunMode::Setup => TagSlamSystem::setup(config, broadcaster).with_map_path(&cli.map),
        RunMode::Navigation => {
            let world = WorldModel::open_read_only(&cli.map)
                .with_context(|| format!("Failed to load map {}", cli.map.display()))?;
            TagSlamSystem::navigation(config, world, broadcaster)
        }
    };

    let mut tracked = 0usize;
    for (i, frame) in FrameStream::open(&cli.frames)?.enumerate() {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!("Stopping at frame {}: {:#}", i, e);
                break;
            }
        };

        let result = system.process_frame(&frame);
        if result.is_tracking() {
            tracked += 1;
        }
        drain(&receiver);
    }

    println!(
        "Done! Processed {} frames, tracked {}, {} tags in map, {} broadcasts dropped",
        system.frame_count(),
        tracked,
        system.world().len(),
        system.broadcaster().dropped()
    );

    system.shutdown().context("Failed to persist map")?;

    Ok(())
}

/// Consume everything published for the last frame.
fn drain(receiver: &Receiver<Broadcast>) {
    for message in receiver.try_iter() {
        match message {
            Broadcast::CameraPose { pose } => {
                let t = pose.translation;
                let q = pose.rotation.quaternion();
                println!(
                    "camera t=[{:.3}, {:.3}, {:.3}] q=[{:.4}, {:.4}, {:.4}, {:.4}]",
                    t.x, t.y, t.z, q.i, q.j, q.k, q.w
                );
            }
            Broadcast::TagPose { tag, pose } => {
                let t = pose.translation;
                tracing::trace!("{} at [{:.3}, {:.3}, {:.3}]", tag, t.x, t.y, t.z);
            }
        }
    }
}
