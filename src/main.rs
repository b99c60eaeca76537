//! Background Modeling Demo CLI
//!
//! Runs a background model against a deterministic synthetic scene and
//! reports per-frame mask statistics. Real capture and display are out
//! of scope; this binary exists to exercise the library end to end.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use bgmix::{
    Algorithm, BackgroundModel, FileConfig, ModelConfig, RunConfig, SceneConfig, SyntheticScene,
};

/// Command-line options for the demo run.
#[derive(Debug, Parser)]
#[command(name = "bgmix", version, about = "Per-pixel mixture background modeling demo")]
struct Args {
    /// Algorithm variant (grimson, zivkovic, fuzzy-um, fuzzy-uv).
    #[arg(long, default_value = "zivkovic")]
    algorithm: Algorithm,

    /// TOML configuration file; overrides the other options.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of frames to process.
    #[arg(long, default_value_t = 300)]
    frames: u64,

    /// Scene width in pixels.
    #[arg(long, default_value_t = 160)]
    width: u32,

    /// Scene height in pixels.
    #[arg(long, default_value_t = 120)]
    height: u32,

    /// Generate a grayscale scene instead of color.
    #[arg(long)]
    gray: bool,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    info!("bgmix v{}", bgmix::VERSION);

    let (model_config, scene_config, run_config) = match &args.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => (config.model, config.scene, config.run),
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let scene = SceneConfig {
                width: args.width,
                height: args.height,
                color: !args.gray,
                ..Default::default()
            };
            let run = RunConfig {
                frames: args.frames,
                ..Default::default()
            };
            (ModelConfig::for_algorithm(args.algorithm), scene, run)
        }
    };

    let mut scene = match SyntheticScene::new(scene_config) {
        Ok(scene) => scene,
        Err(e) => {
            eprintln!("Invalid scene: {}", e);
            std::process::exit(1);
        }
    };

    let mut model = match BackgroundModel::new(model_config) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Invalid model configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Processing frames...");

    let mut peak_ratio = 0.0f64;
    for index in 0..run_config.frames {
        let frame = scene.next_frame();
        let segmentation = match model.update(&frame) {
            Ok(segmentation) => segmentation,
            Err(e) => {
                warn!("Frame {} rejected: {}", index, e);
                continue;
            }
        };

        let ratio = segmentation.mask.foreground_ratio();
        // The bootstrap frame is all-foreground by contract; skip it
        // when tracking the peak.
        if index > 0 {
            peak_ratio = peak_ratio.max(ratio);
        }

        if run_config.log_every > 0 && index % run_config.log_every == 0 {
            info!(
                frame = index,
                foreground = segmentation.mask.foreground_count(),
                ratio,
                "mask statistics"
            );
        }
    }

    info!(
        "Processed {} frames: peak foreground ratio {:.4}",
        run_config.frames, peak_ratio
    );
}
