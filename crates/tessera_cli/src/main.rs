//! `tessera` - render a JSON scene file to an image.

mod output;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tessera_renderer::{render_with_progress, RenderConfig, RenderProgress, DEFAULT_BUCKET_SIZE};
use tessera_scene::SceneLoader;

#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Monte-Carlo path tracer for JSON scenes")]
struct Cli {
    /// Scene description (JSON)
    scene: PathBuf,

    /// Output image; `.ppm` is written as plain text, other extensions are encoded
    #[arg(short, long, default_value = "out.png")]
    output: PathBuf,

    /// Samples per pixel
    #[arg(long, default_value_t = 100)]
    spp: u32,

    /// Maximum bounce depth
    #[arg(long, default_value_t = 50)]
    max_depth: u32,

    /// Bucket edge length in pixels
    #[arg(long, default_value_t = DEFAULT_BUCKET_SIZE)]
    bucket_size: u32,

    /// Worker threads (0 = one per core)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Base seed for reproducible renders
    #[arg(long)]
    seed: Option<u64>,

    /// Override the camera's image height
    #[arg(long)]
    height: Option<u32>,

    /// Find lights only through BSDF sampling
    #[arg(long)]
    no_light_sampling: bool,
}

impl Cli {
    fn render_config(&self) -> RenderConfig {
        RenderConfig {
            samples_per_pixel: self.spp,
            max_depth: self.max_depth,
            bucket_size: self.bucket_size,
            threads: self.threads,
            seed: self.seed,
            background: None,
            light_sampling: !self.no_light_sampling,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let loaded = SceneLoader::new()
        .load_file(&cli.scene)
        .with_context(|| format!("loading scene {}", cli.scene.display()))?;

    let mut camera = loaded.camera;
    if let Some(height) = cli.height.filter(|h| *h > 0) {
        camera = camera.with_image_height(height);
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} buckets ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let progress = {
        let bar = bar.clone();
        RenderProgress::with_callback(move |completed, total| {
            bar.set_length(total as u64);
            bar.set_position(completed as u64);
        })
    };

    let start = Instant::now();
    let image = render_with_progress(&loaded.scene, &camera, &cli.render_config(), &progress)
        .context("starting render workers")?;
    bar.finish_and_clear();
    log::info!(
        "Rendered {}x{} in {:.2}s",
        image.width,
        image.height,
        start.elapsed().as_secs_f64()
    );

    output::save(&image, &cli.output)?;
    log::info!("Wrote {}", cli.output.display());

    Ok(())
}
