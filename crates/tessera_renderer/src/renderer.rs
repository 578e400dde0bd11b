//! Parallel bucket renderer and image output helpers.
//!
//! Buckets are rendered on a dedicated rayon pool capped at the configured
//! thread count. Each bucket writes only its own pixels and owns its random
//! generator; results are copied into the image after the pool drains.

use crate::bucket::render_bucket;
use crate::{generate_buckets, Background, BucketResult, Camera, Color, Integrator, Scene};
use rayon::prelude::*;
use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Render configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Bucket edge length in pixels
    pub bucket_size: u32,
    /// Worker thread cap; 0 lets rayon decide
    pub threads: usize,
    /// Base seed for the per-bucket generators; None draws one from the OS
    pub seed: Option<u64>,
    /// Overrides the scene's background
    pub background: Option<Background>,
    /// Sample lights directly at each diffuse or glossy vertex
    pub light_sampling: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 100,
            max_depth: 50,
            bucket_size: crate::DEFAULT_BUCKET_SIZE,
            threads: 0,
            seed: None,
            background: None,
            light_sampling: true,
        }
    }
}

type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Advisory progress of a running render, shared by the workers.
#[derive(Default)]
pub struct RenderProgress {
    completed: AtomicUsize,
    total: AtomicUsize,
    on_bucket: Option<ProgressCallback>,
}

impl RenderProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `f(completed, total)` whenever a bucket finishes.
    pub fn with_callback(f: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        Self {
            on_bucket: Some(Box::new(f)),
            ..Self::default()
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// Finished fraction in `[0, 1]`.
    pub fn fraction(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 1.0;
        }
        self.completed() as f32 / total as f32
    }

    fn start(&self, total: usize) {
        self.completed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }

    fn bucket_done(&self) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total();
        log::debug!("Bucket {}/{} done", completed, total);
        if let Some(callback) = &self.on_bucket {
            callback(completed, total);
        }
    }
}

impl std::fmt::Debug for RenderProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderProgress")
            .field("completed", &self.completed())
            .field("total", &self.total())
            .finish()
    }
}

/// Linear RGB image, row-major from the top-left pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.offset(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let offset = self.offset(x, y);
        self.pixels[offset] = color;
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Copy a rendered bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        for (i, color) in result.pixels.iter().enumerate() {
            let local_x = i as u32 % bucket.width;
            let local_y = i as u32 / bucket.width;
            self.set(bucket.x + local_x, bucket.y + local_y, *color);
        }
    }

    /// Gamma-encoded 8-bit RGB triples, row-major.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| color_to_rgb8(*c)).collect()
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Gamma-encode and quantize a linear color to 8 bits per channel.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let quantize = |c: f32| (256.0 * linear_to_gamma(c).clamp(0.0, 0.999)) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z)]
}

/// Render the scene through `camera`.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
) -> Result<ImageBuffer, ThreadPoolBuildError> {
    render_with_progress(scene, camera, config, &RenderProgress::new())
}

/// Render the scene, reporting finished buckets to `progress`.
///
/// Fails only if the worker pool cannot be created.
pub fn render_with_progress(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    progress: &RenderProgress,
) -> Result<ImageBuffer, ThreadPoolBuildError> {
    let width = camera.image_width();
    let height = camera.image_height();
    let buckets = generate_buckets(width, height, config.bucket_size);
    let base_seed = config.seed.unwrap_or_else(rand::random);
    let background = config
        .background
        .clone()
        .unwrap_or_else(|| scene.background().clone());
    let integrator = Integrator::new(config.max_depth, background).with_light_sampling(config.light_sampling);

    let pool = ThreadPoolBuilder::new().num_threads(config.threads).build()?;
    log::info!(
        "Rendering {}x{} at {} spp, max depth {}, light sampling {}: {} buckets on {} threads, seed {}",
        width,
        height,
        config.samples_per_pixel,
        config.max_depth,
        if config.light_sampling { "on" } else { "off" },
        buckets.len(),
        pool.current_num_threads(),
        base_seed
    );

    progress.start(buckets.len());
    let start = Instant::now();
    let results: Vec<BucketResult> = pool.install(|| {
        buckets
            .par_iter()
            .map(|bucket| {
                let result = render_bucket(
                    bucket,
                    camera,
                    scene,
                    &integrator,
                    config.samples_per_pixel,
                    base_seed,
                );
                progress.bucket_done();
                result
            })
            .collect()
    });

    let mut image = ImageBuffer::new(width, height);
    for result in &results {
        image.write_bucket(result);
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(image)
}
