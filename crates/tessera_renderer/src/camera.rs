//! Pinhole / thin-lens camera for ray generation.

use crate::sampling::{random_in_unit_disk, sample_square};
use crate::{Ray, Vec3};
use rand::RngCore;

/// Camera for generating rays into the scene.
///
/// Configured with builder methods; derived viewport values are refreshed
/// after every change so the camera is always ready to produce rays.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    image_width: u32,
    image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,               // Vertical field of view in degrees
    defocus_angle: f32,      // Variation angle of rays through each pixel
    focus_dist: Option<f32>, // Distance to the plane of perfect focus; None = look_at

    // Cached computed values
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Camera at `position` looking at `look_at`, with the image width
    /// derived from `image_height` and `aspect_ratio`.
    pub fn new(position: Vec3, look_at: Vec3, image_height: u32, aspect_ratio: f32, vfov: f32) -> Self {
        let image_height = image_height.max(1);
        let image_width = ((image_height as f32 * aspect_ratio) as u32).max(1);

        let mut camera = Self {
            image_width,
            image_height,
            look_from: position,
            look_at,
            vup: Vec3::Y,
            vfov,
            defocus_angle: 0.0,
            focus_dist: None,
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        };
        camera.initialize();
        camera
    }

    /// Set the up vector used to orient the image.
    pub fn with_up(mut self, vup: Vec3) -> Self {
        self.vup = vup;
        self.initialize();
        self
    }

    /// Enable depth of field.
    pub fn with_defocus(mut self, defocus_angle: f32, focus_dist: Option<f32>) -> Self {
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self.initialize();
        self
    }

    /// Override the image height keeping the aspect ratio.
    pub fn with_image_height(mut self, image_height: u32) -> Self {
        let aspect_ratio = self.aspect_ratio();
        self.image_height = image_height.max(1);
        self.image_width = ((self.image_height as f32 * aspect_ratio) as u32).max(1);
        self.initialize();
        self
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.image_width as f32 / self.image_height as f32
    }

    pub fn position(&self) -> Vec3 {
        self.look_from
    }

    pub fn focus_dist(&self) -> f32 {
        self.focus_dist
            .unwrap_or_else(|| (self.look_at - self.look_from).length())
    }

    fn initialize(&mut self) {
        self.center = self.look_from;
        let focus_dist = self.focus_dist();

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize_or_zero();
        let u = self.horizontal_axis();
        let v = self.w.cross(u);

        // Calculate viewport vectors
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        // Calculate pixel delta vectors
        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        // Calculate upper left pixel location
        let viewport_upper_left = self.center - focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        // Calculate defocus disk basis vectors
        let defocus_radius = focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = u * defocus_radius;
        self.defocus_disk_v = v * defocus_radius;
    }

    /// Image-right direction. When the view direction is parallel to `vup`
    /// the cross product vanishes, so another world axis stands in for up.
    fn horizontal_axis(&self) -> Vec3 {
        [self.vup, Vec3::Z, Vec3::X]
            .into_iter()
            .map(|up| up.cross(self.w))
            .find(|u| u.length_squared() > 1e-8)
            .map(Vec3::normalize)
            .unwrap_or(Vec3::X)
    }

    /// Generate a jittered ray through pixel `(i, j)`, `j` counted from the
    /// top row.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}
