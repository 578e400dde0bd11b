//! Textures: values looked up per hit from the surface `uv`.
//!
//! Materials hold a [`ColorTexture`] or [`FloatTexture`] wherever a
//! parameter may vary over a surface. Constants cost nothing extra; image
//! textures are decoded once at load time and shared through `Arc`.

use crate::{Color, Vec2, Vec3};
use std::f32::consts::PI;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture {0} has no pixels")]
    Empty(PathBuf),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Decoded image in linear RGB, stored row-major with the top row first.
///
/// `uv = (0, 0)` is the bottom-left corner. Lookups outside the unit square
/// clamp to the border.
#[derive(Clone)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
    scale: f32,
}

impl ImageTexture {
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        Self {
            width,
            height,
            pixels,
            scale: 1.0,
        }
    }

    /// Decode an image file. 8-bit formats are taken as sRGB and converted to
    /// linear; float formats (HDR, OpenEXR) are already linear.
    pub fn open(path: &Path) -> TextureResult<Self> {
        let img = image::open(path).map_err(|source| TextureError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(path.to_path_buf()));
        }

        let pixels: Vec<Color> = match img {
            image::DynamicImage::ImageRgb32F(_) | image::DynamicImage::ImageRgba32F(_) => img
                .to_rgb32f()
                .pixels()
                .map(|p| Color::new(p[0], p[1], p[2]))
                .collect(),
            _ => img
                .to_rgb8()
                .pixels()
                .map(|p| Color::new(srgb_to_linear(p[0]), srgb_to_linear(p[1]), srgb_to_linear(p[2])))
                .collect(),
        };

        log::debug!("Loaded texture: {} ({}x{})", path.display(), width, height);
        Ok(Self::new(width, height, pixels))
    }

    /// Multiply every lookup by `scale`.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Bilinear lookup.
    pub fn evaluate(&self, uv: Vec2) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::ZERO;
        }

        let x = uv.x.clamp(0.0, 1.0) * (self.width - 1) as f32;
        let y = (1.0 - uv.y.clamp(0.0, 1.0)) * (self.height - 1) as f32;

        let x0 = x as u32;
        let y0 = y as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let top = self.texel(x0, y0).lerp(self.texel(x1, y0), fx);
        let bottom = self.texel(x0, y1).lerp(self.texel(x1, y1), fx);
        top.lerp(bottom, fy) * self.scale
    }

    fn texel(&self, x: u32, y: u32) -> Color {
        let idx = (y as usize) * (self.width as usize) + x as usize;
        self.pixels.get(idx).copied().unwrap_or(Color::ZERO)
    }
}

impl fmt::Debug for ImageTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageTexture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// RGB parameter that may vary over a surface.
#[derive(Debug, Clone)]
pub enum ColorTexture {
    Solid(Color),
    Image(Arc<ImageTexture>),
}

impl ColorTexture {
    pub fn evaluate(&self, uv: Vec2) -> Color {
        match self {
            ColorTexture::Solid(color) => *color,
            ColorTexture::Image(image) => image.evaluate(uv),
        }
    }

    /// True only for a constant zero.
    pub fn is_black(&self) -> bool {
        matches!(self, ColorTexture::Solid(color) if *color == Color::ZERO)
    }
}

impl From<Color> for ColorTexture {
    fn from(color: Color) -> Self {
        ColorTexture::Solid(color)
    }
}

impl From<Arc<ImageTexture>> for ColorTexture {
    fn from(image: Arc<ImageTexture>) -> Self {
        ColorTexture::Image(image)
    }
}

/// Scalar parameter that may vary over a surface. Images contribute their
/// red channel.
#[derive(Debug, Clone)]
pub enum FloatTexture {
    Constant(f32),
    Image(Arc<ImageTexture>),
}

impl FloatTexture {
    pub fn evaluate(&self, uv: Vec2) -> f32 {
        match self {
            FloatTexture::Constant(value) => *value,
            FloatTexture::Image(image) => image.evaluate(uv).x,
        }
    }
}

impl From<f32> for FloatTexture {
    fn from(value: f32) -> Self {
        FloatTexture::Constant(value)
    }
}

impl From<Arc<ImageTexture>> for FloatTexture {
    fn from(image: Arc<ImageTexture>) -> Self {
        FloatTexture::Image(image)
    }
}

/// Latitude-longitude parameterization of directions about the origin.
///
/// `u` sweeps the azimuth around +Y starting from -X; `v` runs from the -Y
/// pole (0) to the +Y pole (1), so an equirectangular image appears upright.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SphericalMap;

impl SphericalMap {
    pub fn map(&self, p: Vec3) -> Vec2 {
        let r = p.length();
        if r == 0.0 {
            return Vec2::splat(0.5);
        }
        let phi = p.z.atan2(p.x);
        let theta = (p.y / r).clamp(-1.0, 1.0).acos();
        Vec2::new(phi / (2.0 * PI) + 0.5, 1.0 - theta / PI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x2 image: top row red, green; bottom row blue, white.
    fn checker() -> ImageTexture {
        ImageTexture::new(
            2,
            2,
            vec![Color::X, Color::Y, Color::Z, Color::ONE],
        )
    }

    fn approx(a: Color, b: Color) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_corners_follow_uv_orientation() {
        let tex = checker();
        assert!(approx(tex.evaluate(Vec2::new(0.0, 1.0)), Color::X));
        assert!(approx(tex.evaluate(Vec2::new(1.0, 1.0)), Color::Y));
        assert!(approx(tex.evaluate(Vec2::new(0.0, 0.0)), Color::Z));
        assert!(approx(tex.evaluate(Vec2::new(1.0, 0.0)), Color::ONE));
    }

    #[test]
    fn test_bilinear_centre_and_clamping() {
        let tex = checker();
        let centre = (Color::X + Color::Y + Color::Z + Color::ONE) * 0.25;
        assert!(approx(tex.evaluate(Vec2::splat(0.5)), centre));

        // Halfway along the top edge
        assert!(approx(tex.evaluate(Vec2::new(0.5, 1.0)), Color::new(0.5, 0.5, 0.0)));

        assert!(approx(tex.evaluate(Vec2::new(-3.0, 7.0)), Color::X));
        assert!(approx(tex.evaluate(Vec2::new(2.0, -1.0)), Color::ONE));
    }

    #[test]
    fn test_scale_multiplies() {
        let tex = checker().with_scale(2.0);
        assert!(approx(tex.evaluate(Vec2::ZERO), Color::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn test_float_texture_reads_red_channel() {
        let image = Arc::new(checker());
        let rough = FloatTexture::from(image);
        assert!((rough.evaluate(Vec2::new(0.0, 1.0)) - 1.0).abs() < 1e-6);
        assert!(rough.evaluate(Vec2::new(1.0, 1.0)).abs() < 1e-6);
        assert_eq!(FloatTexture::from(0.3).evaluate(Vec2::splat(0.9)), 0.3);
    }

    #[test]
    fn test_is_black() {
        assert!(ColorTexture::from(Color::ZERO).is_black());
        assert!(!ColorTexture::from(Color::splat(0.1)).is_black());
        assert!(!ColorTexture::from(Arc::new(checker())).is_black());
    }

    #[test]
    fn test_open_decodes_srgb() {
        let path = std::env::temp_dir().join(format!("tessera-texture-test-{}.png", std::process::id()));
        let mut img = image::RgbImage::new(3, 1);
        img.put_pixel(0, 0, image::Rgb([255, 255, 255]));
        img.put_pixel(2, 0, image::Rgb([128, 0, 0]));
        img.save(&path).unwrap();

        let tex = ImageTexture::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!((tex.width(), tex.height()), (3, 1));
        assert!(approx(tex.evaluate(Vec2::new(0.0, 0.5)), Color::ONE));
        let mid_red = tex.evaluate(Vec2::new(1.0, 0.5)).x;
        assert!(mid_red > 0.2 && mid_red < 0.23, "red = {mid_red}");
    }

    #[test]
    fn test_open_missing_file() {
        let missing = std::env::temp_dir().join("tessera-no-such-texture.png");
        assert!(matches!(ImageTexture::open(&missing), Err(TextureError::Load { .. })));
    }

    #[test]
    fn test_srgb_to_linear() {
        assert!(srgb_to_linear(0).abs() < 0.001);
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);
        let mid = srgb_to_linear(128);
        assert!(mid > 0.1 && mid < 0.5);
    }

    #[test]
    fn test_spherical_map_axes() {
        let map = SphericalMap;
        assert!((map.map(Vec3::Y).y - 1.0).abs() < 1e-6);
        assert!(map.map(Vec3::NEG_Y).y.abs() < 1e-6);
        assert!((map.map(Vec3::X) - Vec2::new(0.5, 0.5)).length() < 1e-6);
        assert!((map.map(Vec3::Z * 3.0) - Vec2::new(0.75, 0.5)).length() < 1e-6);
        // Length does not matter
        assert!((map.map(Vec3::new(1.0, 1.0, 0.0)) - map.map(Vec3::new(4.0, 4.0, 0.0))).length() < 1e-6);
    }
}
